//! Form orchestration
//!
//! A [`Form`] accumulates validated properties for one template, builds the
//! JSON payload on submission and reconciles the predicted validity with the
//! status the server actually returned.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::property_validator::TemplateProperty;
use super::templates::Template;
use crate::domain::property::{
    FormProperty, FormValue, PropertyValidationOption, PropertyValidationOptions,
    ValidatedFormProperty, ValueType,
};
use crate::domain::{media_type_essence, HttpResponse, APPLICATION_JSON};
use crate::error::{HalError, HalResult};

pub struct Form {
    template: Template,
    properties: Vec<ValidatedFormProperty>,
}

impl Form {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            properties: Vec::new(),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Properties set so far, in first-set order
    pub fn properties(&self) -> &[ValidatedFormProperty] {
        &self.properties
    }

    pub async fn with_string(&mut self, name: &str, value: Option<&str>) -> HalResult<&mut Self> {
        self.with_scalar(ValueType::String, name, value.map(FormValue::from))
            .await
    }

    pub async fn with_boolean(&mut self, name: &str, value: Option<bool>) -> HalResult<&mut Self> {
        self.with_scalar(ValueType::Boolean, name, value.map(FormValue::from))
            .await
    }

    pub async fn with_integer(&mut self, name: &str, value: Option<i32>) -> HalResult<&mut Self> {
        self.with_scalar(ValueType::Integer, name, value.map(FormValue::from))
            .await
    }

    pub async fn with_long(&mut self, name: &str, value: Option<i64>) -> HalResult<&mut Self> {
        self.with_scalar(ValueType::Long, name, value.map(FormValue::from))
            .await
    }

    pub async fn with_double(&mut self, name: &str, value: Option<f64>) -> HalResult<&mut Self> {
        self.with_scalar(ValueType::Double, name, value.map(FormValue::from))
            .await
    }

    pub async fn with_strings<S: Into<String>>(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = S>,
    ) -> HalResult<&mut Self> {
        let values = values.into_iter().map(|value| FormValue::String(value.into()));
        self.with_array(ValueType::String, name, values).await
    }

    pub async fn with_booleans(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = bool>,
    ) -> HalResult<&mut Self> {
        self.with_array(ValueType::Boolean, name, values.into_iter().map(FormValue::from))
            .await
    }

    pub async fn with_integers(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = i32>,
    ) -> HalResult<&mut Self> {
        self.with_array(ValueType::Integer, name, values.into_iter().map(FormValue::from))
            .await
    }

    pub async fn with_longs(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = i64>,
    ) -> HalResult<&mut Self> {
        self.with_array(ValueType::Long, name, values.into_iter().map(FormValue::from))
            .await
    }

    pub async fn with_doubles(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = f64>,
    ) -> HalResult<&mut Self> {
        self.with_array(ValueType::Double, name, values.into_iter().map(FormValue::from))
            .await
    }

    async fn with_scalar(
        &mut self,
        value_type: ValueType,
        name: &str,
        value: Option<FormValue>,
    ) -> HalResult<&mut Self> {
        let property = FormProperty::scalar(value_type, name, value)?;
        self.with_property(property, PropertyValidationOptions::none())
            .await
    }

    async fn with_array(
        &mut self,
        value_type: ValueType,
        name: &str,
        values: impl Iterator<Item = FormValue>,
    ) -> HalResult<&mut Self> {
        let property = FormProperty::new(value_type, name, values.map(Some).collect(), true)?;
        self.with_property(property, PropertyValidationOptions::none())
            .await
    }

    /// Validate `property` and record it, replacing any previous value.
    ///
    /// Usage errors (undeclared or read-only property, non-deferrable
    /// failure) are returned immediately. Deferrable failures are kept and
    /// resolved on [`Form::submit`].
    pub async fn with_property(
        &mut self,
        property: FormProperty,
        options: PropertyValidationOptions,
    ) -> HalResult<&mut Self> {
        let validated = self.validate(property, options).await?;
        match self
            .properties
            .iter_mut()
            .find(|existing| existing.property().name() == validated.property().name())
        {
            Some(existing) => *existing = validated,
            None => self.properties.push(validated),
        }
        Ok(self)
    }

    async fn validate(
        &self,
        property: FormProperty,
        options: PropertyValidationOptions,
    ) -> HalResult<ValidatedFormProperty> {
        if options.contains(PropertyValidationOption::SkipIfNotValid) {
            return Ok(ValidatedFormProperty::valid(property));
        }

        let representation = self.template.representation();
        let Some(declaration) = representation.property(property.name()) else {
            if options.contains(PropertyValidationOption::SkipIfNotDeclared) {
                return Ok(ValidatedFormProperty::valid(property));
            }
            return Err(HalError::UndeclaredProperty(property.name().to_string()));
        };

        if declaration.read_only()
            && !options.contains(PropertyValidationOption::SkipIfDeclaredReadOnly)
        {
            return Err(HalError::ReadOnlyProperty(property.name().to_string()));
        }

        let validated = TemplateProperty::new(self.template.executor(), declaration)
            .validate(&property)
            .await?;

        if let Some(error) = validated.error() {
            if !error.is_deferrable_to_server() {
                return Err(HalError::Validation(error.reason().to_string()));
            }
            debug!(
                property = %property.name(),
                reason = %error.reason(),
                "Property expected to be rejected by the server"
            );
        }
        Ok(validated)
    }

    /// Build the payload and submit it.
    ///
    /// When validation predicted failures, the server must answer with a
    /// client error; any other status yields [`HalError::ExpectedClientError`].
    pub async fn submit(&self) -> HalResult<HttpResponse> {
        let content_type = self.template.representation().content_type();
        if !media_type_essence(content_type).eq_ignore_ascii_case(APPLICATION_JSON) {
            return Err(HalError::UnsupportedContentType {
                content_type: content_type.to_string(),
            });
        }

        let (payload, expected_bad_request_reasons) = self.build_payload();

        let response = self
            .template
            .submit(Some(Value::Object(payload).to_string()))
            .await?;

        if expected_bad_request_reasons.is_empty() {
            return Ok(response);
        }
        if response.status.is_client_error() {
            info!(
                status = response.status.as_u16(),
                reasons = expected_bad_request_reasons.len(),
                "Server rejected the submission as predicted"
            );
            return Ok(response);
        }

        warn!(
            status = response.status.as_u16(),
            "Server accepted a submission predicted to be invalid"
        );
        Err(HalError::ExpectedClientError {
            reasons: expected_bad_request_reasons,
            status: response.status.as_u16(),
        })
    }

    /// Payload to submit together with the reasons the server should reject it
    pub fn build_payload(&self) -> (Map<String, Value>, Vec<String>) {
        let executor = self.template.executor();
        let declarations: Vec<TemplateProperty<'_>> = self
            .template
            .representation()
            .properties()
            .iter()
            .map(|representation| TemplateProperty::new(executor.clone(), representation))
            .collect();

        let mut payload = Map::new();
        for declaration in &declarations {
            if let Some(default_value) = declaration.default_value() {
                payload.insert(declaration.name().to_string(), default_value);
            }
        }

        let mut expected_bad_request_reasons = Vec::new();
        for property in &self.properties {
            if let Some(reason) = property.populate_into(&mut payload).deferrable_reason() {
                expected_bad_request_reasons.push(reason.to_string());
            }
        }

        for declaration in declarations.iter().filter(|d| d.is_required()) {
            let missing = payload
                .get(declaration.name())
                .map_or(true, Value::is_null);
            if missing {
                expected_bad_request_reasons
                    .push(format!("Property '{}' is required but is missing", declaration.name()));
            }
        }

        (payload, expected_bad_request_reasons)
    }
}
