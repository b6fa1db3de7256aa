use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::property::{FormProperty, ValidatedFormProperty, ValueType};
use crate::domain::template::{
    InlineElementRepresentation, OptionsLinkRepresentation, OptionsRepresentation,
};
use crate::domain::{uri_template, HttpExecutor, HttpRequest, APPLICATION_JSON};
use crate::error::{HalError, HalResult};

/// Decides whether submitted values belong to an options enumeration
pub struct TemplateOptions<'a> {
    executor: Arc<dyn HttpExecutor>,
    representation: &'a OptionsRepresentation,
}

impl<'a> TemplateOptions<'a> {
    pub fn new(executor: Arc<dyn HttpExecutor>, representation: &'a OptionsRepresentation) -> Self {
        Self {
            executor,
            representation,
        }
    }

    pub async fn validate(&self, property: &FormProperty) -> HalResult<ValidatedFormProperty> {
        if property.value_type() != ValueType::String {
            return Ok(ValidatedFormProperty::invalid(
                property.clone(),
                true,
                format!(
                    "Value of type '{}' is not valid because the type should be of type 'String' given property '{}' expects a value from an enumeration of options.",
                    property.value_type(),
                    property.name()
                ),
            ));
        }

        let number_of_values = property.values().len() as u64;

        if let Some(max_items) = self.representation.max_items() {
            if number_of_values > max_items {
                return Ok(ValidatedFormProperty::invalid(
                    property.clone(),
                    true,
                    format!(
                        "{} values passed for property '{}' while maxItems == {}",
                        number_of_values,
                        property.name(),
                        max_items
                    ),
                ));
            }
        }

        let min_items = self.representation.min_items();
        if number_of_values < min_items {
            return Ok(ValidatedFormProperty::invalid(
                property.clone(),
                true,
                format!(
                    "{} values passed for property '{}' while minItems == {}",
                    number_of_values,
                    property.name(),
                    min_items
                ),
            ));
        }

        let Some(elements) = self.resolve_elements().await? else {
            return Ok(ValidatedFormProperty::invalid(
                property.clone(),
                false,
                format!(
                    "Missing options inline and remote elements for property '{}'.",
                    property.name()
                ),
            ));
        };

        Ok(validate_against(
            self.representation.effective_value_field(),
            &elements,
            property,
        ))
    }

    /// Inline elements, or the elements fetched from the options link.
    ///
    /// `None` when the options declare neither.
    pub async fn resolve_elements(&self) -> HalResult<Option<Vec<InlineElementRepresentation>>> {
        if let Some(inline) = self.representation.inline() {
            return Ok(Some(inline.to_vec()));
        }
        match self.representation.link() {
            Some(link) => Ok(Some(self.fetch_remote_elements(link).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_remote_elements(
        &self,
        link: &OptionsLinkRepresentation,
    ) -> HalResult<Vec<InlineElementRepresentation>> {
        let href = uri_template::expand(link.href(), &BTreeMap::new());
        debug!(href = %href, "Fetching remote options");

        let request = HttpRequest::get(href.clone())
            .header("Accept", link.media_type().unwrap_or(APPLICATION_JSON));
        let response = self.executor.execute(request).await?;
        if !response.status.is_success() {
            return Err(HalError::UnexpectedResponse {
                method: "GET".to_string(),
                uri: href,
                status: response.status.as_u16(),
                body: response.text(),
            });
        }
        response.json()
    }
}

fn validate_against(
    value_field: &str,
    elements: &[InlineElementRepresentation],
    property: &FormProperty,
) -> ValidatedFormProperty {
    if elements.is_empty() {
        if property.values().is_empty() {
            return ValidatedFormProperty::valid(property.clone());
        }
        return ValidatedFormProperty::invalid(
            property.clone(),
            true,
            format!(
                "Value of property '{}' must be null because the list of available options is empty.",
                property.name()
            ),
        );
    }

    for value in property.values() {
        let Some(candidate) = value.as_str() else {
            continue;
        };
        if elements
            .iter()
            .any(|element| element.matches(value_field, candidate))
        {
            continue;
        }
        let available: Vec<String> = elements.iter().map(ToString::to_string).collect();
        return ValidatedFormProperty::invalid(
            property.clone(),
            true,
            format!(
                "Value '{}' didn't match any inline option of property '{}' among [{}]",
                candidate,
                property.name(),
                available.join(", ")
            ),
        );
    }

    ValidatedFormProperty::valid(property.clone())
}
