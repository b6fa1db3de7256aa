use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::options_resolver::TemplateOptions;
use crate::domain::property::{FormProperty, ValidatedFormProperty, ValueType};
use crate::domain::template::TemplatePropertyRepresentation;
use crate::domain::HttpExecutor;
use crate::error::{HalError, HalResult};

/// HAL-FORMS input types that only accept text
pub const STRING_HAL_FORMS_TYPES: &[&str] = &[
    "hidden",
    "text",
    "textarea",
    "search",
    "tel",
    "url",
    "email",
    "password",
    "date",
    "time",
    "datetime-local",
    "range",
    "color",
];

/// HAL-FORMS input types that only accept numbers
pub const NUMBER_HAL_FORMS_TYPES: &[&str] = &["month", "week", "number"];

/// Applies the constraints of one template property declaration
pub struct TemplateProperty<'a> {
    executor: Arc<dyn HttpExecutor>,
    representation: &'a TemplatePropertyRepresentation,
}

impl<'a> TemplateProperty<'a> {
    pub fn new(
        executor: Arc<dyn HttpExecutor>,
        representation: &'a TemplatePropertyRepresentation,
    ) -> Self {
        Self {
            executor,
            representation,
        }
    }

    pub fn name(&self) -> &str {
        self.representation.name()
    }

    pub fn is_required(&self) -> bool {
        self.representation.required()
    }

    /// Value submitted when the caller does not override the property.
    ///
    /// Options contribute their selected values: a single value when at most
    /// one item may be chosen, the whole list otherwise.
    pub fn default_value(&self) -> Option<Value> {
        let Some(options) = self.representation.options() else {
            return self.representation.value().map(|v| Value::String(v.to_string()));
        };

        let selected = options.selected_values();
        if matches!(options.max_items(), Some(max_items) if max_items <= 1) {
            return selected.first().map(|v| Value::String(v.clone()));
        }
        if selected.is_empty() {
            return None;
        }
        Some(Value::Array(
            selected.iter().map(|v| Value::String(v.clone())).collect(),
        ))
    }

    /// Run every check in order, stopping at the first failure.
    ///
    /// `Err` is reserved for problems unrelated to the submitted values, such
    /// as an unreachable options link or an invalid regex.
    pub async fn validate(&self, property: &FormProperty) -> HalResult<ValidatedFormProperty> {
        let name = property.name();
        let first_value = property.first_value();

        if self.representation.required() && first_value.is_none() {
            return Ok(invalid(
                property,
                format!(
                    "Since property '{name}' is required, it must hold at least one non-null value."
                ),
            ));
        }

        if let Some(options) = self.representation.options() {
            return TemplateOptions::new(self.executor.clone(), options)
                .validate(property)
                .await;
        }

        if property.is_array() {
            return Ok(invalid(
                property,
                format!(
                    "Given property '{name}' has no options attribute, it cannot hold an array of values."
                ),
            ));
        }

        let input_type = self.representation.input_type();
        if STRING_HAL_FORMS_TYPES.contains(&input_type)
            && property.value_type() != ValueType::String
        {
            return Ok(invalid(
                property,
                format!(
                    "Value must be of type String because property '{name}' has type '{input_type}'"
                ),
            ));
        }
        if NUMBER_HAL_FORMS_TYPES.contains(&input_type) && !property.is_number_value_type() {
            return Ok(invalid(
                property,
                format!(
                    "Value must be of type Number because property '{name}' has type '{input_type}'"
                ),
            ));
        }

        if let Some(pattern) = self.representation.regex() {
            if property.value_type() != ValueType::String {
                return Ok(invalid(
                    property,
                    format!(
                        "Property '{name}' must have a value of type String because it is associated to a regex"
                    ),
                ));
            }
            if let Some(value) = first_value.and_then(|v| v.as_str()) {
                if !full_match(pattern, value)? {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value '{value}' of property '{name}' does not match regex '{pattern}'"
                        ),
                    ));
                }
            }
        }

        if let Some(max) = self.representation.max() {
            if !property.is_number_value_type() {
                return Ok(invalid(
                    property,
                    format!(
                        "Value of property '{name}' must be a number because the property defines a max value."
                    ),
                ));
            }
            if let Some(value) = property.first_f64()? {
                if value > max {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value {value:?} is greater than the max value of {max:?} of property '{name}'."
                        ),
                    ));
                }
            }
        }

        if let Some(min) = self.representation.min() {
            if !property.is_number_value_type() {
                return Ok(invalid(
                    property,
                    format!(
                        "Value of property '{name}' must be a number because the property defines a min value."
                    ),
                ));
            }
            if let Some(value) = property.first_f64()? {
                if value < min {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value {value:?} is lower than the min value of {min:?} of property '{name}'."
                        ),
                    ));
                }
            }
        }

        if let Some(max_length) = self.representation.max_length() {
            if property.value_type() != ValueType::String {
                return Ok(invalid(
                    property,
                    format!(
                        "Value of property '{name}' must be a string because the property defines a max length value."
                    ),
                ));
            }
            if let Some(value) = first_value.and_then(|v| v.as_str()) {
                if text_length(value) > max_length {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value '{value}' of property '{name}' has a greater length than the defined max length of {max_length}"
                        ),
                    ));
                }
            }
        }

        if let Some(min_length) = self.representation.min_length() {
            if property.value_type() != ValueType::String {
                return Ok(invalid(
                    property,
                    format!(
                        "Value of property '{name}' must be a string because the property defines a min length value."
                    ),
                ));
            }
            if let Some(value) = first_value.and_then(|v| v.as_str()) {
                if text_length(value) < min_length {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value '{value}' of property '{name}' has a lower length than the defined min length of {min_length}"
                        ),
                    ));
                }
            }
        }

        if let Some(step) = self.representation.step() {
            if !property.is_number_value_type() {
                return Ok(invalid(
                    property,
                    format!(
                        "Value of property '{name}' must be a number because the property defines a step value."
                    ),
                ));
            }
            if let Some(value) = property.first_f64()? {
                if !is_step_compatible(value, step) {
                    return Ok(invalid(
                        property,
                        format!(
                            "Value '{value:?}' of property '{name}' is not compatible with the defined step of '{step:?}'"
                        ),
                    ));
                }
            }
        }

        Ok(ValidatedFormProperty::valid(property.clone()))
    }
}

fn invalid(property: &FormProperty, reason: String) -> ValidatedFormProperty {
    ValidatedFormProperty::invalid(property.clone(), true, reason)
}

/// Whole-string match, as opposed to a search
fn full_match(pattern: &str, value: &str) -> HalResult<bool> {
    let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| HalError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(regex.is_match(value))
}

/// Length in UTF-16 code units, the unit HAL-FORMS clients count in
fn text_length(value: &str) -> u64 {
    value.encode_utf16().count() as u64
}

/// The rounded quotient must equal the raw quotient, compared exactly
pub fn is_step_compatible(value: f64, step: f64) -> bool {
    let quotient = value / step;
    quotient.round() == quotient
}
