//! Caller-supplied form properties and their validation outcome

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{HalError, HalResult};

/// Declared type of the values a property carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Boolean,
    Integer,
    Long,
    Double,
}

impl ValueType {
    pub fn is_number(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Long | ValueType::Double)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueType::String => "String",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Long => "Long",
            ValueType::Double => "Double",
        };
        write!(f, "{label}")
    }
}

/// One non-null property value
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    String(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
}

impl FormValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FormValue::String(_) => ValueType::String,
            FormValue::Boolean(_) => ValueType::Boolean,
            FormValue::Integer(_) => ValueType::Integer,
            FormValue::Long(_) => ValueType::Long,
            FormValue::Double(_) => ValueType::Double,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(value) => Some(value),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FormValue::String(value) => Value::String(value.clone()),
            FormValue::Boolean(value) => Value::Bool(*value),
            FormValue::Integer(value) => Value::from(*value),
            FormValue::Long(value) => Value::from(*value),
            FormValue::Double(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::String(value) => write!(f, "{value}"),
            FormValue::Boolean(value) => write!(f, "{value}"),
            FormValue::Integer(value) => write!(f, "{value}"),
            FormValue::Long(value) => write!(f, "{value}"),
            FormValue::Double(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::String(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::String(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Boolean(value)
    }
}

impl From<i32> for FormValue {
    fn from(value: i32) -> Self {
        FormValue::Integer(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue::Long(value)
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Double(value)
    }
}

/// A named, typed property as set by the caller.
///
/// Nulls are dropped at construction. A scalar property holds at most one value.
#[derive(Debug, Clone, PartialEq)]
pub struct FormProperty {
    value_type: ValueType,
    name: String,
    values: Vec<FormValue>,
    array: bool,
}

impl FormProperty {
    pub fn new(
        value_type: ValueType,
        name: impl Into<String>,
        values: Vec<Option<FormValue>>,
        array: bool,
    ) -> HalResult<Self> {
        let name = name.into();
        let values: Vec<FormValue> = values.into_iter().flatten().collect();
        if !array && values.len() > 1 {
            return Err(HalError::InvalidArgument(
                "Non array property can't hold more than 1 value.".to_string(),
            ));
        }
        if let Some(value) = values.iter().find(|value| value.value_type() != value_type) {
            return Err(HalError::InvalidArgument(format!(
                "Value {} of property '{}' is of type {} while {} was declared",
                value,
                name,
                value.value_type(),
                value_type
            )));
        }
        Ok(Self {
            value_type,
            name,
            values,
            array,
        })
    }

    /// Scalar property, `None` standing for null
    pub fn scalar(
        value_type: ValueType,
        name: impl Into<String>,
        value: Option<FormValue>,
    ) -> HalResult<Self> {
        Self::new(value_type, name, vec![value], false)
    }

    pub fn string(name: impl Into<String>, value: Option<&str>) -> HalResult<Self> {
        Self::scalar(ValueType::String, name, value.map(FormValue::from))
    }

    pub fn array<V: Into<FormValue>>(
        value_type: ValueType,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> HalResult<Self> {
        let values = values.into_iter().map(|value| Some(value.into())).collect();
        Self::new(value_type, name, values, true)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[FormValue] {
        &self.values
    }

    pub fn first_value(&self) -> Option<&FormValue> {
        self.values.first()
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_number_value_type(&self) -> bool {
        self.value_type.is_number()
    }

    /// Write the value (or the whole list for arrays) under the property name
    pub fn populate_into(&self, payload: &mut Map<String, Value>) {
        let value = if self.array {
            Value::Array(self.values.iter().map(FormValue::to_json).collect())
        } else {
            self.values
                .first()
                .map(FormValue::to_json)
                .unwrap_or(Value::Null)
        };
        payload.insert(self.name.clone(), value);
    }

    /// Widen numeric values to `f64` for relational checks
    pub fn to_f64_values(&self) -> HalResult<Vec<f64>> {
        if !self.is_number_value_type() {
            return Err(HalError::InvalidArgument(format!(
                "{} is not a number type",
                self.value_type
            )));
        }
        self.values
            .iter()
            .map(|value| match value {
                FormValue::Integer(v) => Ok(f64::from(*v)),
                FormValue::Long(v) => Ok(*v as f64),
                FormValue::Double(v) => Ok(*v),
                other => Err(HalError::InvalidArgument(format!(
                    "Unexpected value type {}",
                    other.value_type()
                ))),
            })
            .collect()
    }

    /// First value widened to `f64`
    pub fn first_f64(&self) -> HalResult<Option<f64>> {
        Ok(self.to_f64_values()?.first().copied())
    }
}

/// Why a property failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    reason: String,
    deferrable_to_server: bool,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>, deferrable_to_server: bool) -> Self {
        Self {
            reason: reason.into(),
            deferrable_to_server,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The server is expected to reject the same input with a 4xx
    pub fn is_deferrable_to_server(&self) -> bool {
        self.deferrable_to_server
    }
}

/// A property paired with its first validation error, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFormProperty {
    property: FormProperty,
    error: Option<ValidationError>,
}

impl ValidatedFormProperty {
    pub fn valid(property: FormProperty) -> Self {
        Self {
            property,
            error: None,
        }
    }

    pub fn invalid(
        property: FormProperty,
        deferrable_to_server: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            property,
            error: Some(ValidationError::new(reason, deferrable_to_server)),
        }
    }

    pub fn property(&self) -> &FormProperty {
        &self.property
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn populate_into(&self, payload: &mut Map<String, Value>) -> &Self {
        self.property.populate_into(payload);
        self
    }

    /// Reason of a failure the server is expected to confirm
    pub fn deferrable_reason(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|error| error.is_deferrable_to_server())
            .map(ValidationError::reason)
    }
}

/// Relaxations applicable when setting a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyValidationOption {
    /// Accept the property without running any check
    SkipIfNotValid,
    /// Accept a property the template does not declare
    SkipIfNotDeclared,
    /// Accept a property the template declares read-only
    SkipIfDeclaredReadOnly,
}

impl PropertyValidationOption {
    fn bit(self) -> u8 {
        match self {
            PropertyValidationOption::SkipIfNotValid => 0b001,
            PropertyValidationOption::SkipIfNotDeclared => 0b010,
            PropertyValidationOption::SkipIfDeclaredReadOnly => 0b100,
        }
    }
}

/// Set of [`PropertyValidationOption`]s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PropertyValidationOptions {
    bits: u8,
}

impl PropertyValidationOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: PropertyValidationOption) -> Self {
        self.bits |= option.bit();
        self
    }

    pub fn contains(&self, option: PropertyValidationOption) -> bool {
        self.bits & option.bit() != 0
    }
}

impl From<PropertyValidationOption> for PropertyValidationOptions {
    fn from(option: PropertyValidationOption) -> Self {
        Self::none().with(option)
    }
}

impl FromIterator<PropertyValidationOption> for PropertyValidationOptions {
    fn from_iter<I: IntoIterator<Item = PropertyValidationOption>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}
