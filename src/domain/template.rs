//! Immutable HAL-FORMS template model
//!
//! Parsed once from a server response. Raw wire structs are deserialized
//! first, then converted so that defaults are applied and structural
//! problems (missing `method`, duplicate property names) fail the parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::APPLICATION_JSON;
use crate::error::{HalError, HalResult};

const DEFAULT_INPUT_TYPE: &str = "text";
const DEFAULT_VALUE_FIELD: &str = "value";

/// A parsed HAL-FORMS document: the self link plus its templates by key
#[derive(Debug, Clone, PartialEq)]
pub struct HalFormsDocument {
    pub self_href: String,
    pub templates: BTreeMap<String, TemplateRepresentation>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "_links", default)]
    links: BTreeMap<String, Value>,
    #[serde(rename = "_templates", default)]
    templates: Option<BTreeMap<String, TemplateRepresentation>>,
}

impl HalFormsDocument {
    pub fn from_slice(body: &[u8]) -> HalResult<Self> {
        let raw: RawDocument = serde_json::from_slice(body)
            .map_err(|e| HalError::MalformedTemplate(e.to_string()))?;
        let self_href = raw
            .links
            .get("self")
            .and_then(link_href)
            .ok_or(HalError::MissingSelfLink)?;
        Ok(Self {
            self_href,
            templates: raw.templates.unwrap_or_default(),
        })
    }
}

/// `href` of a HAL link object, or of the first entry of a link array
pub fn link_href(link: &Value) -> Option<String> {
    match link {
        Value::Array(links) => links.first().and_then(link_href),
        Value::Object(object) => object
            .get("href")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// One named way to act on a resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTemplate")]
pub struct TemplateRepresentation {
    title: Option<String>,
    method: String,
    content_type: String,
    target: Option<String>,
    properties: Vec<TemplatePropertyRepresentation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplate {
    title: Option<String>,
    method: Option<String>,
    content_type: Option<String>,
    target: Option<String>,
    properties: Option<Vec<TemplatePropertyRepresentation>>,
}

impl TryFrom<RawTemplate> for TemplateRepresentation {
    type Error = String;

    fn try_from(raw: RawTemplate) -> Result<Self, Self::Error> {
        let method = raw
            .method
            .ok_or_else(|| "Attribute 'method' is missing".to_string())?
            .to_uppercase();

        let properties = raw.properties.unwrap_or_default();
        for (idx, property) in properties.iter().enumerate() {
            if properties[..idx].iter().any(|p| p.name == property.name) {
                return Err(format!(
                    "Properties named '{}' appear more than once",
                    property.name
                ));
            }
        }

        Ok(Self {
            title: raw.title,
            method,
            content_type: raw
                .content_type
                .unwrap_or_else(|| APPLICATION_JSON.to_string()),
            target: raw.target,
            properties,
        })
    }
}

impl TemplateRepresentation {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Upper-cased HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Declared properties, in document order
    pub fn properties(&self) -> &[TemplatePropertyRepresentation] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&TemplatePropertyRepresentation> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Constraints declared for one template property
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTemplateProperty")]
pub struct TemplatePropertyRepresentation {
    name: String,
    required: bool,
    value: Option<String>,
    prompt: String,
    regex: Option<String>,
    templated: bool,
    read_only: bool,
    input_type: String,
    max: Option<f64>,
    min: Option<f64>,
    max_length: Option<u64>,
    min_length: Option<u64>,
    step: Option<f64>,
    options: Option<OptionsRepresentation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplateProperty {
    name: Option<String>,
    required: Option<bool>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    value: Option<String>,
    prompt: Option<String>,
    regex: Option<String>,
    templated: Option<bool>,
    read_only: Option<bool>,
    #[serde(rename = "type")]
    input_type: Option<String>,
    max: Option<f64>,
    min: Option<f64>,
    max_length: Option<u64>,
    min_length: Option<u64>,
    step: Option<f64>,
    options: Option<OptionsRepresentation>,
}

/// Accept numbers and booleans where a string default value is expected
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "property value must be a scalar, got {other}"
        ))),
    }
}

impl TryFrom<RawTemplateProperty> for TemplatePropertyRepresentation {
    type Error = String;

    fn try_from(raw: RawTemplateProperty) -> Result<Self, Self::Error> {
        let name = raw
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| "Attribute 'name' is missing".to_string())?;
        Ok(Self {
            prompt: raw.prompt.unwrap_or_else(|| name.clone()),
            name,
            required: raw.required.unwrap_or(false),
            value: raw.value,
            regex: raw.regex,
            templated: raw.templated.unwrap_or(false),
            read_only: raw.read_only.unwrap_or(false),
            input_type: raw
                .input_type
                .unwrap_or_else(|| DEFAULT_INPUT_TYPE.to_string()),
            max: raw.max,
            min: raw.min,
            max_length: raw.max_length,
            min_length: raw.min_length,
            step: raw.step,
            options: raw.options,
        })
    }
}

impl TemplatePropertyRepresentation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// Declared default value
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn regex(&self) -> Option<&str> {
        self.regex.as_deref()
    }

    pub fn templated(&self) -> bool {
        self.templated
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// HAL-FORMS input type, `text` when absent
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max_length(&self) -> Option<u64> {
        self.max_length
    }

    pub fn min_length(&self) -> Option<u64> {
        self.min_length
    }

    pub fn step(&self) -> Option<f64> {
        self.step
    }

    pub fn options(&self) -> Option<&OptionsRepresentation> {
        self.options.as_ref()
    }
}

/// Enumeration constraint, sourced inline or from a remote link
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawOptions")]
pub struct OptionsRepresentation {
    inline: Option<Vec<InlineElementRepresentation>>,
    link: Option<OptionsLinkRepresentation>,
    max_items: Option<u64>,
    min_items: u64,
    prompt_field: Option<String>,
    selected_values: Vec<String>,
    value_field: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    inline: Option<Vec<InlineElementRepresentation>>,
    link: Option<OptionsLinkRepresentation>,
    max_items: Option<u64>,
    min_items: Option<u64>,
    prompt_field: Option<String>,
    selected_values: Option<Vec<String>>,
    value_field: Option<String>,
}

impl From<RawOptions> for OptionsRepresentation {
    fn from(raw: RawOptions) -> Self {
        Self {
            inline: raw.inline,
            link: raw.link,
            max_items: raw.max_items,
            min_items: raw.min_items.unwrap_or(0),
            prompt_field: raw.prompt_field,
            selected_values: raw.selected_values.unwrap_or_default(),
            value_field: raw.value_field,
        }
    }
}

impl OptionsRepresentation {
    pub fn inline(&self) -> Option<&[InlineElementRepresentation]> {
        self.inline.as_deref()
    }

    pub fn link(&self) -> Option<&OptionsLinkRepresentation> {
        self.link.as_ref()
    }

    /// Unbounded when absent
    pub fn max_items(&self) -> Option<u64> {
        self.max_items
    }

    pub fn min_items(&self) -> u64 {
        self.min_items
    }

    pub fn prompt_field(&self) -> Option<&str> {
        self.prompt_field.as_deref()
    }

    pub fn selected_values(&self) -> &[String] {
        &self.selected_values
    }

    pub fn value_field(&self) -> Option<&str> {
        self.value_field.as_deref()
    }

    /// Field compared against submitted values
    pub fn effective_value_field(&self) -> &str {
        self.value_field.as_deref().unwrap_or(DEFAULT_VALUE_FIELD)
    }
}

/// Remote source of option elements
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawOptionsLink")]
pub struct OptionsLinkRepresentation {
    href: String,
    media_type: Option<String>,
    templated: bool,
}

#[derive(Deserialize)]
struct RawOptionsLink {
    href: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    templated: Option<bool>,
}

impl TryFrom<RawOptionsLink> for OptionsLinkRepresentation {
    type Error = String;

    fn try_from(raw: RawOptionsLink) -> Result<Self, Self::Error> {
        Ok(Self {
            href: raw
                .href
                .ok_or_else(|| "Attribute 'href' is missing".to_string())?,
            media_type: raw.media_type,
            templated: raw.templated.unwrap_or(false),
        })
    }
}

impl OptionsLinkRepresentation {
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn templated(&self) -> bool {
        self.templated
    }
}

/// One permitted option: a bare string, or a record of scalar fields
///
/// Numeric and boolean fields are kept in their string form so that a
/// `valueField` pointing at an id compares against submitted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InlineElementRepresentation {
    String(String),
    Map(BTreeMap<String, String>),
}

impl<'de> Deserialize<'de> for InlineElementRepresentation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(value) => Ok(InlineElementRepresentation::String(value)),
            Value::Object(entries) => {
                let mut fields = BTreeMap::new();
                for (key, value) in entries {
                    let value = match value {
                        Value::Null => continue,
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        nested => {
                            return Err(serde::de::Error::custom(format!(
                                "inline option field '{key}' must be a scalar, got {nested}"
                            )));
                        }
                    };
                    fields.insert(key, value);
                }
                Ok(InlineElementRepresentation::Map(fields))
            }
            other => Err(serde::de::Error::custom(format!(
                "inline option must be a string or an object of scalar fields, got {other}"
            ))),
        }
    }
}

impl InlineElementRepresentation {
    /// Value under `value_field`; a string element is its own value
    pub fn value(&self, value_field: &str) -> Option<&str> {
        match self {
            InlineElementRepresentation::String(value) => Some(value),
            InlineElementRepresentation::Map(fields) => {
                fields.get(value_field).map(String::as_str)
            }
        }
    }

    /// Prompt under `prompt_field`, falling back to the value
    pub fn prompt<'a>(
        &'a self,
        prompt_field: Option<&str>,
        value_field: &str,
    ) -> Option<&'a str> {
        match self {
            InlineElementRepresentation::String(value) => Some(value),
            InlineElementRepresentation::Map(fields) => prompt_field
                .and_then(|field| fields.get(field))
                .map(String::as_str)
                .or_else(|| self.value(value_field)),
        }
    }

    pub fn matches(&self, value_field: &str, candidate: &str) -> bool {
        self.value(value_field) == Some(candidate)
    }
}

impl fmt::Display for InlineElementRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineElementRepresentation::String(value) => write!(f, "{value}"),
            InlineElementRepresentation::Map(fields) => {
                let entries: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}
