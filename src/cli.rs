use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::adapters::options_resolver::TemplateOptions;
use crate::adapters::property_validator::NUMBER_HAL_FORMS_TYPES;
use crate::adapters::templates::Templates;
use crate::domain::property::{FormProperty, FormValue, ValueType};
use crate::domain::template::TemplateRepresentation;
use crate::error::{HalError, HalResult};

/// HAL-FORMS client: inspect templates and submit client-side validated forms
#[derive(Parser, Debug, Clone)]
#[command(name = "halcheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "HALCHECK_CONFIG", default_value = "halcheck.toml", global = true)]
    pub config: PathBuf,

    /// Entry point of the API
    #[arg(long, env = "HALCHECK_BASE_URI", global = true)]
    pub base_uri: Option<String>,

    /// Header sent with every request
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header, global = true)]
    pub headers: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the templates of a resource
    Templates {
        /// Relation to follow from the base URI, repeatable
        #[arg(long = "follow", value_name = "REL")]
        follow: Vec<String>,
    },
    /// Fill in a template and submit it
    Submit {
        /// Template key
        #[arg(short, long, default_value = "default")]
        template: String,

        /// Relation to follow from the base URI, repeatable
        #[arg(long = "follow", value_name = "REL")]
        follow: Vec<String>,

        /// Property value, typed after the declared input type
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// JSON or YAML object of property values
        #[arg(long)]
        values: Option<PathBuf>,

        /// Send values as given, without client-side validation
        #[arg(long)]
        skip_validation: bool,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got `{raw}`"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    Ok((name.to_string(), value.to_string()))
}

/// Read a JSON or YAML object of property values, chosen by file extension
pub fn load_values(path: &Path) -> anyhow::Result<Vec<FormProperty>> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let document: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let Value::Object(fields) = document else {
        anyhow::bail!("{} must contain an object of property values", path.display());
    };
    fields
        .iter()
        .map(|(name, value)| Ok(property_from_json(name, value)?))
        .collect()
}

/// Map a JSON value onto a typed property: integers become longs, other
/// numbers doubles, arrays take the type of their elements
pub fn property_from_json(name: &str, value: &Value) -> HalResult<FormProperty> {
    match value {
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| form_value(name, item))
                .collect::<HalResult<Vec<_>>>()?;
            let value_type = values
                .iter()
                .flatten()
                .next()
                .map(FormValue::value_type)
                .unwrap_or(ValueType::String);
            FormProperty::new(value_type, name, values, true)
        }
        other => {
            let value = form_value(name, other)?;
            let value_type = value
                .as_ref()
                .map(FormValue::value_type)
                .unwrap_or(ValueType::String);
            FormProperty::scalar(value_type, name, value)
        }
    }
}

fn form_value(name: &str, value: &Value) -> HalResult<Option<FormValue>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(FormValue::String(s.clone()))),
        Value::Bool(b) => Ok(Some(FormValue::Boolean(*b))),
        Value::Number(n) => Ok(Some(match n.as_i64() {
            Some(long) => FormValue::Long(long),
            None => FormValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        })),
        _ => Err(HalError::InvalidArgument(format!(
            "Property '{name}' must hold a scalar or an array of scalars"
        ))),
    }
}

/// Property for a `--set NAME=VALUE` assignment.
///
/// Values of properties declared with a numeric input type become longs or
/// doubles; anything else, including undeclared names, stays a string.
pub fn property_from_assignment(
    representation: &TemplateRepresentation,
    name: &str,
    value: &str,
) -> HalResult<FormProperty> {
    let numeric = representation
        .property(name)
        .is_some_and(|declaration| NUMBER_HAL_FORMS_TYPES.contains(&declaration.input_type()));
    if numeric {
        if let Ok(long) = value.parse::<i64>() {
            return FormProperty::scalar(ValueType::Long, name, Some(FormValue::Long(long)));
        }
        if let Ok(double) = value.parse::<f64>() {
            return FormProperty::scalar(ValueType::Double, name, Some(FormValue::Double(double)));
        }
    }
    FormProperty::string(name, Some(value))
}

/// Human-readable listing of templates, with option choices resolved
pub async fn describe_templates(templates: &Templates) -> HalResult<String> {
    let mut out = String::new();
    for template in templates.list() {
        let representation = template.representation();
        out.push_str(&format!(
            "{}: {} {} ({})\n",
            template.key(),
            template.method(),
            template.target(),
            representation.content_type()
        ));
        if let Some(title) = representation.title() {
            out.push_str(&format!("  title: {title}\n"));
        }

        for property in representation.properties() {
            let mut constraints = vec![format!("type={}", property.input_type())];
            if property.required() {
                constraints.push("required".to_string());
            }
            if property.read_only() {
                constraints.push("readOnly".to_string());
            }
            if let Some(value) = property.value() {
                constraints.push(format!("value={value}"));
            }
            if let Some(regex) = property.regex() {
                constraints.push(format!("regex={regex}"));
            }
            if let Some(min) = property.min() {
                constraints.push(format!("min={min}"));
            }
            if let Some(max) = property.max() {
                constraints.push(format!("max={max}"));
            }
            if let Some(min_length) = property.min_length() {
                constraints.push(format!("minLength={min_length}"));
            }
            if let Some(max_length) = property.max_length() {
                constraints.push(format!("maxLength={max_length}"));
            }
            if let Some(step) = property.step() {
                constraints.push(format!("step={step}"));
            }
            out.push_str(&format!(
                "  - {} \"{}\" [{}]\n",
                property.name(),
                property.prompt(),
                constraints.join(", ")
            ));

            let Some(options) = property.options() else {
                continue;
            };
            let choices = TemplateOptions::new(template.executor(), options)
                .resolve_elements()
                .await?
                .unwrap_or_default();
            let value_field = options.effective_value_field();
            let rendered: Vec<String> = choices
                .iter()
                .map(|choice| {
                    let value = choice.value(value_field).unwrap_or_default();
                    match choice.prompt(options.prompt_field(), value_field) {
                        Some(prompt) if prompt != value => format!("{value} ({prompt})"),
                        _ => value.to_string(),
                    }
                })
                .collect();
            out.push_str(&format!("      options: {}\n", rendered.join(", ")));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["halcheck", "templates"]);
        assert_eq!(cli.config, PathBuf::from("halcheck.toml"));
        assert!(cli.base_uri.is_none());
        assert!(cli.headers.is_empty());
        assert_eq!(cli.command, Command::Templates { follow: vec![] });
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "halcheck",
            "--base-uri",
            "http://localhost:9000/",
            "--header",
            "Authorization: Bearer abc",
            "submit",
            "--template",
            "create",
            "--follow",
            "orders",
            "--set",
            "name=john=doe",
            "--skip-validation",
        ]);
        assert_eq!(cli.base_uri.as_deref(), Some("http://localhost:9000/"));
        assert_eq!(
            cli.headers,
            vec![("Authorization".to_string(), "Bearer abc".to_string())]
        );
        assert_eq!(
            cli.command,
            Command::Submit {
                template: "create".to_string(),
                follow: vec!["orders".to_string()],
                set: vec![("name".to_string(), "john=doe".to_string())],
                values: None,
                skip_validation: true,
            }
        );
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        assert!(Cli::try_parse_from(["halcheck", "--header", "nocolon", "templates"]).is_err());
    }

    #[test]
    fn test_property_from_json() {
        let long = property_from_json("n", &json!(3)).unwrap();
        assert_eq!(long.value_type(), ValueType::Long);

        let double = property_from_json("d", &json!(1.5)).unwrap();
        assert_eq!(double.first_value(), Some(&FormValue::Double(1.5)));

        let array = property_from_json("tags", &json!(["a", "b"])).unwrap();
        assert!(array.is_array());
        assert_eq!(array.values().len(), 2);

        let null = property_from_json("x", &Value::Null).unwrap();
        assert!(null.first_value().is_none());

        assert!(property_from_json("mixed", &json!(["a", 1])).is_err());
        assert!(property_from_json("obj", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_assignment_follows_declared_input_type() {
        let representation: TemplateRepresentation = serde_json::from_value(json!({
            "method": "POST",
            "properties": [
                {"name": "quantity", "type": "number"},
                {"name": "month", "type": "month"},
                {"name": "zip", "type": "text"}
            ]
        }))
        .unwrap();

        let quantity = property_from_assignment(&representation, "quantity", "3").unwrap();
        assert_eq!(quantity.first_value(), Some(&FormValue::Long(3)));

        let month = property_from_assignment(&representation, "month", "2.5").unwrap();
        assert_eq!(month.first_value(), Some(&FormValue::Double(2.5)));

        let zip = property_from_assignment(&representation, "zip", "01234").unwrap();
        assert_eq!(zip.first_value(), Some(&FormValue::String("01234".to_string())));

        let unparsable = property_from_assignment(&representation, "quantity", "many").unwrap();
        assert_eq!(unparsable.value_type(), ValueType::String);

        let undeclared = property_from_assignment(&representation, "other", "7").unwrap();
        assert_eq!(undeclared.value_type(), ValueType::String);
    }

    #[test]
    fn test_load_yaml_values() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "name: john\nquantity: 2\nactive: true").unwrap();

        let properties = load_values(file.path()).unwrap();
        let names: Vec<&str> = properties.iter().map(FormProperty::name).collect();
        assert_eq!(names, vec!["active", "name", "quantity"]);
    }
}
