use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use thiserror::Error;

use crate::config::{ClientSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let errors = Self::validate_client(&settings.client);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_client(client: &ClientSettings) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if client.base_uri.is_empty() {
            errors.push(ValidationError::MissingField("client.base_uri".to_string()));
        } else if let Err(e) = Url::parse(&client.base_uri) {
            errors.push(ValidationError::InvalidValue {
                field: "client.base_uri".to_string(),
                reason: e.to_string(),
            });
        }

        if client.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "client.timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if client.accept.is_empty() {
            errors.push(ValidationError::MissingField("client.accept".to_string()));
        }

        // Sorted so that error output is stable
        let mut headers: Vec<_> = client.headers.iter().collect();
        headers.sort();
        for (name, value) in headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("client.headers.{name}"),
                    reason: "Invalid header name".to_string(),
                });
            }
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("client.headers.{name}"),
                    reason: "Invalid header value".to_string(),
                });
            }
        }

        errors
    }
}
