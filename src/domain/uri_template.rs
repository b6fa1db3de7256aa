//! RFC 6570 URI template expansion (levels 1 to 3)
//!
//! Unbound variables are dropped, so expanding with an empty map strips every
//! expression from the template.

use reqwest::Url;
use std::collections::BTreeMap;

struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    empty_suffix: &'static str,
    allow_reserved: bool,
}

fn operator(prefix: Option<char>) -> Operator {
    match prefix {
        Some('+') => Operator {
            first: "",
            separator: ",",
            named: false,
            empty_suffix: "",
            allow_reserved: true,
        },
        Some('#') => Operator {
            first: "#",
            separator: ",",
            named: false,
            empty_suffix: "",
            allow_reserved: true,
        },
        Some('.') => Operator {
            first: ".",
            separator: ".",
            named: false,
            empty_suffix: "",
            allow_reserved: false,
        },
        Some('/') => Operator {
            first: "/",
            separator: "/",
            named: false,
            empty_suffix: "",
            allow_reserved: false,
        },
        Some(';') => Operator {
            first: ";",
            separator: ";",
            named: true,
            empty_suffix: "",
            allow_reserved: false,
        },
        Some('?') => Operator {
            first: "?",
            separator: "&",
            named: true,
            empty_suffix: "=",
            allow_reserved: false,
        },
        Some('&') => Operator {
            first: "&",
            separator: "&",
            named: true,
            empty_suffix: "=",
            allow_reserved: false,
        },
        _ => Operator {
            first: "",
            separator: ",",
            named: false,
            empty_suffix: "",
            allow_reserved: false,
        },
    }
}

/// Expand `template` with `variables`.
pub fn expand(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            // Unterminated expression is kept literally
            expanded.push_str(&rest[open..]);
            return expanded;
        };
        expanded.push_str(&expand_expression(&after_open[..close], variables));
        rest = &after_open[close + 1..];
    }
    expanded.push_str(rest);
    expanded
}

fn expand_expression(expression: &str, variables: &BTreeMap<String, String>) -> String {
    let prefix = expression
        .chars()
        .next()
        .filter(|c| matches!(c, '+' | '#' | '.' | '/' | ';' | '?' | '&'));
    let op = operator(prefix);
    let names = match prefix {
        Some(c) => &expression[c.len_utf8()..],
        None => expression,
    };

    let mut parts = Vec::new();
    for spec in names.split(',') {
        let (name, max_length) = parse_varspec(spec);
        let Some(value) = variables.get(name) else {
            continue;
        };
        let value = match max_length {
            Some(limit) => value.chars().take(limit).collect::<String>(),
            None => value.clone(),
        };
        let encoded = encode(&value, op.allow_reserved);
        if op.named {
            if encoded.is_empty() {
                parts.push(format!("{name}{}", op.empty_suffix));
            } else {
                parts.push(format!("{name}={encoded}"));
            }
        } else {
            parts.push(encoded);
        }
    }

    if parts.is_empty() {
        return String::new();
    }
    format!("{}{}", op.first, parts.join(op.separator))
}

/// Resolve `reference` against `base`; `reference` is returned unchanged
/// when `base` is not an absolute URI.
pub fn resolve(base: &str, reference: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(reference))
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

fn parse_varspec(spec: &str) -> (&str, Option<usize>) {
    let spec = spec.trim().trim_end_matches('*');
    match spec.split_once(':') {
        Some((name, limit)) => (name, limit.parse().ok()),
        None => (spec, None),
    }
}

fn encode(value: &str, allow_reserved: bool) -> String {
    if !allow_reserved {
        return urlencoding::encode(value).into_owned();
    }
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(c) {
            encoded.push(c);
        } else {
            let mut buf = [0u8; 4];
            encoded.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    encoded
}
