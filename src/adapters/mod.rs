pub mod form;
pub mod http_client;
pub mod options_resolver;
pub mod property_validator;
pub mod templates;
pub mod traversal;

#[cfg(test)]
mod test_support;
