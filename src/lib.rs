//! # halcheck - HAL-FORMS client with client-side validation
//!
//! halcheck reads the `_templates` a HAL-FORMS server advertises, validates
//! form values against each declared property before anything is sent, and
//! cross-checks its own predictions against the status the server returns.
//!
//! ## Features
//!
//! - **Template model**: parses `_templates` verbatim, with HAL-FORMS defaults applied
//! - **Validation**: required, regex, min/max, length, step, input type and options
//! - **Remote options**: option lists fetched from a link on demand
//! - **Reconciliation**: a prediction of failure must be met by a 4xx from the server
//! - **Traversal**: follows `_links` relations with URI template parameters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use halcheck::adapters::http_client::ReqwestExecutor;
//! use halcheck::adapters::traversal::HalClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = Arc::new(ReqwestExecutor::new("http://localhost:8080/")?);
//!     let templates = HalClient::new(executor, "/").follow(["orders"]).templates().await?;
//!
//!     let mut form = templates.by_key("default")?.create_form();
//!     form.with_string("name", Some("john")).await?;
//!     let response = form.submit().await?;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! halcheck follows Hexagonal Architecture:
//! - **Domain**: template model, typed properties and the HTTP port
//! - **Adapters**: validators, form orchestration, traversal and the reqwest executor
//! - **Config**: client settings from file, environment and CLI

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;

pub use error::{HalError, HalResult};
