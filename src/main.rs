use clap::Parser;
use halcheck::adapters::http_client::ReqwestExecutor;
use halcheck::adapters::traversal::HalClient;
use halcheck::cli::{self, Cli, Command};
use halcheck::config::Settings;
use halcheck::domain::property::{PropertyValidationOption, PropertyValidationOptions};
use halcheck::domain::HttpExecutor;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    let executor: Arc<dyn HttpExecutor> =
        Arc::new(ReqwestExecutor::from_settings(&settings.client)?);
    let client = HalClient::new(executor, settings.client.base_uri.clone());
    info!("Using API at {}", client.base_uri());

    match cli.command {
        Command::Templates { follow } => {
            let templates = client.follow(follow).templates().await?;
            println!("self: {}", templates.self_href());
            print!("{}", cli::describe_templates(&templates).await?);
        }
        Command::Submit {
            template,
            follow,
            set,
            values,
            skip_validation,
        } => {
            let templates = client.follow(follow).templates().await?;
            let selected = templates.by_key(&template)?;
            let mut form = selected.create_form();

            let options = if skip_validation {
                PropertyValidationOptions::from(PropertyValidationOption::SkipIfNotValid)
            } else {
                PropertyValidationOptions::none()
            };

            let mut properties = match &values {
                Some(path) => cli::load_values(path)?,
                None => Vec::new(),
            };
            for (name, value) in &set {
                properties.push(cli::property_from_assignment(
                    selected.representation(),
                    name,
                    value,
                )?);
            }
            for property in properties {
                form.with_property(property, options).await?;
            }

            let response = form.submit().await?;
            println!("{}", response.status);
            let body = response.text();
            if !body.is_empty() {
                println!("{body}");
            }
        }
    }

    Ok(())
}
