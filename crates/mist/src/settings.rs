use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use mist_api::config::API_URL_ENV;
use mist_api::{ClientConfig, Settings};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the effective settings
    Show,
    /// Save the API base URL
    SetUrl { url: String },
    /// Forget the saved API base URL
    ResetUrl,
    /// Add a label for similarity scoring
    AddLabel { label: String },
    /// Remove a label
    RemoveLabel { label: String },
    /// Remove every label
    ClearLabels,
}

pub fn execute(args: ConfigArgs, mut settings: Settings, api_url: Option<&str>) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => return show(&settings, api_url),
        Some(ConfigCommand::SetUrl { url }) => {
            settings.set_api_base_url(&url)?;
            if let Some(url) = &settings.api_base_url {
                println!("{} API URL set to {url}", "✓".green());
            }
        }
        Some(ConfigCommand::ResetUrl) => {
            settings.api_base_url = None;
            println!("{} API URL reset", "✓".green());
        }
        Some(ConfigCommand::AddLabel { label }) => {
            if !settings.add_label(&label) {
                anyhow::bail!("Label {:?} is empty or already present", label.trim());
            }
            println!("{} Added label {}", "✓".green(), label.trim().bold());
        }
        Some(ConfigCommand::RemoveLabel { label }) => {
            if !settings.remove_label(&label) {
                anyhow::bail!("No label {label:?}");
            }
            println!("{} Removed label {}", "✓".green(), label.bold());
        }
        Some(ConfigCommand::ClearLabels) => {
            settings.labels.clear();
            println!("{} Cleared labels", "✓".green());
        }
    }
    settings.save()
}

fn show(settings: &Settings, api_url: Option<&str>) -> Result<()> {
    let path = Settings::default_path()?;
    println!("{:<10} {}", "File:", path.display());

    match ClientConfig::from_env(api_url, settings) {
        Ok(config) => {
            let source = if api_url.is_some() {
                "--api-url"
            } else if settings.api_base_url.is_some() {
                "settings"
            } else if std::env::var(API_URL_ENV).is_ok() {
                API_URL_ENV
            } else {
                "default"
            };
            println!("{:<10} {} {}", "API URL:", config.base_url, format!("({source})").dimmed());
        }
        Err(e) => println!("{:<10} {} {e:#}", "API URL:", "invalid:".red()),
    }

    if settings.labels.is_empty() {
        println!("{:<10} {}", "Labels:", "(none)".dimmed());
    } else {
        println!("{:<10} {}", "Labels:", settings.labels.join(", "));
    }
    Ok(())
}
