use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mist_api::{ClientConfig, HttpClient, MistApi};

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Document name
    pub name: String,

    /// Public URL of the document's image
    #[arg(long = "image-url", value_name = "URL")]
    pub image_url: String,
}

pub fn execute(args: InsertArgs, config: &ClientConfig) -> Result<()> {
    let image_url = url::Url::parse(args.image_url.trim())
        .with_context(|| format!("Invalid image URL {:?}", args.image_url))?;

    let client = HttpClient::new(config.clone())?;
    let inserted = client
        .insert_document(&args.name, image_url.as_str())
        .with_context(|| format!("Failed to upload {:?}", args.name))?;

    if !inserted.is_success() {
        anyhow::bail!(
            "Upload was rejected ({}): {}",
            inserted.status,
            inserted.message.as_deref().unwrap_or("no message")
        );
    }
    match inserted.id {
        Some(id) => println!("{} Uploaded {} as {}", "✓".green(), args.name.bold(), id),
        None => println!("{} Uploaded {}", "✓".green(), args.name.bold()),
    }
    Ok(())
}
