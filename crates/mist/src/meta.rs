use anyhow::{Context, Result};
use clap::Args;
use mist_api::{ranking, require_labels, ClientConfig, HttpClient, MistApi};

use crate::show::print_ranked;

#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Document id
    pub id: String,

    /// Label to score (repeatable); defaults to the saved labels
    #[arg(short, long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Print the ranked scores as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: MetaArgs, config: &ClientConfig) -> Result<()> {
    let labels = if args.labels.is_empty() {
        config.labels.clone()
    } else {
        args.labels
    };
    require_labels(&labels)
        .context("Pass --label or save labels with `mist config add-label <LABEL>`")?;

    let client = HttpClient::new(config.clone())?;
    let meta_info = client
        .get_meta_info(&args.id, &labels)
        .with_context(|| format!("Failed to score labels for {}", args.id))?;
    let ranked = ranking::rank(meta_info);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        print_ranked(&ranked);
    }
    Ok(())
}
