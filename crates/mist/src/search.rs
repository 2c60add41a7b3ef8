use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mist_api::{ClientConfig, HttpClient, MistApi, DEFAULT_SEARCH_LIMIT};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text describing what to look for
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Maximum number of results
    #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: u32,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: SearchArgs, config: &ClientConfig) -> Result<()> {
    let text = args.text.join(" ");
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Search text must not be empty");
    }

    let client = HttpClient::new(config.clone())?;
    let results = client
        .search_by_text(text, args.limit)
        .with_context(|| format!("Search for {text:?} failed"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("{}", "No matches".yellow());
        return Ok(());
    }

    for (i, item) in results.iter().enumerate() {
        let score = match item.similarity_score {
            Some(s) => format!("{s:>6.2}%"),
            None => " ".repeat(7),
        };
        println!(
            "{:>2}. {}  {}  {}",
            i + 1,
            score.green(),
            item.display_name.bold(),
            item.id.dimmed()
        );
    }
    Ok(())
}
