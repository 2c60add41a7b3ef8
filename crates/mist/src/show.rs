use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mist_api::ranking::{self, MetaInfo};
use mist_api::{ClientConfig, Collection, HttpClient, MistApi, Record};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item id
    pub id: String,

    /// Collection the item belongs to
    #[arg(short, long, default_value = "documents")]
    pub collection: String,

    /// Print the raw record as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ShowArgs, config: &ClientConfig) -> Result<()> {
    let client = HttpClient::new(config.clone())?;
    let collection = Collection::new(&args.collection);

    let record = client
        .get_detail(&collection, &args.id)
        .with_context(|| format!("Failed to fetch {} {}", collection.name, args.id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    print_record(&record, &args.id);

    if config.labels.is_empty() {
        println!();
        println!(
            "{}",
            "No labels configured; add some with `mist config add-label <LABEL>`".dimmed()
        );
        return Ok(());
    }

    // Label scores are secondary; a failure here should not hide the record
    match client.get_meta_info(&args.id, &config.labels) {
        Ok(meta_info) => {
            println!();
            print_ranked(&ranking::rank(meta_info));
        }
        Err(e) => {
            log::warn!("Meta info for {} failed: {e}", args.id);
            println!("{} {e}", "Could not load label scores:".yellow());
        }
    }
    Ok(())
}

fn print_record(record: &Record, id: &str) {
    println!(
        "{}  {}",
        record.name().unwrap_or("(unnamed)").bold(),
        record.id().unwrap_or(id).dimmed()
    );
    if let Some(date) = record.updated_date() {
        println!("{:<10} {date}", "Updated:");
    }
    if let Some(url) = record.image_url() {
        println!("{:<10} {url}", "Image:");
    }
}

pub fn print_ranked(ranked: &[MetaInfo]) {
    let Some(best) = ranking::top(ranked) else {
        println!("{}", "No label scored above the similarity threshold".yellow());
        return;
    };
    println!(
        "{} {} ({:.2}%)",
        "Best match:".green(),
        best.label.bold(),
        best.similarity_score
    );
    println!("{}", ranking::render(ranked));
}
