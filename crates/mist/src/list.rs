use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mist_api::{ClientConfig, Collection, CollectionView, HttpClient, Item, MistApi, ViewOptions};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection to list (e.g. documents, profiles)
    #[arg(default_value = "documents")]
    pub collection: String,

    /// Only items whose name matches this term
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,

    /// Keep loading until the last page
    #[arg(short, long, conflicts_with = "pages")]
    pub all: bool,

    /// Items per page
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Print items as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ListArgs, config: &ClientConfig) -> Result<()> {
    let config = match args.page_size {
        Some(n) => config.clone().with_page_size(n),
        None => config.clone(),
    };
    let api: Arc<dyn MistApi> = Arc::new(HttpClient::new(config.clone())?);
    let options = ViewOptions {
        filter: args.filter.trim().to_string(),
        ..ViewOptions::from(&config)
    };
    let mut view = CollectionView::new(api, Collection::new(&args.collection), options);

    let mut loaded = 0;
    loop {
        if !view.wait_until_idle(config.timeout * 2) {
            anyhow::bail!("Timed out waiting for {}", view.key());
        }
        if let Some(err) = view.error() {
            return Err(err.clone()).with_context(|| format!("Failed to list {}", view.key()));
        }
        loaded += 1;
        if !view.has_more() || (!args.all && loaded >= args.pages) {
            break;
        }
        view.load_next();
    }

    let items: Vec<&Item> = view.items().collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return Ok(());
    }
    for item in &items {
        println!("{}  {}", item.id.dimmed(), item.display_name.bold());
    }

    let last = view.pages().last().map(|p| (p.page_number, p.total_pages));
    if let Some((page, total)) = last {
        let more = if view.has_more() {
            format!(", use --pages {} for more", page + 1)
        } else {
            String::new()
        };
        println!(
            "{}",
            format!("{} items, page {page} of {total}{more}", items.len()).dimmed()
        );
    }
    Ok(())
}
