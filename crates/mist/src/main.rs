use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use mist_api::{ClientConfig, Settings};

mod ask;
mod insert;
mod list;
mod meta;
mod search;
mod settings;
mod show;

#[derive(Parser)]
#[command(name = "mist")]
#[command(about = "Browse, search and upload MIST documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// API base URL (overrides the saved setting and MIST_API_URL)
    #[arg(long = "api-url", global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a collection page by page
    #[command(alias = "ls")]
    List(list::ListArgs),

    /// Show one document with its label similarities
    Show(show::ShowArgs),

    /// Score labels against a document
    Meta(meta::MetaArgs),

    /// Semantic search by text
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// Upload a new document by image URL
    Insert(insert::InsertArgs),

    /// Ask the coding assistant
    Ask(ask::AskArgs),

    /// List the assistant's instruction templates
    Instructions(ask::InstructionsArgs),

    /// View or change saved settings
    Config(settings::ConfigArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let settings = Settings::load()?;
    let api_url = cli.api_url.as_deref();

    // Settings stay editable even when the saved URL is broken
    match cli.command {
        Commands::Config(args) => settings::execute(args, settings, api_url),
        Commands::List(args) => list::execute(args, &client_config(api_url, &settings)?),
        Commands::Show(args) => show::execute(args, &client_config(api_url, &settings)?),
        Commands::Meta(args) => meta::execute(args, &client_config(api_url, &settings)?),
        Commands::Search(args) => search::execute(args, &client_config(api_url, &settings)?),
        Commands::Insert(args) => insert::execute(args, &client_config(api_url, &settings)?),
        Commands::Ask(args) => ask::execute(args, &client_config(api_url, &settings)?),
        Commands::Instructions(args) => ask::list(args, &client_config(api_url, &settings)?),
    }
}

fn client_config(api_url: Option<&str>, settings: &Settings) -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::from_env(api_url, settings)?;
    log::debug!("Using API at {}", config.base_url);
    Ok(config)
}
