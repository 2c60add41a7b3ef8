use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mist_api::assist::DEFAULT_COMPLETION_MODEL;
use mist_api::{ClientConfig, CompletionRequest, HttpClient, MistApi};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question or task for the assistant
    #[arg(required = true)]
    pub prompt: Vec<String>,

    /// Instruction template to follow (see `mist instructions`)
    #[arg(short, long, value_name = "ID")]
    pub instruction: Option<String>,

    /// Completion model
    #[arg(short, long, default_value = DEFAULT_COMPLETION_MODEL)]
    pub model: String,
}

#[derive(Args, Debug)]
pub struct InstructionsArgs {
    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Instructions per page (at most 100)
    #[arg(long, default_value_t = 10)]
    pub page_size: u32,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: AskArgs, config: &ClientConfig) -> Result<()> {
    let prompt = args.prompt.join(" ");
    let mut request = CompletionRequest::new(prompt.trim()).with_model(args.model);
    if let Some(id) = args.instruction {
        request = request.with_instruction(id);
    }

    let client = HttpClient::new(config.clone())?;
    let completion = client
        .complete(&request)
        .context("Failed to get a completion")?;

    println!("{}", completion.response);
    if let Some(usage) = completion.usage {
        log::debug!(
            "{} prompt tokens, {} completion tokens",
            usage.prompt_tokens,
            usage.completion_tokens
        );
    }
    Ok(())
}

pub fn list(args: InstructionsArgs, config: &ClientConfig) -> Result<()> {
    let client = HttpClient::new(config.clone())?;
    let page = client
        .list_instructions(args.page, args.page_size)
        .context("Failed to list instructions")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page.instructions)?);
        return Ok(());
    }
    if page.instructions.is_empty() {
        println!("{}", "No instructions found".yellow());
        return Ok(());
    }

    for instruction in &page.instructions {
        println!(
            "{}  {}",
            instruction.id.dimmed(),
            instruction.technology.bold()
        );
        if !instruction.summary.is_empty() {
            println!("    {}", instruction.summary);
        }
        for rule in &instruction.strict_rules {
            println!("    {} {rule}", "-".dimmed());
        }
    }
    println!(
        "{}",
        format!("page {} of {}", page.page, page.total_pages.max(1)).dimmed()
    );
    Ok(())
}
