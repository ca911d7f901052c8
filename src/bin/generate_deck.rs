use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use doable_agent_server::deck::{write_deck_file, BUNDLED_DECK, DEFAULT_FOOTER_LABEL};
use doable_agent_server::logger::init_cli_logger;

/// Renders the HTML pitch deck into a PowerPoint file.
#[derive(Debug, Parser)]
#[command(name = "generate_deck", version)]
struct Args {
    /// HTML deck to convert. Defaults to the bundled Doable deck.
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, default_value = "Doable_Presentation.pptx")]
    output: PathBuf,

    /// Text placed before the date in slide footers.
    #[arg(long, default_value = DEFAULT_FOOTER_LABEL)]
    footer_label: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_cli_logger("info");

    let html = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => BUNDLED_DECK.to_string(),
    };

    info!(footer_label = %args.footer_label, "rendering deck");
    write_deck_file(&html, &args.footer_label, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let saved = std::fs::canonicalize(&args.output).unwrap_or_else(|_| args.output.clone());
    println!("Presentation saved to {}", saved.display());
    Ok(())
}
