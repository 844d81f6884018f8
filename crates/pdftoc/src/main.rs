#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod extract;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract structural outlines (title + H1/H2/H3 headings with page numbers) from PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Path to a trained classifier artifact (JSON). When omitted, the
    /// built-in font-size ranking model is used.
    #[clap(long, env = "PDFTOC_MODEL", global = true)]
    model: Option<std::path::PathBuf>,

    /// Percentile of the document's font sizes used as the heading-size floor.
    #[clap(long, env = "PDFTOC_PERCENTILE", global = true, default_value_t = outline::DEFAULT_PERCENTILE)]
    percentile: f64,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Process every PDF in a directory, writing one JSON outline each
    Extract(crate::extract::BatchApp),

    /// Print a single document's outline as JSON
    Outline(crate::extract::OutlineApp),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(sub_app) => crate::extract::run_batch(sub_app, app.global),
        SubCommands::Outline(sub_app) => crate::extract::run_outline(sub_app, app.global),
    }
}
