use std::path::{Path, PathBuf};

use outline::{HeadingModel, RankingModel, TreeModel};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "extract")]
pub struct BatchApp {
    /// Directory containing the input PDFs
    #[arg(short, long, env = "PDFTOC_INPUT", default_value = "input")]
    input: PathBuf,

    /// Directory receiving one `<stem>_outline.json` per document
    #[arg(short, long, env = "PDFTOC_OUTPUT", default_value = "output")]
    output: PathBuf,
}

#[derive(Debug, clap::Parser)]
#[command(name = "outline")]
pub struct OutlineApp {
    /// Path to the PDF file
    path: PathBuf,
}

/// Load the classifier once per process; every document shares it.
fn load_model(global: &crate::Global) -> Result<Box<dyn HeadingModel>> {
    match &global.model {
        Some(path) => {
            let model = TreeModel::load(path)
                .map_err(|e| eyre!(e))
                .with_context(|| format!("cannot load model artifact {}", path.display()))?;
            Ok(Box::new(model))
        }
        None => Ok(Box::new(RankingModel::new())),
    }
}

/// File name without path or extension; the document's outline title.
fn title_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn process_file(
    path: &Path,
    model: &dyn HeadingModel,
    percentile: f64,
) -> Result<outline::Outline> {
    let bytes = std::fs::read(path)?;
    outline::extract_outline(&bytes, &title_for(path), model, percentile).map_err(|e| eyre!(e))
}

pub fn run_batch(app: BatchApp, global: crate::Global) -> Result<()> {
    let model = load_model(&global)?;

    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(&app.input)
        .with_context(|| format!("cannot read input directory {}", app.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_pdf(p))
        .collect();
    pdfs.sort();

    if pdfs.is_empty() {
        log::warn!("no PDF files found in {}", app.input.display());
        return Ok(());
    }

    std::fs::create_dir_all(&app.output)
        .with_context(|| format!("cannot create output directory {}", app.output.display()))?;

    for path in &pdfs {
        match process_file(path, model.as_ref(), global.percentile) {
            Ok(outline) => {
                let out_path = app.output.join(format!("{}_outline.json", title_for(path)));
                std::fs::write(&out_path, serde_json::to_string_pretty(&outline)?)?;
                log::info!("wrote {}", out_path.display());
            }
            // Per-document failures are reported and never abort the batch.
            Err(err) => log::error!("failed to process {}: {:#}", path.display(), err),
        }
    }

    Ok(())
}

pub fn run_outline(app: OutlineApp, global: crate::Global) -> Result<()> {
    let model = load_model(&global)?;
    let outline = process_file(&app.path, model.as_ref(), global.percentile)?;
    println!("{}", serde_json::to_string_pretty(&outline)?);
    Ok(())
}
