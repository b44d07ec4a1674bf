//! Report command handler: lays out local markup without the model.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use quill_core::config;
use quill_core::core::ReportArtifact;
use quill_core::directive::ReportDirective;

pub fn run(
    title: &str,
    input: Option<&Path>,
    output: Option<&Path>,
    config: &config::Config,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("Report title must not be empty");
    }

    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read report input {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut buf)
                .context("read report input from stdin")?;
            buf
        }
    };

    let directive = ReportDirective {
        title: title.to_string(),
        content,
    };
    let artifact = ReportArtifact::from_directive(&directive, &config.report)?;

    let path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            std::fs::write(path, artifact.to_pdf())
                .with_context(|| format!("write {}", path.display()))?;
            path.to_path_buf()
        }
        None => artifact.save_in(&config.output_dir())?,
    };

    let pages = artifact.document.pages.len();
    let unit = if pages == 1 { "page" } else { "pages" };
    println!("Saved: {} ({pages} {unit})", path.display());
    Ok(())
}
