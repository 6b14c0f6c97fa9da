//! Validate a Clipweave project.

use std::path::PathBuf;

use clipweave_common::config::AppConfig;
use clipweave_project_model::{EditLimits, LoadedProject};

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!(
        "  Canvas: {}x{}",
        project.project.canvas.width, project.project.canvas.height
    );
    println!("  Clips: {}", project.project.clips().count());
    println!("  Subtitles: {}", project.project.subtitles.len());

    let errors = project.validate_with(&EditLimits::from(&config.engine));
    if errors.is_empty() {
        println!("\nProject is valid.");
        Ok(())
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("{} issue(s) found", errors.len())
    }
}
