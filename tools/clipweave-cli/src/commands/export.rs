//! Write subtitle files and export manifests.

use std::path::PathBuf;

use clipweave_project_model::LoadedProject;
use clipweave_render_engine::{generate_subtitles, save_subtitles, ExportManifest, SubtitleFormat};

pub fn subtitles(
    path: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    if let (None, Some(out)) = (&format, &output) {
        let format = save_subtitles(&project.project, out)?;
        println!(
            "Wrote {} subtitle entries to {} ({})",
            project.project.subtitles.len(),
            out.display(),
            format.extension()
        );
        return Ok(());
    }

    let format = match &format {
        Some(f) => f.parse::<SubtitleFormat>()?,
        None => SubtitleFormat::Ass,
    };
    let output_path = output.unwrap_or_else(|| {
        project
            .exports_dir()
            .join(format!("subtitles.{}", format.extension()))
    });

    if project.project.subtitles.is_empty() {
        println!("Project has no subtitles; writing an empty {} file", format.extension());
    }

    std::fs::write(&output_path, generate_subtitles(&project.project, format))?;
    println!(
        "Wrote {} subtitle entries to {}",
        project.project.subtitles.len(),
        output_path.display()
    );
    Ok(())
}

pub fn manifest(path: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let manifest = ExportManifest::from_project(&project.project);
    let output_path = output.unwrap_or_else(|| project.exports_dir().join("manifest.json"));
    std::fs::write(&output_path, manifest.to_json()?)?;

    println!("Wrote export manifest to {}", output_path.display());
    println!("  Clips: {}", manifest.clips.len());
    println!("  Duration: {:.2}s", manifest.duration);
    println!("  Burn subtitles: {}", manifest.burn_subtitles);
    Ok(())
}
