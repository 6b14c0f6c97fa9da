//! Initialize a new Clipweave project.

use std::path::PathBuf;

use clipweave_project_model::{CanvasSize, LoadedProject};

pub fn run(name: String, output: PathBuf, width: u32, height: u32) -> anyhow::Result<()> {
    let project_dir = output.join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let project = LoadedProject::create(&project_dir, &name, CanvasSize::new(width, height))
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Canvas: {}x{}", width, height);
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── meta/        (project.json)");
    println!("  ├── media/       (local video and image sources)");
    println!("  └── exports/     (subtitles and manifests)");

    Ok(())
}
