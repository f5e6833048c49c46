pub mod convert;
pub mod rush;

use crate::config::Config;
use crate::console;
use crate::project::Project;
use anyhow::{Context, Result};
use pnpm2npm_core::{ConvertOptions, lockfile, npm};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

pub enum Output {
    File(PathBuf),
    Stdout,
}

/// Reads the project's pnpm lockfile, converts it and writes the result.
pub fn convert_project(project: &Project, output: Output) -> Result<()> {
    console::step(&format!(
        "Converting {}",
        project.lockfile_path.display()
    ));

    let config = Config::from_env(&project.root);

    let text = project.read_lockfile()?;
    let mut graph = lockfile::parse(&text)
        .with_context(|| format!("Failed to parse {}", project.lockfile_path.display()))?;

    debug!(
        lockfile_version = %graph.lockfile_version,
        importers = graph.importers.len(),
        packages = graph.packages.len(),
        "parsed pnpm lockfile"
    );

    project.relocate(&mut graph);

    let options = ConvertOptions {
        importers: project.importer_manifests(&graph)?,
        registry: config.registry(),
        max_depth: config.max_depth,
    };

    let conversion = pnpm2npm_core::convert(&graph, &options)?;
    for warning in &conversion.warnings {
        console::warn(&warning.to_string());
    }

    let mut json = serde_json::to_string_pretty(&conversion.lockfile)
        .context("Failed to serialize package-lock.json")?;
    json.push('\n');

    match output {
        Output::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
        }
        Output::File(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            info!(
                entries = conversion.lockfile.packages.len(),
                warnings = conversion.warnings.len(),
                "wrote {}",
                path.display()
            );

            console::file_size(lockfile::FILE_NAME, text.len());
            console::file_size(npm::FILE_NAME, json.len());

            let dir = path
                .parent()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default();
            console::success(npm::FILE_NAME, &dir);
        }
    }

    Ok(())
}
