use super::{Output, convert_project};
use crate::console;
use crate::project::Project;
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// pnpm-lock.yaml, or a directory containing one (default: nearest to the current directory)
    pub path: Option<PathBuf>,

    /// Where to write package-lock.json (default: next to pnpm-lock.yaml)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Print package-lock.json to stdout instead of writing a file
    #[arg(long = "stdout", conflicts_with = "output")]
    pub stdout: bool,
}

pub fn run(args: ConvertArgs, cwd: &Path) -> Result<()> {
    console::header("convert");

    let project = match &args.path {
        Some(path) => Project::from_path(&cwd.join(path))?,
        None => Project::discover(cwd)?,
    };

    let output = if args.stdout {
        Output::Stdout
    } else {
        match args.output {
            Some(path) => Output::File(cwd.join(path)),
            None => Output::File(project.default_output()),
        }
    };

    convert_project(&project, output)
}
