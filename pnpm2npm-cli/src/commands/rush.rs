use super::{Output, convert_project};
use crate::console;
use crate::project::Project;
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct RushArgs {
    /// Print package-lock.json to stdout instead of writing it next to the Rush lockfile
    #[arg(long = "stdout")]
    pub stdout: bool,
}

pub fn run(args: RushArgs, cwd: &Path) -> Result<()> {
    console::header("rush");

    let project = Project::rush(cwd)?;
    let output = if args.stdout {
        Output::Stdout
    } else {
        Output::File(project.default_output())
    };

    convert_project(&project, output)
}
