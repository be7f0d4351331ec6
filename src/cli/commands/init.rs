//! `psvt init` command - project initialization

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::Project;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Reinitialize even if a project already exists here
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let project = Project::init(&cwd, args.force)?;

    println!(
        "{} Initialized PSV project in {}",
        style("✓").green(),
        project.root().display()
    );
    println!();
    println!("Next steps:");
    println!(
        "  {}   set up who may check and approve",
        style("psvt team init").yellow()
    );
    println!(
        "  {}  create the top of the hierarchy",
        style("psvt new customer --title \"Acme\"").yellow()
    );
    Ok(())
}
