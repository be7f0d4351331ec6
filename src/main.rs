use clap::Parser;
use miette::Result;
use psvt::cli::commands::{completions, entity, init, rev, status};
use psvt::cli::{Cli, Commands};
use psvt::core::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.log_level.as_deref());

    let global = cli.global;
    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::New(args) => entity::run_new(args, &global),
        Commands::List(args) => entity::run_list(args, &global),
        Commands::Show(args) => entity::run_show(args, &global),
        Commands::Status(args) => status::run_status(args),
        Commands::Advance(args) => status::run_advance(args),
        Commands::Transitions(args) => status::run_transitions(args, &global),
        Commands::Deactivate(args) => entity::run_deactivate(args),
        Commands::Activate(args) => entity::run_activate(args),
        Commands::Rev(cmd) => rev::run(cmd, &global),
        Commands::Team(cmd) => cmd.run(&global),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Logs go to stderr so piped output stays clean
fn init_tracing(cli_level: Option<&str>) {
    let directive = cli_level
        .map(str::to_string)
        .or_else(|| Config::load().log_level)
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
