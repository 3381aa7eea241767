use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use lcag::cli::{Cli, Commands};

/// Install the log subscriber: `LCAG_LOG`, then `RUST_LOG`, then `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "lcag=debug" } else { "lcag=warn" };
    let filter = EnvFilter::try_from_env("LCAG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;
    init_tracing(global.verbose);

    match cli.command {
        Commands::WhereUsed(args) => lcag::cli::commands::where_used::run(args, &global),
        Commands::Usage(args) => lcag::cli::commands::usage::run(args, &global),
        Commands::Params(args) => lcag::cli::commands::params::run(args, &global),
        Commands::Duplicate(args) => lcag::cli::commands::duplicate::run(args, &global),
        Commands::Completions(args) => lcag::cli::commands::completions::run(args),
    }
}
