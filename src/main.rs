use clap::Parser;
use miette::Result;
use vrt::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;

    match cli.command {
        Commands::Summary(args) => vrt::cli::commands::summary::run(args, &global),
        Commands::Attribute(args) => vrt::cli::commands::attribute::run(args, &global),
        Commands::Interval(args) => vrt::cli::commands::interval::run(args, &global),
        Commands::Eval(args) => vrt::cli::commands::eval::run(args, &global),
        Commands::Completions(args) => vrt::cli::commands::completions::run(args),
    }
}
