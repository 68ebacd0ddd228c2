use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "voidpen", version, about = "voidpen focus-writing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Drive a session from a JSON script and print its events
    Replay(commands::replay::ReplayArgs),
    /// Count the words in a file or stdin
    Count(commands::count::CountArgs),
}

fn main() {
    // Logs go to stderr so JSON on stdout stays machine-readable.
    let filter = EnvFilter::try_from_env("VOIDPEN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Replay(args) => commands::replay::run(args),
        Commands::Count(args) => commands::count::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
