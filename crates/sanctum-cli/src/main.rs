use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sanctum", version, about = "Sanctum gift reveal, headless")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reveal and print every event as a JSON line
    Play(commands::play::PlayArgs),
    /// Render one cue and print its signal statistics
    Cue(commands::cue::CueArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print the resolved reveal schedule
    Schedule {
        /// Read this config file instead of the default one
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },
    /// Show the intensity level and message for a cheers count
    Intensity {
        count: u32,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
fn setup_logging(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SANCTUM_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Cue(args) => commands::cue::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Schedule { config } => commands::schedule::run(config),
        Commands::Intensity { count } => commands::intensity::run(count),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
