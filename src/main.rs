//! carport binary entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use mimalloc::MiMalloc;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use carport::commands;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// HTTP gateway for browsing and serving Filecoin chain snapshot archives.
#[derive(Parser)]
#[command(name = "carport", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway server in the foreground
    Serve {
        /// Path to carport.toml (default: $CARPORT_HOME/carport.toml)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Override the listen port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
        /// Override the listen address
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Validate and print the effective configuration
    Check {
        /// Path to carport.toml (default: $CARPORT_HOME/carport.toml)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CARPORT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, port, bind } => {
            commands::serve::execute(config.as_deref(), port, bind).await
        },
        Commands::Check { config } => commands::check::execute(config.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        },
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  Caused by: {cause}");
        }
        std::process::exit(1);
    }
}
