use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "breachsim")]
#[command(about = "Breachsim - red vs blue agent simulation console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mission and follow it in the terminal
    Run {
        /// Mission identifier sent to the game service
        #[arg(long, default_value = "NETWORK_FLOOD")]
        mission: String,
        /// HTTP(S) base of the game service (overrides BREACHSIM_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
        /// Skip the live service entirely and run the local simulator
        #[arg(long)]
        mock: bool,
        /// Approve every proposal without prompting
        #[arg(long)]
        auto_approve: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            mission,
            base_url,
            mock,
            auto_approve,
        } => commands::run::execute(mission, base_url, mock, auto_approve).await?,
    }

    Ok(())
}
