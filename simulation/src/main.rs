//! dvmesh simulator CLI

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dvmesh_simulation::scenarios;

#[derive(Parser)]
#[command(
    name = "dvmesh-sim",
    about = "Distance-vector routing simulator",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Routers in a line with a host on each end
    Line {
        /// Number of routers
        #[arg(short, long, default_value = "3")]
        routers: u32,
    },

    /// A triangle where the cheap detour beats the direct link
    Triangle,

    /// A seeded random mesh, converged and reported
    Random {
        /// Number of routers
        #[arg(short, long, default_value = "8")]
        routers: u32,

        /// Probability of each extra link beyond the spanning line
        #[arg(short, long, default_value = "0.3")]
        probability: f64,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// The line scenario with every node running as its own task
    Live {
        /// Number of routers
        #[arg(short, long, default_value = "3")]
        routers: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Line { routers } => scenarios::run_line(routers)?,
        Commands::Triangle => scenarios::run_triangle()?,
        Commands::Random {
            routers,
            probability,
            seed,
        } => scenarios::run_random(routers, probability, seed)?,
        Commands::Live { routers } => scenarios::run_live(routers).await?,
    }

    Ok(())
}
