use anyhow::Result;
use clap::{Parser, Subcommand};
use proxy_rotator::{
    config::Config,
    proxy::{Candidate, Harvester, PoolController, TwoStageProbe, Validator},
};
use rand::seq::SliceRandom;
use std::path::PathBuf;

/// Rotating SOCKS5 proxy pool behind a local load-balancing endpoint
#[derive(Parser)]
#[command(name = "proxy-rotator")]
#[command(about = "Rotating SOCKS5 proxy pool behind a local load-balancing endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML); built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the local SOCKS5 listen port
    #[arg(long)]
    listen_port: Option<u16>,

    /// Override the interval between validation cycles, in seconds
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pool service until stopped
    Run,
    /// Harvest candidates once and print the unique set
    Fetch,
    /// Harvest and validate once, printing accepted proxies
    Validate {
        /// Read candidates from a file (one host:port per line) instead of
        /// harvesting
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Target number of valid proxies
        #[arg(long)]
        quota: Option<usize>,
        /// Number of candidates probed concurrently per round
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    proxy_rotator::init_logger();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = cli.listen_port {
        config.listen_port = port;
    }
    if let Some(secs) = cli.interval_secs {
        config.interval_secs = secs;
    }

    match cli.command {
        Some(Commands::Fetch) => {
            config.validate()?;
            let harvester = Harvester::new(&config)?;
            let (candidates, reports) = harvester.fetch_all().await;
            let sources_ok = reports.iter().filter(|r| r.is_success()).count();
            eprintln!(
                "{} unique candidates from {}/{} sources",
                candidates.len(),
                sources_ok,
                reports.len()
            );
            for candidate in &candidates {
                println!("{candidate}");
            }
        }
        Some(Commands::Validate {
            input,
            quota,
            batch_size,
        }) => {
            if let Some(quota) = quota {
                config.quota = quota;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.validate()?;

            let probe = TwoStageProbe::new(&config);
            let validator = Validator::from_config(&config);

            let mut sample: Vec<Candidate> = match &input {
                Some(path) => std::fs::read_to_string(path)?
                    .lines()
                    .filter_map(|line| line.trim().parse().ok())
                    .collect(),
                None => {
                    let harvester = Harvester::new(&config)?;
                    let (candidates, _) = harvester.fetch_all().await;
                    candidates.into_iter().collect()
                }
            };
            sample.shuffle(&mut rand::thread_rng());
            sample.truncate(config.sample_size);

            let accepted = validator.validate(&probe, sample).await;
            eprintln!("{} valid proxies", accepted.len());
            for proxy in &accepted {
                println!("{proxy}");
            }
        }
        Some(Commands::Run) | None => {
            config.validate()?;
            let mut controller = PoolController::new(config)?;
            controller.run().await;
        }
    }

    Ok(())
}
