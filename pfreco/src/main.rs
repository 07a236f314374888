use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pfreco::config::ProcessConfig;
use pfreco::error::RecoResult;
use pfreco::event::io::{read_events, write_records, EventRecord};
use pfreco::reco::process::Process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pfreco")]
#[command(about = "Particle-flow reconstruction of scoring-plane tracks and calorimeter clusters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct particle-flow candidates for every event of a JSON-lines file
    Run {
        /// Job configuration (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input events (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output events (JSON lines)
        #[arg(short, long)]
        output: PathBuf,

        /// Worker threads, overrides the configuration
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Print the default configuration
    DefaultConfig,
}

fn run(config: Option<PathBuf>, input: PathBuf, output: PathBuf, threads: Option<usize>) -> RecoResult<()> {
    let mut config = match config {
        Some(path) => ProcessConfig::from_path(&path)?,
        None => ProcessConfig::default(),
    };
    if let Some(n) = threads {
        config.num_threads = n;
    }

    let process = Process::new(&config)?;
    let events = read_events(BufReader::new(File::open(&input)?), &config.pass_name)?;
    tracing::info!("Read {} events from {:?}", events.len(), input);

    let (processed, _summary) = process.run(events)?;

    let records = processed
        .iter()
        .map(|event| {
            EventRecord::from_outputs(
                event,
                &config.track_selector.output_collection,
                &config.particle_flow.output_collection,
            )
        })
        .collect::<RecoResult<Vec<_>>>()?;
    write_records(BufWriter::new(File::create(&output)?), &records)?;
    tracing::info!("Wrote {} events to {:?}", records.len(), output);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, input, output, threads } => run(config, input, output, threads),
        Commands::DefaultConfig => ProcessConfig::default().to_json_pretty().map(|json| println!("{}", json)),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
