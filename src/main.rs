use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nmpc_replay::io::{telemetry, xplane};
use nmpc_replay::sim::{self, DriverConfig};

#[derive(Parser)]
#[command(name = "nmpc-replay")]
#[command(about = "Replay an X-Plane flight log through a receding-horizon controller")]
#[command(version)]
struct Cli {
    /// X-Plane `Data.txt` log; reads stdin when omitted
    input: Option<PathBuf>,

    /// Number of closed-loop steps to run
    #[arg(long, default_value_t = 500)]
    steps: usize,

    /// Print the converted reference trajectory and exit
    #[arg(long)]
    dump_reference: bool,
}

fn main() -> Result<()> {
    // Telemetry owns stdout; logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let (reader, source): (Box<dyn BufRead>, String) = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            (Box::new(BufReader::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdin().lock()), "<stdin>".to_string()),
    };

    let trajectory = xplane::read_trajectory(reader)
        .with_context(|| format!("failed to load flight log from {source}"))?;
    info!(
        source = %source,
        samples = trajectory.len(),
        duration = trajectory.duration(),
        "trajectory loaded"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.dump_reference {
        telemetry::write_reference(&mut out, &trajectory)?;
    } else {
        let config = DriverConfig { steps: cli.steps, ..DriverConfig::default() };
        sim::simulate(trajectory, config, &mut out).context("simulation aborted")?;
    }
    out.flush()?;
    Ok(())
}
