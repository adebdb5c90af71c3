use fitcore::*;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// A fixed-partition memory placement simulator
/// (first, best and worst fit)
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the region snapshot
    #[arg(short, long, default_value = DEFAULT_MEMORY_INPUT)]
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    memory:     PathBuf,

    /// Path to the process snapshot
    #[arg(short, long, default_value = DEFAULT_PROCESS_INPUT)]
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    processes:  PathBuf,

    /// Read processes from the tail of the region snapshot
    #[arg(long)]
    combined:   bool,

    /// Directory receiving the result artifacts
    #[arg(short, long, default_value = ".")]
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    out_dir:    PathBuf,

    /// Also write JSON artifacts
    #[arg(long)]
    json:       bool,

    /// Policy to run; repeat for several (default: all three)
    #[arg(long, value_enum)]
    policy:     Vec<Policy>,

    /// Suppress progress messages
    #[arg(short, long, short_alias = 's')]
    quiet:      bool,

    /// Log every placement decision (overrides --quiet)
    #[arg(short, long)]
    debug:      bool,
}

impl From<Args> for Config {
    fn from(a: Args) -> Self {
        Self {
            memory:     a.memory,
            processes:  a.processes,
            combined:   a.combined,
            out_dir:    a.out_dir,
            json:       a.json,
            policies:   a.policy,
            verbosity:  Verbosity::from_flags(a.quiet, a.debug),
        }
    }
}

fn main() -> Result<()> {
    let config: Config = Args::parse().into();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter()))
        )
        .with_target(false)
        .init();

    let source = config.source();
    let input = load(source.as_ref())
        .with_context(|| format!("cannot load input snapshot {}", source.describe()))?;
    info!(
        "{} regions ({} bytes), {} processes ({} bytes requested)",
        input.regions().len(),
        input.total_capacity(),
        input.processes().len(),
        input.total_demand()
    );

    let total = Instant::now();
    let results = input.run_all(&config.policies());
    info!("all runs took {} μs", total.elapsed().as_micros());

    for res in &results {
        let stats = res.stats(&input);
        info!(
            "{}: {} placed, {} rejected, {}/{} bytes used ({:.2}%)",
            res.policy,
            stats.placed,
            stats.rejected,
            stats.bytes_placed,
            stats.capacity,
            stats.utilization * 100.0
        );
    }

    let written = write_artifacts(&config, &input, &results)
        .context("cannot write result artifacts")?;
    for path in written {
        debug!("wrote {}", path.display());
    }

    Ok(())
}
