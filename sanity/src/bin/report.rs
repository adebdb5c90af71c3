use sanity::*;
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// An utility for auditing and comparing
/// fixed-partition placement results.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arg {
    /// Path to the region snapshot the artifacts were computed from
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

    /// JSON artifacts to audit
    #[arg(required = true, value_parser = clap::value_parser!(PathBuf))]
    artifacts:  Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Arg::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_target(false)
        .init();

    let config = Config {
        memory:     cli.memory,
        processes:  cli.processes,
        combined:   cli.combined,
        ..Config::default()
    };
    let source = config.source();
    let input = load(source.as_ref())
        .with_context(|| format!("cannot load input snapshot {}", source.describe()))?;

    let mut rows = vec![];
    for path in cli.artifacts {
        let artifact = read_artifact(&path)
            .with_context(|| format!("cannot load artifact {}", path.display()))?;
        let findings = audit(&input, &artifact);
        for f in &findings {
            warn!("{}: {f}", path.display());
        }
        rows.push(Row { path, artifact, findings });
    }

    print!("{}", render_report(&rows));

    let problems: usize = rows.iter().map(|r| r.findings.len()).sum();
    if problems > 0 {
        let culprits = rows.iter()
            .filter(|r| !r.findings.is_empty())
            .map(|r| r.path.display().to_string())
            .join(", ");
        bail!("{problems} problem(s) found in {culprits}");
    }

    Ok(())
}
