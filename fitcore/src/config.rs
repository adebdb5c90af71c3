use crate::utils::*;

pub const DEFAULT_MEMORY_INPUT: &str = "Minput.data";
pub const DEFAULT_PROCESS_INPUT: &str = "Pinput.data";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// Debug mode overrides quiet mode.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter directive, used unless `RUST_LOG` is set.
    pub fn filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet    => "warn",
            Verbosity::Normal   => "info",
            Verbosity::Debug    => "debug",
        }
    }
}

/// Everything a simulation session needs to know, decoupled from how it was
/// gathered (see the `mallocator` binary for the command-line front).
#[derive(Clone, Debug)]
pub struct Config {
    pub memory:     PathBuf,
    pub processes:  PathBuf,
    /// Read the process stream from the tail of `memory`.
    pub combined:   bool,
    pub out_dir:    PathBuf,
    pub json:       bool,
    pub policies:   Vec<Policy>,
    pub verbosity:  Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory:     PathBuf::from(DEFAULT_MEMORY_INPUT),
            processes:  PathBuf::from(DEFAULT_PROCESS_INPUT),
            combined:   false,
            out_dir:    PathBuf::from("."),
            json:       false,
            policies:   Policy::ALL.to_vec(),
            verbosity:  Verbosity::Normal,
        }
    }
}

impl Config {
    /// Policies to run, deduplicated, in first/best/worst order.
    /// An empty selection means all of them.
    pub fn policies(&self) -> Vec<Policy> {
        if self.policies.is_empty() {
            Policy::ALL.to_vec()
        } else {
            self.policies
                .iter()
                .copied()
                .sorted()
                .dedup()
                .collect()
        }
    }

    /// Picks the snapshot reader. Pointing both paths to the same file
    /// is the same as asking for a combined snapshot.
    pub fn source(&self) -> Box<dyn SnapshotSource> {
        if self.combined || self.memory == self.processes {
            Box::new(CombinedSnapshot::new(self.memory.clone()))
        } else {
            Box::new(SplitSnapshot::new(self.memory.clone(), self.processes.clone()))
        }
    }

    pub fn text_artifact(&self, policy: Policy) -> PathBuf {
        self.out_dir.join(format!("{}output.data", policy.tag()))
    }

    pub fn json_artifact(&self, policy: Policy) -> PathBuf {
        self.out_dir.join(format!("{}output.json", policy.tag()))
    }
}
