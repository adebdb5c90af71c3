pub use std::{
    path::{Path, PathBuf},
    hash::BuildHasherDefault,
    time::Instant,
    fmt,
};
pub use thiserror::Error;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use indexmap::{IndexMap, IndexSet};
pub use ahash::AHasher;
pub use serde::{Deserialize, Serialize};
pub use clap::{Parser, ValueEnum};
pub use tracing::{debug, info, warn};

pub use crate::{Allocator, Process, Region,
    algo::*,
    config::*,
    io::*,
    placement::*,
};

/// The unit for measuring addresses, offsets and sizes.
///
/// Input snapshots are read as signed integers so that negative values can
/// be reported as malformed; anything that survives validation fits here.
pub type ByteSteps = usize;

/// Sums of [`ByteSteps`]. Regions may overlap and each one may span close
/// to `i64::MAX` bytes, so totals need the extra headroom.
pub type ByteTotal = u128;

/// A region's 0-based position in the input snapshot.
pub type RegionId = usize;

/// Externally supplied, unique within a snapshot.
pub type ProcessId = i64;

/// Process id to outcome, iterated in arrival order.
pub type OutcomeMap = IndexMap<ProcessId, Outcome, BuildHasherDefault<AHasher>>;
pub type IdSet = IndexSet<ProcessId, BuildHasherDefault<AHasher>>;

/// Which input stream a malformed record was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Regions,
    Processes,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Regions     => write!(f, "region snapshot"),
            Origin::Processes   => write!(f, "process snapshot"),
        }
    }
}

/// Everything that can go wrong before (or after) a simulation. Note that
/// a process not fitting anywhere is *not* an error: it is a regular
/// [`Outcome::Rejected`].
#[derive(Error, Debug)]
pub enum SimError {
    #[error("cannot read {}: {source}", path.display())]
    InputUnavailable {
        path:   PathBuf,
        source: std::io::Error,
    },
    /// `record` 0 refers to the leading count of a stream; records
    /// are numbered from 1 after it.
    #[error("malformed {origin}, record {record}, field `{field}`: {reason}")]
    MalformedInput {
        origin: Origin,
        record: usize,
        field:  &'static str,
        reason: String,
    },
    #[error("cannot write {}: {source}", path.display())]
    OutputUnavailable {
        path:   PathBuf,
        source: std::io::Error,
    },
    #[error("cannot encode artifact: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl SimError {
    pub fn malformed(
        origin: Origin,
        record: usize,
        field:  &'static str,
        reason: impl Into<String>,
    ) -> Self {
        SimError::MalformedInput {
            origin,
            record,
            field,
            reason: reason.into(),
        }
    }
}

pub mod myerrors {
    use super::*;

    /// Raised when a policy tries to commit a process into a region that
    /// cannot hold it. The policies only commit after checking the fit, so
    /// seeing this means the scan itself is broken. It is used as a panic
    /// payload, never returned.
    #[derive(Error, Debug)]
    #[error("process {process} ({size} bytes) does not fit region {region} ({free} bytes free)")]
    pub struct CapacityViolation {
        pub process:    ProcessId,
        pub size:       ByteSteps,
        pub region:     RegionId,
        pub free:       ByteSteps,
    }
}
