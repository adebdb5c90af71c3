//! Welcome to `fitcore`!
//!
//! A simulator for *fixed-partition* memory allocation. Given a static set of
//! memory [`Region`]s and a batch of [`Process`]es, `fitcore` reports where
//! each process lands (or whether it is rejected) under the three classical
//! placement policies: first-fit, best-fit and worst-fit.
//!
//! Nothing is ever freed during a run, processes are never reordered, and
//! each run starts from pristine regions. The three runs are therefore
//! independent and are executed in parallel (see [`Allocator::run_all`]).

mod elements;
pub mod utils;
pub mod config;
pub mod allocator;
pub mod algo;
pub mod placement;
pub mod io;

/// Imports, type aliases, errors ... in general
/// useful stuff that shall be needed in many places.
pub use crate::utils::*;

/// A fixed, non-resizable block of memory.
///
/// Regions are addressed by their [`id`](Region::id), which is simply their
/// 0-based position in the input snapshot. The snapshot also carries a
/// [`label`](Region::label) per region; it is kept for reporting only and
/// may repeat.
///
/// > ***ATTENTION:*** [`end`](Region::end) is *exclusive*. A region spanning
/// > `[10, 15)` has a capacity of 5 bytes, and its last addressable byte
/// > is 14.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id:     RegionId,
    pub label:  i64,
    pub start:  ByteSteps,
    pub end:    ByteSteps,
}

/// A fixed-size allocation request. It is placed at most once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Process {
    pub id:     ProcessId,
    pub size:   ByteSteps,
}

/// The immutable base dataset every policy run is replayed against.
///
/// An [`Allocator`] can only be obtained through [`Allocator::new`], which
/// validates its input. Policy runs borrow it immutably and build their own
/// disposable working state, so one [`Allocator`] can serve any number of
/// concurrent runs.
#[derive(Clone, Debug)]
pub struct Allocator {
    regions:    Vec<Region>,
    // Arrival order is input order, and it is never changed.
    processes:  Vec<Process>,
}
