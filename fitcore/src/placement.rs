use crate::utils::*;

/// Where a process ended up. Offsets are relative to the region's start;
/// `offset_end` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placed {
    pub region:         RegionId,
    pub offset_start:   ByteSteps,
    pub offset_end:     ByteSteps,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Placed(Placed),
    Rejected,
}

/// One entry of a region's occupant list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub process:        ProcessId,
    pub offset_start:   ByteSteps,
    pub offset_end:     ByteSteps,
}

impl Occupant {
    #[inline]
    pub fn size(&self) -> ByteSteps {
        self.offset_end.saturating_sub(self.offset_start)
    }
}

/// The outcome of one policy run.
///
/// Two views are kept side by side: the per-process outcome (in arrival
/// order) and, per region, the occupants in placement order. Since nothing
/// is ever compacted, placement order is also offset order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementResult {
    pub policy: Policy,
    outcomes:   OutcomeMap,
    occupants:  Vec<Vec<Occupant>>,
}

impl PlacementResult {
    pub fn new(policy: Policy, num_regions: usize) -> Self {
        Self {
            policy,
            outcomes:   IndexMap::default(),
            occupants:  vec![vec![]; num_regions],
        }
    }

    pub(crate) fn record_placed(&mut self, p: &Process, placed: Placed) {
        assert!(self.outcomes.insert(p.id, Outcome::Placed(placed)).is_none());
        self.occupants[placed.region].push(Occupant {
            process:        p.id,
            offset_start:   placed.offset_start,
            offset_end:     placed.offset_end,
        });
    }

    pub(crate) fn record_rejected(&mut self, p: &Process) {
        assert!(self.outcomes.insert(p.id, Outcome::Rejected).is_none());
    }

    pub fn outcome(&self, id: ProcessId) -> Option<&Outcome> {
        self.outcomes.get(&id)
    }

    /// Every process with its outcome, in arrival order.
    pub fn outcomes(&self) -> impl Iterator<Item = (&ProcessId, &Outcome)> {
        self.outcomes.iter()
    }

    /// Occupants of `region`, in placement order.
    pub fn occupants(&self, region: RegionId) -> &[Occupant] {
        &self.occupants[region]
    }

    /// Occupant lists of all regions, by ascending region id.
    pub fn layout(&self) -> &[Vec<Occupant>] {
        &self.occupants
    }

    /// Ids of the rejected processes, in arrival order.
    pub fn rejected(&self) -> Vec<ProcessId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, Outcome::Rejected))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn num_placed(&self) -> usize {
        self.occupants.iter().map(|o| o.len()).sum()
    }

    pub fn num_rejected(&self) -> usize {
        self.outcomes.len() - self.num_placed()
    }

    pub fn stats(&self, input: &Allocator) -> RunStats {
        RunStats::new(input, &self.occupants, self.num_rejected())
    }

    /// Checks the result against the data it was computed from. An empty
    /// vector means the placement is sound.
    pub fn verify(&self, input: &Allocator) -> Vec<Violation> {
        verify_layout(input, &self.occupants, &self.rejected())
    }
}

/// Summary figures of a run, for reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub placed:         usize,
    pub rejected:       usize,
    pub bytes_placed:   ByteTotal,
    pub capacity:       ByteTotal,
    /// `bytes_placed / capacity`.
    pub utilization:    f64,
    /// Free bytes left in each region at the end of the run.
    pub free:           Vec<ByteSteps>,
}

impl RunStats {
    pub fn new(input: &Allocator, layout: &[Vec<Occupant>], rejected: usize) -> Self {
        let free: Vec<ByteSteps> = input.regions()
            .iter()
            .zip(layout)
            .map(|(r, occ)| {
                let used: ByteTotal = occ.iter().map(|o| o.size() as ByteTotal).sum();
                // Never more than the region's capacity, so it fits back.
                (r.capacity() as ByteTotal).saturating_sub(used) as ByteSteps
            })
            .collect();
        let capacity = input.total_capacity();
        let bytes_placed = capacity - free.iter().map(|f| *f as ByteTotal).sum::<ByteTotal>();

        Self {
            placed: layout.iter().map(|o| o.len()).sum(),
            rejected,
            bytes_placed,
            capacity,
            utilization: bytes_placed as f64 / capacity as f64,
            free,
        }
    }
}

/// A broken invariant found by [`verify_layout`].
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    #[error("layout has {found} regions, expected {expected}")]
    RegionCount { expected: usize, found: usize },
    #[error("region {region}: process {process} overlaps its predecessor (starts at {offset}, previous ends at {cursor})")]
    Overlap { region: RegionId, process: ProcessId, offset: ByteSteps, cursor: ByteSteps },
    #[error("region {region}: process {process} leaves a hole (starts at {offset}, previous ends at {cursor})")]
    Hole { region: RegionId, process: ProcessId, offset: ByteSteps, cursor: ByteSteps },
    #[error("region {region}: occupants need {used} bytes, capacity is {capacity}")]
    OverCapacity { region: RegionId, used: ByteSteps, capacity: ByteSteps },
    #[error("process {process} occupies {found} bytes, requested {expected}")]
    SizeMismatch { process: ProcessId, expected: ByteSteps, found: ByteSteps },
    #[error("process {0} is not part of the input")]
    UnknownProcess(ProcessId),
    #[error("process {0} is neither placed nor rejected")]
    Missing(ProcessId),
    #[error("process {process} appears {times} times")]
    Duplicate { process: ProcessId, times: usize },
}

/// Verifies conservation, non-overlap and completeness of a layout
/// (occupants per region, plus the rejection list) against its input.
///
/// Occupants must be packed from the front of their region in placement
/// order: each one starts exactly where the previous one ends.
pub fn verify_layout(
    input:      &Allocator,
    layout:     &[Vec<Occupant>],
    rejected:   &[ProcessId],
) -> Vec<Violation> {
    let mut res = vec![];
    let regions = input.regions();
    if layout.len() != regions.len() {
        res.push(Violation::RegionCount {
            expected:   regions.len(),
            found:      layout.len(),
        });
    }

    let sizes: IndexMap<ProcessId, ByteSteps, BuildHasherDefault<AHasher>> = input.processes()
        .iter()
        .map(|p| (p.id, p.size))
        .collect();
    let mut seen: IndexMap<ProcessId, usize, BuildHasherDefault<AHasher>> = IndexMap::default();
    for (r, occupants) in regions.iter().zip(layout) {
        let mut cursor = 0;
        for o in occupants {
            if o.offset_start < cursor {
                res.push(Violation::Overlap {
                    region:     r.id,
                    process:    o.process,
                    offset:     o.offset_start,
                    cursor,
                });
            } else if o.offset_start > cursor {
                res.push(Violation::Hole {
                    region:     r.id,
                    process:    o.process,
                    offset:     o.offset_start,
                    cursor,
                });
            }
            cursor = cursor.max(o.offset_end);
            match sizes.get(&o.process) {
                Some(&size) if size != o.size() => {
                    res.push(Violation::SizeMismatch {
                        process:    o.process,
                        expected:   size,
                        found:      o.size(),
                    });
                },
                Some(_) => {},
                None    => { res.push(Violation::UnknownProcess(o.process)); }
            }
            *seen.entry(o.process).or_default() += 1;
        }
        if cursor > r.capacity() {
            res.push(Violation::OverCapacity {
                region:     r.id,
                used:       cursor,
                capacity:   r.capacity(),
            });
        }
    }

    for id in rejected {
        if !sizes.contains_key(id) {
            res.push(Violation::UnknownProcess(*id));
        }
        *seen.entry(*id).or_default() += 1;
    }

    for p in input.processes() {
        match seen.get(&p.id) {
            None    => { res.push(Violation::Missing(p.id)); },
            Some(&times) if times > 1   => {
                res.push(Violation::Duplicate { process: p.id, times });
            },
            _   => {}
        }
    }

    res
}
