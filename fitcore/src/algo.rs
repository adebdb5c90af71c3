use crate::utils::*;
use crate::utils::myerrors::CapacityViolation;

/// The three placement policies. They share the same greedy scan and only
/// differ in which qualifying region they pick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Lowest-id region with enough free space
    First,
    /// Qualifying region with the least free space
    Best,
    /// Qualifying region with the most free space
    Worst,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::First, Policy::Best, Policy::Worst];

    /// Short tag used in artifact names.
    pub fn tag(&self) -> &'static str {
        match self {
            Policy::First   => "FF",
            Policy::Best    => "BF",
            Policy::Worst   => "WF",
        }
    }

    /// Decides whether a candidate's free space beats the incumbent's.
    /// Ties never win, so the earliest (lowest id) region is kept.
    #[inline]
    fn prefers(&self, candidate: ByteSteps, incumbent: ByteSteps) -> bool {
        match self {
            Policy::First   => false,
            Policy::Best    => candidate < incumbent,
            Policy::Worst   => candidate > incumbent,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::First   => write!(f, "first-fit"),
            Policy::Best    => write!(f, "best-fit"),
            Policy::Worst   => write!(f, "worst-fit"),
        }
    }
}

/// Per-run working copy of the regions: one free-space counter each,
/// indexed by [`RegionId`]. Regions fill from the front, so a region's
/// free space is always the contiguous tail after its last occupant.
///
/// An [`Arena`] is created at the start of a run and dropped at its end;
/// the [`Allocator`] it was built from is only ever read.
pub struct Arena<'a> {
    regions:    &'a [Region],
    free:       Vec<ByteSteps>,
}

impl<'a> Arena<'a> {
    pub fn new(regions: &'a [Region]) -> Self {
        Self {
            regions,
            free: regions.iter()
                .map(|r| r.capacity())
                .collect(),
        }
    }

    #[inline]
    pub fn free_space(&self, region: RegionId) -> ByteSteps {
        self.free[region]
    }

    /// One linear scan over all regions in ascending id. Returns the region
    /// `policy` picks for a `size`-byte process, or `None` if nothing fits.
    pub fn select(&self, size: ByteSteps, policy: Policy) -> Option<RegionId> {
        let mut chosen: Option<(RegionId, ByteSteps)> = None;
        for (id, &free) in self.free.iter().enumerate() {
            if size > free { continue; }
            match chosen {
                None    => {
                    chosen = Some((id, free));
                    if let Policy::First = policy { break; }
                },
                Some((_, incumbent))    => {
                    if policy.prefers(free, incumbent) {
                        chosen = Some((id, free));
                    }
                }
            }
        }

        chosen.map(|(id, _)| id)
    }

    /// Packs `process` right after the current occupants of `region`.
    ///
    /// Panics with a [`CapacityViolation`] if the region lacks the space;
    /// callers are expected to have gone through [`Arena::select`] first.
    pub fn commit(&mut self, region: RegionId, process: &Process) -> Placed {
        let free = self.free[region];
        if !process.fits_in(free) {
            panic!("{}", CapacityViolation {
                process:    process.id,
                size:       process.size,
                region,
                free,
            });
        }
        let offset_start = self.regions[region].capacity() - free;
        self.free[region] = free - process.size;

        Placed {
            region,
            offset_start,
            offset_end: offset_start + process.size,
        }
    }
}

/// Greedy, one-pass, commit-immediately: processes are visited in arrival
/// order, each gets exactly one scan of the regions, and a placement is
/// never reconsidered.
pub fn run(input: &Allocator, policy: Policy) -> PlacementResult {
    let start = Instant::now();
    let mut arena = Arena::new(input.regions());
    let mut res = PlacementResult::new(policy, input.regions().len());

    for p in input.processes() {
        match arena.select(p.size, policy) {
            Some(region)    => {
                let placed = arena.commit(region, p);
                debug!(
                    %policy,
                    process = p.id,
                    size = p.size,
                    region,
                    "placed at {}..{}",
                    placed.offset_start,
                    placed.offset_end
                );
                res.record_placed(p, placed);
            },
            None    => {
                debug!(%policy, process = p.id, size = p.size, "rejected");
                res.record_rejected(p);
            }
        }
    }

    debug_assert!(res.verify(input).is_empty(), "Invalid placement!");
    debug!(%policy, "run took {} μs", start.elapsed().as_micros());

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(regions: &[(i64, ByteSteps, ByteSteps)], procs: &[(ProcessId, ByteSteps)]) -> Allocator {
        Allocator::new(
            regions.iter().map(|&(l, s, e)| Region::new(l, s, e)).collect(),
            procs.iter().map(|&(id, size)| Process::new(id, size)).collect(),
        ).unwrap()
    }

    fn placed(res: &PlacementResult, id: ProcessId) -> Placed {
        match res.outcome(id) {
            Some(Outcome::Placed(p))    => *p,
            other   => panic!("process {id} not placed: {other:?}"),
        }
    }

    fn is_rejected(res: &PlacementResult, id: ProcessId) -> bool {
        matches!(res.outcome(id), Some(Outcome::Rejected))
    }

    #[test]
    fn scenario_a() {
        let a = allocator(&[(0, 0, 10), (1, 10, 15)], &[(1, 4), (2, 8), (3, 3)]);
        for policy in [Policy::First, Policy::Best] {
            let res = a.run_policy(policy);
            assert_eq!(placed(&res, 1), Placed { region: 0, offset_start: 0, offset_end: 4 });
            assert!(is_rejected(&res, 2));
            assert_eq!(placed(&res, 3), Placed { region: 0, offset_start: 4, offset_end: 7 });
            assert_eq!(res.rejected(), vec![2]);
        }
    }

    #[test]
    fn scenario_a_worst_fit() {
        let a = allocator(&[(0, 0, 10), (1, 10, 15)], &[(1, 4), (2, 8), (3, 3)]);
        let res = a.run_policy(Policy::Worst);
        assert_eq!(placed(&res, 1), Placed { region: 0, offset_start: 0, offset_end: 4 });
        assert!(is_rejected(&res, 2));
        // R0 has 6 left, R1 has 5: the roomier one wins.
        assert_eq!(placed(&res, 3), Placed { region: 0, offset_start: 4, offset_end: 7 });
    }

    #[test]
    fn scenario_b_boundary_fit() {
        let a = allocator(&[(0, 0, 5)], &[(1, 5)]);
        for policy in Policy::ALL {
            let res = a.run_policy(policy);
            assert_eq!(placed(&res, 1), Placed { region: 0, offset_start: 0, offset_end: 5 });
            assert!(res.rejected().is_empty());
        }
    }

    #[test]
    fn scenario_c_too_large() {
        let a = allocator(&[(0, 0, 3)], &[(1, 4)]);
        for policy in Policy::ALL {
            assert!(is_rejected(&a.run_policy(policy), 1), "{policy}");
        }
    }

    #[test]
    fn scenario_d_ties_go_to_lowest_id() {
        let a = allocator(&[(0, 0, 10), (1, 10, 20)], &[(1, 5)]);
        for policy in [Policy::Best, Policy::Worst] {
            assert_eq!(placed(&a.run_policy(policy), 1).region, 0, "{policy}");
        }
    }

    #[test]
    fn policies_diverge() {
        // Capacities 6, 3, 9.
        let a = allocator(&[(0, 0, 6), (1, 6, 9), (2, 9, 18)], &[(1, 3), (2, 2)]);

        let ff = a.run_policy(Policy::First);
        assert_eq!(placed(&ff, 1).region, 0);
        assert_eq!(placed(&ff, 2).region, 0);
        assert_eq!(placed(&ff, 2).offset_start, 3);

        let bf = a.run_policy(Policy::Best);
        // Exact fit in the 3-byte region.
        assert_eq!(placed(&bf, 1).region, 1);
        assert_eq!(placed(&bf, 2).region, 0);

        let wf = a.run_policy(Policy::Worst);
        assert_eq!(placed(&wf, 1).region, 2);
        // 6 left in both R0 and R2; lower id wins.
        assert_eq!(placed(&wf, 2).region, 0);
    }

    #[test]
    fn rejection_does_not_block_later_processes() {
        let a = allocator(&[(0, 0, 4)], &[(1, 3), (2, 2), (3, 1)]);
        let res = a.run_policy(Policy::First);
        assert!(is_rejected(&res, 2));
        assert_eq!(placed(&res, 3), Placed { region: 0, offset_start: 3, offset_end: 4 });
    }

    #[test]
    fn select_skips_full_regions() {
        let regions = vec![Region::new(0, 0, 2), Region::new(1, 2, 10)];
        let arena = Arena::new(&regions);
        assert_eq!(arena.select(3, Policy::First), Some(1));
        assert_eq!(arena.select(3, Policy::Best), Some(1));
        assert_eq!(arena.select(9, Policy::Worst), None);
    }

    #[test]
    fn commit_packs_from_the_front() {
        let regions = vec![Region::new(0, 100, 110)];
        let mut arena = Arena::new(&regions);
        let first = arena.commit(0, &Process::new(1, 4));
        let second = arena.commit(0, &Process::new(2, 6));
        assert_eq!((first.offset_start, first.offset_end), (0, 4));
        assert_eq!((second.offset_start, second.offset_end), (4, 10));
        assert_eq!(arena.free_space(0), 0);
    }

    #[test]
    #[should_panic(expected = "does not fit region 0")]
    fn commit_without_space_is_a_bug() {
        let regions = vec![Region::new(0, 0, 3)];
        let mut arena = Arena::new(&regions);
        arena.commit(0, &Process::new(1, 4));
    }

    #[test]
    fn runs_do_not_share_state() {
        let a = allocator(&[(0, 0, 5)], &[(1, 5)]);
        let first = a.run_policy(Policy::First);
        let again = a.run_policy(Policy::Best);
        // A leaked arena would have left no room for the second run.
        assert_eq!(placed(&first, 1), placed(&again, 1));
    }
}
