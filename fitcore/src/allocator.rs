use crate::utils::*;

impl Allocator {
    /// Builds the base dataset out of a region and a process snapshot.
    /// A successfully returned [`Allocator`] is guaranteed to satisfy:
    /// - there is at least one region and at least one process
    /// - every region has `end > start`
    /// - every process has a non-zero size
    /// - process ids are unique
    ///
    /// Region labels may repeat; each region's id is overwritten with its
    /// position, which is all the policies care about.
    ///
    /// This function is the gatekeeper to the rest of the library.
    pub fn new(
        mut regions:    Vec<Region>,
        processes:      Vec<Process>,
    ) -> Result<Self, SimError> {
        if regions.is_empty() {
            return Err(SimError::malformed(Origin::Regions, 0, "count", "no regions given"));
        }
        if processes.is_empty() {
            return Err(SimError::malformed(Origin::Processes, 0, "count", "no processes given"));
        }

        for (idx, r) in regions.iter_mut().enumerate() {
            if r.end <= r.start {
                return Err(SimError::malformed(
                    Origin::Regions,
                    idx + 1,
                    "end",
                    format!("end ({}) must exceed start ({})", r.end, r.start),
                ));
            }
            r.id = idx;
        }

        let mut seen = IdSet::default();
        for (idx, p) in processes.iter().enumerate() {
            if p.size == 0 {
                return Err(SimError::malformed(
                    Origin::Processes,
                    idx + 1,
                    "size",
                    format!("process {} has zero size", p.id),
                ));
            }
            if let Some(first) = seen.get_index_of(&p.id) {
                return Err(SimError::malformed(
                    Origin::Processes,
                    idx + 1,
                    "id",
                    format!("process id {} already used by record {}", p.id, first + 1),
                ));
            }
            seen.insert(p.id);
        }

        Ok(Self { regions, processes })
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// In arrival order.
    #[inline]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn total_capacity(&self) -> ByteTotal {
        self.regions
            .iter()
            .map(|r| r.capacity() as ByteTotal)
            .sum()
    }

    /// Total demand of the batch, placed or not.
    pub fn total_demand(&self) -> ByteTotal {
        self.processes
            .iter()
            .map(|p| p.size as ByteTotal)
            .sum()
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes
            .iter()
            .find(|p| p.id == id)
    }

    /// Simulates one policy. The allocator itself is left untouched; all
    /// bookkeeping happens in a working copy dropped at the end of the run.
    pub fn run_policy(&self, policy: Policy) -> PlacementResult {
        crate::algo::run(self, policy)
    }

    /// Simulates several policies concurrently. Results come back in the
    /// order the policies were given.
    pub fn run_all(&self, policies: &[Policy]) -> Vec<PlacementResult> {
        policies
            .par_iter()
            .map(|p| self.run_policy(*p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<Region> {
        vec![Region::new(0, 0, 10), Region::new(1, 10, 15)]
    }

    fn malformed_at(e: SimError) -> (Origin, usize, &'static str) {
        match e {
            SimError::MalformedInput { origin, record, field, .. } => (origin, record, field),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stamps_positional_ids() {
        let regions = vec![
            Region::new(4, 0, 1),
            Region::new(4, 1, 2),
            Region::new(9, 2, 3),
        ];
        let a = Allocator::new(regions, vec![Process::new(1, 1)]).unwrap();
        let ids: Vec<RegionId> = a.regions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        // Duplicate labels are tolerated.
        assert_eq!(a.regions()[0].label, a.regions()[1].label);
    }

    #[test]
    fn rejects_empty_inputs() {
        let e = Allocator::new(vec![], vec![Process::new(1, 1)]).unwrap_err();
        assert_eq!(malformed_at(e), (Origin::Regions, 0, "count"));
        let e = Allocator::new(regions(), vec![]).unwrap_err();
        assert_eq!(malformed_at(e), (Origin::Processes, 0, "count"));
    }

    #[test]
    fn rejects_inverted_or_empty_region() {
        let e = Allocator::new(
            vec![Region::new(0, 0, 4), Region::new(1, 4, 4)],
            vec![Process::new(1, 1)],
        ).unwrap_err();
        assert_eq!(malformed_at(e), (Origin::Regions, 2, "end"));
        let e = Allocator::new(vec![Region::new(0, 8, 2)], vec![Process::new(1, 1)]).unwrap_err();
        assert_eq!(malformed_at(e), (Origin::Regions, 1, "end"));
    }

    #[test]
    fn rejects_zero_size() {
        let e = Allocator::new(
            regions(),
            vec![Process::new(1, 3), Process::new(2, 0)],
        ).unwrap_err();
        assert_eq!(malformed_at(e), (Origin::Processes, 2, "size"));
    }

    #[test]
    fn rejects_duplicate_process_ids() {
        let e = Allocator::new(
            regions(),
            vec![Process::new(1, 3), Process::new(2, 1), Process::new(1, 2)],
        ).unwrap_err();
        let msg = e.to_string();
        assert_eq!(malformed_at(e), (Origin::Processes, 3, "id"));
        assert!(msg.contains("record 1"), "{msg}");
    }

    #[test]
    fn totals() {
        let a = Allocator::new(
            regions(),
            vec![Process::new(1, 4), Process::new(2, 8)],
        ).unwrap();
        assert_eq!(a.total_capacity(), 15);
        assert_eq!(a.total_demand(), 12);
        assert_eq!(a.process(2), Some(&Process::new(2, 8)));
        assert_eq!(a.process(3), None);
    }

    #[test]
    fn totals_of_huge_regions() {
        let big = i64::MAX as ByteSteps;
        let a = Allocator::new(
            (0..3).map(|i| Region::new(i, 0, big)).collect(),
            (1..=3).map(|i| Process::new(i, big)).collect(),
        ).unwrap();
        assert_eq!(a.total_capacity(), 3 * big as ByteTotal);
        assert_eq!(a.total_demand(), 3 * big as ByteTotal);
    }

    #[test]
    fn run_all_keeps_policy_order() {
        let a = Allocator::new(regions(), vec![Process::new(1, 4)]).unwrap();
        let res = a.run_all(&[Policy::Worst, Policy::First]);
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].policy, Policy::Worst);
        assert_eq!(res[1].policy, Policy::First);
    }
}
