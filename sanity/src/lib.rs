//! Post-hoc checks for `fitcore` result artifacts.
//!
//! An artifact is trusted only as far as it agrees with (i) the invariants
//! every placement must satisfy, (ii) the input snapshot it claims to
//! describe, and (iii) a fresh replay of the policy it names.

pub use fitcore::*;
use itertools::Itertools;

/// Anything wrong with an artifact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Finding {
    #[error(transparent)]
    Layout(#[from] Violation),
    #[error("region {region}: recorded as [{start}, {end}), snapshot says [{expected_start}, {expected_end})")]
    RegionBounds {
        region:         RegionId,
        start:          ByteSteps,
        end:            ByteSteps,
        expected_start: ByteSteps,
        expected_end:   ByteSteps,
    },
    #[error("process {0}: absolute addresses disagree with its offsets")]
    Addresses(ProcessId),
    #[error("replaying {0} yields a different placement")]
    Replay(Policy),
    #[error("recorded statistics disagree with the layout")]
    Stats,
}

pub fn read_artifact(path: &Path) -> Result<Artifact, SimError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| SimError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    parse_artifact(&text)
}

pub fn audit(input: &Allocator, artifact: &Artifact) -> Vec<Finding> {
    let layout = artifact.layout();
    let mut res: Vec<Finding> = verify_layout(input, &layout, &artifact.rejected)
        .into_iter()
        .map(Finding::from)
        .collect();

    for (r, entry) in input.regions().iter().zip(&artifact.regions) {
        if (r.start, r.end) != (entry.start, entry.end) {
            res.push(Finding::RegionBounds {
                region:         r.id,
                start:          entry.start,
                end:            entry.end,
                expected_start: r.start,
                expected_end:   r.end,
            });
        }
        for o in &entry.occupants {
            if o.addr_start != r.address_of(o.offset_start) || o.addr_end != r.address_of(o.offset_end) {
                res.push(Finding::Addresses(o.process));
            }
        }
    }

    let replay = input.run_policy(artifact.policy);
    if replay.layout() != layout.as_slice() || replay.rejected() != artifact.rejected {
        res.push(Finding::Replay(artifact.policy));
    }

    if !stats_agree(&artifact.stats, &RunStats::new(input, &layout, artifact.rejected.len())) {
        res.push(Finding::Stats);
    }

    res
}

// Utilization went through a JSON round trip, so it only has to be close.
fn stats_agree(recorded: &RunStats, computed: &RunStats) -> bool {
    recorded.placed == computed.placed
        && recorded.rejected == computed.rejected
        && recorded.bytes_placed == computed.bytes_placed
        && recorded.capacity == computed.capacity
        && recorded.free == computed.free
        && (recorded.utilization - computed.utilization).abs() < 1e-9
}

/// One audited artifact.
pub struct Row {
    pub path:       PathBuf,
    pub artifact:   Artifact,
    pub findings:   Vec<Finding>,
}

/// A side-by-side table of the audited runs.
pub fn render_report(rows: &[Row]) -> String {
    let mut res = format!(
        "{:<10} {:>8} {:>8} {:>12} {:>12} {:>8}  {}\n",
        "policy", "placed", "rejected", "bytes", "capacity", "util%", "status"
    );
    for row in rows {
        let s = &row.artifact.stats;
        let status = if row.findings.is_empty() {
            String::from("ok")
        } else {
            format!("{} problem(s)", row.findings.len())
        };
        res.push_str(&format!(
            "{:<10} {:>8} {:>8} {:>12} {:>12} {:>8.2}  {}\n",
            row.artifact.policy.to_string(),
            s.placed,
            s.rejected,
            s.bytes_placed,
            s.capacity,
            s.utilization * 100.0,
            status
        ));
    }
    let rejected_by = rows.iter()
        .map(|r| format!("{}: [{}]", r.artifact.policy, r.artifact.rejected.iter().join(", ")))
        .join("; ");
    res.push_str(&format!("rejected -> {rejected_by}\n"));

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Allocator {
        Allocator::new(
            vec![Region::new(0, 0, 10), Region::new(1, 10, 15)],
            vec![Process::new(1, 4), Process::new(2, 8), Process::new(3, 3)],
        ).unwrap()
    }

    #[test]
    fn honest_artifacts_pass() {
        let a = input();
        for policy in Policy::ALL {
            let artifact = Artifact::new(&a, &a.run_policy(policy));
            assert!(audit(&a, &artifact).is_empty(), "{policy}");
        }
    }

    #[test]
    fn json_round_trip_passes() {
        let dir = tempfile::tempdir().unwrap();
        let a = input();
        let path = dir.path().join("BFoutput.json");
        std::fs::write(&path, render_json(&a, &a.run_policy(Policy::Best)).unwrap()).unwrap();
        let artifact = read_artifact(&path).unwrap();
        assert!(audit(&a, &artifact).is_empty());
    }

    #[test]
    fn huge_totals_survive_json() {
        let big = i64::MAX as ByteSteps;
        let a = Allocator::new(
            (0..3).map(|i| Region::new(i, 0, big)).collect(),
            (1..=3).map(|i| Process::new(i, big)).collect(),
        ).unwrap();
        let json = render_json(&a, &a.run_policy(Policy::Worst)).unwrap();
        let artifact = parse_artifact(&json).unwrap();
        assert_eq!(artifact.stats.capacity, 3 * big as ByteTotal);
        assert!(audit(&a, &artifact).is_empty());
    }

    #[test]
    fn missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_artifact(&dir.path().join("WFoutput.json")),
            Err(SimError::InputUnavailable { .. })
        ));
    }

    #[test]
    fn mislabelled_policy_is_caught() {
        let a = Allocator::new(
            vec![Region::new(0, 0, 6), Region::new(1, 6, 9)],
            vec![Process::new(1, 3)],
        ).unwrap();
        let mut artifact = Artifact::new(&a, &a.run_policy(Policy::Best));
        artifact.policy = Policy::First;
        assert_eq!(audit(&a, &artifact), vec![Finding::Replay(Policy::First)]);
    }

    #[test]
    fn tampering_is_caught() {
        let a = input();
        let mut artifact = Artifact::new(&a, &a.run_policy(Policy::First));
        // Move process 3 two bytes down, on top of process 1.
        let o = &mut artifact.regions[0].occupants[1];
        o.offset_start -= 2;
        o.offset_end -= 2;
        artifact.regions[1].end = 16;
        let found = audit(&a, &artifact);
        assert!(found.contains(&Finding::Layout(Violation::Overlap {
            region: 0,
            process: 3,
            offset: 2,
            cursor: 4,
        })));
        assert!(found.contains(&Finding::Addresses(3)));
        assert!(found.contains(&Finding::Replay(Policy::First)));
        assert!(found.iter().any(|f| matches!(f, Finding::RegionBounds { region: 1, .. })));
    }

    #[test]
    fn report_lists_every_run() {
        let a = input();
        let rows: Vec<Row> = Policy::ALL
            .iter()
            .map(|p| Row {
                path:       PathBuf::from(format!("{}output.json", p.tag())),
                artifact:   Artifact::new(&a, &a.run_policy(*p)),
                findings:   vec![],
            })
            .collect();
        let report = render_report(&rows);
        assert_eq!(report.lines().count(), 5);
        assert!(report.contains("worst-fit"));
        assert!(report.contains("first-fit: [2]"));
    }
}
