use crate::utils::*;

//---START INPUT
/// Whitespace-separated integers, the way the snapshots have always been
/// written: line breaks carry no meaning, but each token remembers its line
/// so that errors can point at it.
pub struct TokenStream {
    origin: Origin,
    tokens: Vec<(usize, String)>,
    pos:    usize,
}

impl TokenStream {
    pub fn new(origin: Origin, text: &str) -> Self {
        let tokens = text.lines()
            .enumerate()
            .flat_map(|(n, l)| {
                l.split_whitespace()
                    .map(move |t| (n + 1, t.to_string()))
            })
            .collect();

        Self {
            origin,
            tokens,
            pos: 0,
        }
    }

    /// Errors raised from now on are attributed to `origin`.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    fn next_int(&mut self, record: usize, field: &'static str) -> Result<i64, SimError> {
        let res = match self.tokens.get(self.pos) {
            None    => {
                return Err(SimError::malformed(self.origin, record, field, "unexpected end of input"));
            },
            Some((line, tok))   => {
                tok.parse::<i64>()
                    .map_err(|_| {
                        SimError::malformed(
                            self.origin,
                            record,
                            field,
                            format!("line {line}: `{tok}` is not an integer"),
                        )
                    })
            }
        };
        self.pos += 1;

        res
    }

    fn next_bytes(&mut self, record: usize, field: &'static str) -> Result<ByteSteps, SimError> {
        let v = self.next_int(record, field)?;
        ByteSteps::try_from(v)
            .map_err(|_| SimError::malformed(self.origin, record, field, format!("{v} is negative")))
    }

    fn next_count(&mut self) -> Result<usize, SimError> {
        self.next_bytes(0, "count")
    }
}

/// Region stream: a count, then as many `(label, start, end)` triples.
pub fn parse_regions(ts: &mut TokenStream) -> Result<Vec<Region>, SimError> {
    ts.set_origin(Origin::Regions);
    let count = ts.next_count()?;
    let mut res = vec![];
    for record in 1..=count {
        let label = ts.next_int(record, "id")?;
        let start = ts.next_bytes(record, "start")?;
        let end = ts.next_bytes(record, "end")?;
        res.push(Region::new(label, start, end));
    }

    Ok(res)
}

/// Process stream: a count, then as many `(id, size)` pairs.
pub fn parse_processes(ts: &mut TokenStream) -> Result<Vec<Process>, SimError> {
    ts.set_origin(Origin::Processes);
    let count = ts.next_count()?;
    let mut res = vec![];
    for record in 1..=count {
        let id = ts.next_int(record, "id")?;
        let size = ts.next_bytes(record, "size")?;
        if size == 0 {
            return Err(SimError::malformed(Origin::Processes, record, "size", "size must be positive"));
        }
        res.push(Process::new(id, size));
    }

    Ok(res)
}

fn read_text(path: &Path) -> Result<String, SimError> {
    std::fs::read_to_string(path)
        .map_err(|source| SimError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

fn warn_leftovers(ts: &TokenStream, path: &Path) {
    if !ts.is_exhausted() {
        warn!("ignoring {} trailing token(s) in {}", ts.remaining(), path.display());
    }
}

/// Defines the interface for obtaining the two input snapshots.
///
/// Two implementations ship with the crate: [`SplitSnapshot`] reads regions
/// and processes from separate files, [`CombinedSnapshot`] from a single one.
/// Other sources only need to implement this trait.
pub trait SnapshotSource {
    /// Either both streams are successfully read, or the first error is
    /// returned. No partial snapshot is ever handed out.
    fn read_snapshot(&self) -> Result<(Vec<Region>, Vec<Process>), SimError>;
    fn describe(&self) -> String;
}

pub struct SplitSnapshot {
    pub memory:     PathBuf,
    pub processes:  PathBuf,
}

impl SplitSnapshot {
    pub fn new(memory: PathBuf, processes: PathBuf) -> Self {
        Self { memory, processes }
    }
}

impl SnapshotSource for SplitSnapshot {
    fn read_snapshot(&self) -> Result<(Vec<Region>, Vec<Process>), SimError> {
        // Both inputs must be readable before anything is parsed.
        let memory = read_text(&self.memory)?;
        let processes = read_text(&self.processes)?;

        let mut ts = TokenStream::new(Origin::Regions, &memory);
        let regions = parse_regions(&mut ts)?;
        warn_leftovers(&ts, &self.memory);

        let mut ts = TokenStream::new(Origin::Processes, &processes);
        let procs = parse_processes(&mut ts)?;
        warn_leftovers(&ts, &self.processes);

        Ok((regions, procs))
    }

    fn describe(&self) -> String {
        format!("{} + {}", self.memory.display(), self.processes.display())
    }
}

/// A single file holding the region stream immediately followed by the
/// process stream.
pub struct CombinedSnapshot {
    pub path: PathBuf,
}

impl CombinedSnapshot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotSource for CombinedSnapshot {
    fn read_snapshot(&self) -> Result<(Vec<Region>, Vec<Process>), SimError> {
        let text = read_text(&self.path)?;
        let mut ts = TokenStream::new(Origin::Regions, &text);
        let regions = parse_regions(&mut ts)?;
        let procs = parse_processes(&mut ts)?;
        warn_leftovers(&ts, &self.path);

        Ok((regions, procs))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a snapshot and validates it into an [`Allocator`].
pub fn load(src: &dyn SnapshotSource) -> Result<Allocator, SimError> {
    let (regions, processes) = src.read_snapshot()?;
    Allocator::new(regions, processes)
}
//---END INPUT

//---START OUTPUT
/// The plain-text result layout: one `start    end    pid` line per
/// occupant, with *absolute* addresses, regions in ascending id and
/// occupants in placement order. A closing line starts with `-` and lists
/// each rejected id followed by a comma, or reads `-0` if nothing was
/// rejected.
pub fn render_text(input: &Allocator, result: &PlacementResult) -> String {
    let mut res = String::new();
    for (r, occupants) in input.regions().iter().zip(result.layout()) {
        for o in occupants {
            res.push_str(&format!(
                "{}    {}    {}\n",
                r.address_of(o.offset_start),
                r.address_of(o.offset_end),
                o.process
            ));
        }
    }
    let rejected = result.rejected();
    res.push('-');
    if rejected.is_empty() {
        res.push('0');
    }
    for id in rejected {
        res.push_str(&format!("{id},"));
    }
    res.push('\n');

    res
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantEntry {
    pub process:        ProcessId,
    pub offset_start:   ByteSteps,
    pub offset_end:     ByteSteps,
    pub addr_start:     ByteSteps,
    pub addr_end:       ByteSteps,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub id:         RegionId,
    pub label:      i64,
    pub start:      ByteSteps,
    pub end:        ByteSteps,
    pub occupants:  Vec<OccupantEntry>,
}

/// The machine-readable result of one policy run, as written to
/// `<TAG>output.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub policy:     Policy,
    pub regions:    Vec<RegionEntry>,
    pub rejected:   Vec<ProcessId>,
    pub stats:      RunStats,
}

impl Artifact {
    pub fn new(input: &Allocator, result: &PlacementResult) -> Self {
        let regions = input.regions()
            .iter()
            .zip(result.layout())
            .map(|(r, occupants)| RegionEntry {
                id:         r.id,
                label:      r.label,
                start:      r.start,
                end:        r.end,
                occupants:  occupants.iter()
                    .map(|o| OccupantEntry {
                        process:        o.process,
                        offset_start:   o.offset_start,
                        offset_end:     o.offset_end,
                        addr_start:     r.address_of(o.offset_start),
                        addr_end:       r.address_of(o.offset_end),
                    })
                    .collect(),
            })
            .collect();

        Self {
            policy:     result.policy,
            regions,
            rejected:   result.rejected(),
            stats:      result.stats(input),
        }
    }

    /// Occupant lists per region, in the shape [`verify_layout`] expects.
    pub fn layout(&self) -> Vec<Vec<Occupant>> {
        self.regions
            .iter()
            .map(|r| {
                r.occupants
                    .iter()
                    .map(|o| Occupant {
                        process:        o.process,
                        offset_start:   o.offset_start,
                        offset_end:     o.offset_end,
                    })
                    .collect()
            })
            .collect()
    }
}

pub fn render_json(input: &Allocator, result: &PlacementResult) -> Result<String, SimError> {
    Ok(serde_json::to_string_pretty(&Artifact::new(input, result))?)
}

pub fn parse_artifact(text: &str) -> Result<Artifact, SimError> {
    Ok(serde_json::from_str(text)?)
}

/// Writes one text artifact (and optionally one JSON artifact) per result
/// into the configured output directory. Everything is rendered before the
/// first file is touched. Returns the paths written.
pub fn write_artifacts(
    config:     &Config,
    input:      &Allocator,
    results:    &[PlacementResult],
) -> Result<Vec<PathBuf>, SimError> {
    let mut rendered = vec![];
    for res in results {
        rendered.push((config.text_artifact(res.policy), render_text(input, res)));
        if config.json {
            rendered.push((config.json_artifact(res.policy), render_json(input, res)?));
        }
    }

    std::fs::create_dir_all(&config.out_dir)
        .map_err(|source| SimError::OutputUnavailable {
            path: config.out_dir.clone(),
            source,
        })?;
    let mut written = vec![];
    for (path, contents) in rendered {
        std::fs::write(&path, contents)
            .map_err(|source| SimError::OutputUnavailable {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }

    Ok(written)
}
//---END OUTPUT
