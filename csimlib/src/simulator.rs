use std::fmt;
use std::time::{Duration, Instant};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::cache::CacheStore;
use crate::config::{CacheGeometry, GeometryError};
use crate::trace::{AccessRecord, TraceError};

/// Anything which can stop a simulation run
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid cache geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("invalid trace: {0}")]
    Trace(#[from] TraceError),
}

/// The result of a cache simulation. Can be serialised as JSON, and displays in the classic
/// `hits:H misses:M evictions:E` summary format
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationResult {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits:{} misses:{} evictions:{}", self.hits, self.misses, self.evictions)
    }
}

/// What happened on a single cache access
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    /// Missed, and the block went into a free line
    Miss,
    /// Missed, and the set was full so its least recently used line was replaced
    MissEviction,
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Hit => write!(f, "hit"),
            AccessOutcome::Miss => write!(f, "miss"),
            AccessOutcome::MissEviction => write!(f, "miss eviction"),
        }
    }
}

/// The outcomes of the accesses made for one trace line, in order. Instruction fetches make no
/// accesses, modifies make two
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct StepReport {
    outcomes: [Option<AccessOutcome>; 2],
}

impl StepReport {
    fn push(&mut self, outcome: AccessOutcome) {
        if let Some(slot) = self.outcomes.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(outcome);
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = AccessOutcome> + '_ {
        self.outcomes.iter().flatten().copied()
    }
}

/// Displays as the outcome list printed by verbose mode, e.g. ` miss eviction hit`
impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in self.outcomes() {
            write!(f, " {outcome}")?;
        }
        Ok(())
    }
}

/// The simulator owns a cache store for one geometry and counts hits, misses and evictions as
/// trace records are fed to it under an LRU replacement policy
///
/// Recency is tracked with a per line age. A touched line goes to age 0, and after each trace
/// line every valid line ages by one, so the two accesses of a modify see the same ages
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
pub struct Simulator {
    geometry: CacheGeometry,
    store: CacheStore,
    result: SimulationResult,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator with an empty cache
    ///
    /// # Arguments
    ///
    /// * `geometry`: The cache geometry, which is validated before anything is allocated
    ///
    /// returns: Result<Simulator, GeometryError>
    pub fn new(geometry: CacheGeometry) -> Result<Self, GeometryError> {
        let store = CacheStore::new(&geometry)?;
        debug!(
            "allocated {} sets of {} lines with {} byte blocks",
            geometry.num_sets(),
            geometry.lines_per_set,
            1u128 << geometry.block_bits
        );
        Ok(Self {
            geometry,
            store,
            result: SimulationResult::default(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Performs a single cache access, without ageing
    ///
    /// The set is searched for the tag first, refreshing the line on a hit. On a miss the block
    /// goes into the first free line, or replaces the oldest line when the set is full
    ///
    /// # Arguments
    ///
    /// * `address`: The address accessed. Only the block it falls in matters
    ///
    /// returns: AccessOutcome, the counters are updated internally
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        let (tag, set_index) = self.geometry.decompose(address);
        let outcome = if let Some(position) = self.store.find(set_index, tag) {
            self.store.touch(position);
            self.result.hits += 1;
            AccessOutcome::Hit
        } else if let Some(position) = self.store.first_free(set_index) {
            self.store.install(position, tag);
            self.result.misses += 1;
            AccessOutcome::Miss
        } else {
            let position = self.store.oldest(set_index);
            self.store.install(position, tag);
            self.result.misses += 1;
            self.result.evictions += 1;
            AccessOutcome::MissEviction
        };
        trace!("{address:#x} (set {set_index}, tag {tag:#x}): {outcome}");
        outcome
    }

    /// Executes one trace line then ages the cache
    ///
    /// Loads and stores access the cache once, modifies twice. A modify's store always hits, as
    /// its load has just brought the block in. Instruction fetches don't touch the cache
    pub fn execute(&mut self, record: &AccessRecord) -> StepReport {
        let mut report = StepReport::default();
        for _ in 0..record.operation.accesses() {
            report.push(self.access(record.address));
        }
        self.store.age_all();
        report
    }

    /// Simulates a whole trace
    ///
    /// Stops at the first record which couldn't be read, leaving the counters as they were after
    /// the last good record
    ///
    /// # Arguments
    ///
    /// * `records`: The trace records, usually from a `TraceReader`
    ///
    /// returns: Result<&SimulationResult, SimError>
    pub fn simulate<I>(&mut self, records: I) -> Result<&SimulationResult, SimError>
    where
        I: IntoIterator<Item = Result<AccessRecord, TraceError>>,
    {
        self.simulate_with(records, |_, _| {})
    }

    /// Simulates a whole trace, calling `observer` with every record and its outcomes
    pub fn simulate_with<I, F>(&mut self, records: I, mut observer: F) -> Result<&SimulationResult, SimError>
    where
        I: IntoIterator<Item = Result<AccessRecord, TraceError>>,
        F: FnMut(&AccessRecord, &StepReport),
    {
        let start = Instant::now();
        let mut records_read: u64 = 0;
        let outcome = records.into_iter().try_for_each(|record| {
            let record = record?;
            let report = self.execute(&record);
            observer(&record, &report);
            records_read += 1;
            Ok::<(), TraceError>(())
        });
        self.simulation_time += Instant::now() - start;
        outcome?;
        info!("simulated {records_read} trace records: {}", self.result);
        Ok(&self.result)
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Read only view of the line store, for inspecting cache state
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines which were never filled
    pub fn get_uninitialised_line_count(&self) -> usize {
        self.store.uninitialised_line_count()
    }
}
