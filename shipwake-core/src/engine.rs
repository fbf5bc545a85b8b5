//! Encounter engine
//!
//! The entry point most callers want. Holds a validated [`DetectionConfig`]
//! and the enrichment capabilities, and runs the grid scan and the STS pass
//! over a batch of trips.
//!
//! ```rust,ignore
//! use shipwake_core::{DetectionConfig, EncounterEngine, TimeRange};
//!
//! let engine = EncounterEngine::new(DetectionConfig::default())?.with_workers(4);
//! let encounters = engine.detect_encounters(&trips, start, end);
//! let transfers = engine.detect_sts_transfers(&trips, TimeRange::new(start, end));
//! ```

use crate::classify::EncounterClassifier;
use crate::config::{ConfigError, DetectionConfig};
use crate::encounter::{sort_encounters, EncounterType, VesselEncounter};
use crate::enrich::Enrichment;
use crate::scan::{all_pairs, ProximityScanner, TripPair};
use crate::sts::StsDetector;
use crate::trip::{TimeRange, VesselTrip};

/// Below this many pairs per worker, sharding costs more than it saves
const MIN_PAIRS_PER_WORKER: usize = 8;

/// Batch encounter detector
#[derive(Debug)]
pub struct EncounterEngine {
    config: DetectionConfig,
    enrichment: Enrichment,
    workers: usize,
}

impl Default for EncounterEngine {
    fn default() -> Self {
        EncounterEngine {
            config: DetectionConfig::default(),
            enrichment: Enrichment::default(),
            workers: 1,
        }
    }
}

impl EncounterEngine {
    /// Create an engine, rejecting configs it cannot work with
    pub fn new(config: DetectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(EncounterEngine {
            config,
            ..Default::default()
        })
    }

    /// Replace the enrichment capabilities
    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    /// Shard pair-wise work over `workers` threads. 0 and 1 both mean
    /// single-threaded.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Grid scan of all vessel pairs between `start` and `end`, sorted by
    /// encounter midpoint
    pub fn detect_encounters(&self, trips: &[VesselTrip], start: i64, end: i64) -> Vec<VesselEncounter> {
        let range = TimeRange::new(start, end);
        let classifier = EncounterClassifier::new(&self.config, &self.enrichment);
        let scanner = ProximityScanner::new(&self.config, &classifier);
        let pairs = all_pairs(trips);

        let mut encounters = self.run_sharded(&pairs, |chunk| scanner.scan(trips, chunk, range));
        sort_encounters(&mut encounters);

        log::info!(
            "Grid scan of {} vessels ({} pairs) over {} ms from {}: {} encounters",
            trips.len(),
            pairs.len(),
            range.duration(),
            start,
            encounters.len()
        );
        encounters
    }

    /// Timestamp-matched STS pass over every vessel pair, sorted by
    /// encounter midpoint
    pub fn detect_sts_transfers(&self, trips: &[VesselTrip], range: TimeRange) -> Vec<VesselEncounter> {
        let classifier = EncounterClassifier::new(&self.config, &self.enrichment);
        let detector = StsDetector::new(&self.config, &classifier);
        let pairs = all_pairs(trips);

        let mut encounters = self.run_sharded(&pairs, |chunk| {
            chunk
                .iter()
                .filter_map(|&(i, j)| detector.detect(&trips[i], &trips[j], range))
                .collect()
        });
        sort_encounters(&mut encounters);

        log::info!(
            "STS pass over {} pairs from {} to {}: {} transfers",
            pairs.len(),
            range.start,
            range.end,
            encounters.len()
        );
        encounters
    }

    /// Both passes merged.
    ///
    /// An STS-pass transfer is dropped when the grid scan already reported a
    /// transfer for the same pair over an overlapping period.
    pub fn detect_all(&self, trips: &[VesselTrip], range: TimeRange) -> Vec<VesselEncounter> {
        let mut encounters = self.detect_encounters(trips, range.start, range.end);
        let transfers = self.detect_sts_transfers(trips, range);

        let before = encounters.len();
        let extra: Vec<VesselEncounter> = transfers
            .into_iter()
            .filter(|sts| {
                !encounters
                    .iter()
                    .any(|e| e.encounter_type == EncounterType::StsTransfer && e.overlaps(sts))
            })
            .collect();
        encounters.extend(extra);
        sort_encounters(&mut encounters);

        log::debug!("STS pass added {} transfers", encounters.len() - before);
        encounters
    }

    /// Run `work` over `pairs`, split across the configured number of workers.
    ///
    /// Each worker owns its own session state; results are concatenated in
    /// shard order and sorted by the caller.
    fn run_sharded<F>(&self, pairs: &[TripPair], work: F) -> Vec<VesselEncounter>
    where
        F: Fn(&[TripPair]) -> Vec<VesselEncounter> + Sync,
    {
        let workers = self.workers.min(pairs.len() / MIN_PAIRS_PER_WORKER).max(1);
        if workers == 1 {
            return work(pairs);
        }
        shard(pairs, workers, &work)
    }
}

#[cfg(feature = "parallel")]
fn shard<F>(pairs: &[TripPair], workers: usize, work: &F) -> Vec<VesselEncounter>
where
    F: Fn(&[TripPair]) -> Vec<VesselEncounter> + Sync,
{
    let chunk_size = pairs.len().div_ceil(workers);
    log::debug!("Sharding {} pairs over {} workers", pairs.len(), workers);

    let joined = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = pairs
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move |_| work(chunk)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    });

    match joined {
        Ok(results) => results
            .into_iter()
            .flat_map(|r| r.unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect(),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(not(feature = "parallel"))]
fn shard<F>(pairs: &[TripPair], _workers: usize, work: &F) -> Vec<VesselEncounter>
where
    F: Fn(&[TripPair]) -> Vec<VesselEncounter> + Sync,
{
    work(pairs)
}
