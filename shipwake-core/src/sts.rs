//! Ship-to-ship transfer detection on a single trip pair
//!
//! The grid scan can straddle short gaps or sample a pair at slightly
//! different instants. This pass works on the recorded timestamps instead:
//! every sample of the first trip is matched with the closest-in-time sample
//! of the second, and only those matched pairs are compared.

use crate::classify::{average_speeds, scoring, EncounterClassifier, EncounterFeatures};
use crate::config::DetectionConfig;
use crate::encounter::{EncounterMetadata, EncounterType, VesselEncounter};
use crate::geo::{centroid, haversine_distance, Position};
use crate::trip::{TimeRange, VesselTrip};

/// Largest gap between matched samples of the two trips (5 minutes)
pub const MATCH_TOLERANCE_MS: i64 = 5 * 60 * 1000;

/// Matched samples of both vessels inside the transfer distance
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityEvent {
    /// Timestamp of the first trip's sample
    pub timestamp: i64,
    pub position1: Position,
    pub position2: Position,
    pub speed1: Option<f64>,
    pub speed2: Option<f64>,
    /// Meters
    pub distance: f64,
}

/// Timestamp-matching transfer detector
pub struct StsDetector<'a> {
    config: &'a DetectionConfig,
    classifier: &'a EncounterClassifier<'a>,
}

impl<'a> StsDetector<'a> {
    pub fn new(config: &'a DetectionConfig, classifier: &'a EncounterClassifier<'a>) -> Self {
        StsDetector { config, classifier }
    }

    /// Samples of `trip1` within `range` that have a time-matched `trip2`
    /// sample within the transfer distance
    pub fn proximity_events(&self, trip1: &VesselTrip, trip2: &VesselTrip, range: TimeRange) -> Vec<ProximityEvent> {
        let mut events = Vec::new();

        for index in 0..trip1.len() {
            let t = trip1.timestamps[index];
            if !range.contains(t) {
                continue;
            }
            let Some(other) = trip2.nearest_index(t) else {
                break;
            };
            if trip2.timestamps[other].abs_diff(t) > MATCH_TOLERANCE_MS.unsigned_abs() {
                continue;
            }
            let (Some(s1), Some(s2)) = (trip1.sample(index), trip2.sample(other)) else {
                continue;
            };

            let distance = haversine_distance(&s1.position, &s2.position);
            if distance <= self.config.sts_transfer_threshold {
                events.push(ProximityEvent {
                    timestamp: t,
                    position1: s1.position,
                    position2: s2.position,
                    speed1: s1.speed,
                    speed2: s2.speed,
                    distance,
                });
            }
        }

        events
    }

    /// Detect a transfer between two trips, if there was one
    pub fn detect(&self, trip1: &VesselTrip, trip2: &VesselTrip, range: TimeRange) -> Option<VesselEncounter> {
        let events = self.proximity_events(trip1, trip2, range);
        let (first, last) = (events.first()?, events.last()?);

        let speeds: Vec<(Option<f64>, Option<f64>)> = events.iter().map(|e| (e.speed1, e.speed2)).collect();
        let min_distance = events.iter().map(|e| e.distance).fold(f64::INFINITY, f64::min);
        let max_distance = events.iter().map(|e| e.distance).fold(0.0, f64::max);
        let features = EncounterFeatures {
            min_distance,
            duration: last.timestamp - first.timestamp,
            average_speeds: average_speeds(&speeds),
        };

        if !(features.min_distance <= self.config.sts_transfer_threshold
            && features.both_at_or_below(self.config.slow_speed_threshold)
            && features.duration >= scoring::STS_MIN_DURATION_MS)
        {
            log::trace!(
                "{}-{}: {} proximity events but no transfer ({} ms, speeds {:?})",
                trip1.vessel_id,
                trip2.vessel_id,
                events.len(),
                features.duration,
                features.average_speeds
            );
            return None;
        }

        let midpoints: Vec<Position> = events.iter().map(|e| e.position1.midpoint(&e.position2)).collect();
        let location = centroid(midpoints.iter()).unwrap_or_default();
        let distances: Vec<f64> = events.iter().map(|e| e.distance).collect();
        let timestamp = first.timestamp + features.duration / 2;
        let vessel_ids = (trip1.vessel_id.clone(), trip2.vessel_id.clone());

        let mut metadata = EncounterMetadata {
            avg_distance: crate::classify::mean(&distances),
            max_distance,
            position_consistency: 1.0,
            sample_count: events.len(),
            ..Default::default()
        };
        self.classifier.fill_metadata(
            &mut metadata,
            EncounterType::StsTransfer,
            &features,
            &vessel_ids,
            &location,
            timestamp,
        );

        let encounter = VesselEncounter {
            id: VesselEncounter::make_id(first.timestamp, &vessel_ids.0, &vessel_ids.1),
            timestamp,
            vessel_ids,
            encounter_type: EncounterType::StsTransfer,
            location,
            distance: min_distance,
            duration: features.duration,
            confidence: scoring::sts_confidence(&features),
            severity: scoring::severity(EncounterType::StsTransfer, min_distance),
            metadata,
        };
        log::debug!(
            "{}: STS transfer for {} ms, min {:.0} m, confidence {:.2}",
            encounter.id,
            encounter.duration,
            encounter.distance,
            encounter.confidence
        );
        Some(encounter)
    }
}
