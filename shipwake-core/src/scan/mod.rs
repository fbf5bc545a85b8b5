//! Pairwise proximity scan
//!
//! Walks a shared time grid from `start` to `end` in steps of the sampling
//! interval. At every tick each vessel is sampled, and every pair of present
//! vessels is checked against the formation band:
//!
//! - inside the band: open or extend the pair's session
//! - outside the band: close the pair's session, if any
//! - either vessel absent: leave the session alone
//!
//! Closed sessions long enough to matter are classified, and kept if the
//! resulting confidence clears the threshold. Sessions still open when the
//! grid runs out are finalized the same way.
//!
//! Sessions are keyed per pair, so overlapping encounters between different
//! pairs never interfere. Cost is O(ticks × pairs).

pub mod session;

use crate::classify::EncounterClassifier;
use crate::config::DetectionConfig;
use crate::encounter::VesselEncounter;
use crate::geo::haversine_distance;
use crate::trip::{TimeRange, VesselSample, VesselTrip};

pub use session::{PairKey, PairSample, PotentialEncounterSession, SessionMap};

/// Index pair into a trip slice. The first trip has the smaller vessel id.
pub type TripPair = (usize, usize);

/// Every distinct vessel pair in `trips`, in a stable order.
///
/// Trips sharing a vessel id are never paired with each other.
pub fn all_pairs(trips: &[VesselTrip]) -> Vec<TripPair> {
    let mut pairs = Vec::with_capacity(trips.len() * trips.len().saturating_sub(1) / 2);
    for i in 0..trips.len() {
        for j in (i + 1)..trips.len() {
            let (a, b) = (&trips[i].vessel_id, &trips[j].vessel_id);
            if a == b {
                log::debug!("Skipping pair of trips for the same vessel {}", a);
                continue;
            }
            pairs.push(if a < b { (i, j) } else { (j, i) });
        }
    }
    pairs
}

/// Grid scan over a set of trip pairs
pub struct ProximityScanner<'a> {
    config: &'a DetectionConfig,
    classifier: &'a EncounterClassifier<'a>,
}

impl<'a> ProximityScanner<'a> {
    pub fn new(config: &'a DetectionConfig, classifier: &'a EncounterClassifier<'a>) -> Self {
        ProximityScanner { config, classifier }
    }

    /// Scan `pairs` of `trips` over `range`.
    ///
    /// The result is in finalization order; callers sort it.
    pub fn scan(&self, trips: &[VesselTrip], pairs: &[TripPair], range: TimeRange) -> Vec<VesselEncounter> {
        let mut sessions = SessionMap::new();
        let mut encounters = Vec::new();
        let step = self.config.sampling_interval;

        if step <= 0 || range.end < range.start || pairs.is_empty() {
            return encounters;
        }

        // Only trips that take part in one of our pairs need sampling
        let mut wanted = vec![false; trips.len()];
        for &(i, j) in pairs {
            wanted[i] = true;
            wanted[j] = true;
        }

        let mut samples: Vec<Option<VesselSample<'_>>> = vec![None; trips.len()];
        let mut t = range.start;
        let mut ticks = 0usize;
        while t <= range.end {
            for (index, trip) in trips.iter().enumerate() {
                samples[index] = if wanted[index] { trip.sample_at(t) } else { None };
            }

            for &(i, j) in pairs {
                let (Some(a), Some(b)) = (&samples[i], &samples[j]) else {
                    continue;
                };
                let distance = haversine_distance(&a.position, &b.position);
                self.check_pair(&mut sessions, &mut encounters, t, a, b, distance);
            }

            ticks += 1;
            t = match t.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        let open = sessions.len();
        for (_, session) in std::mem::take(&mut sessions) {
            self.finalize(session, &mut encounters);
        }

        log::debug!(
            "Scanned {} pairs over {} ticks, {} sessions open at end, {} encounters",
            pairs.len(),
            ticks,
            open,
            encounters.len()
        );
        encounters
    }

    fn check_pair(
        &self,
        sessions: &mut SessionMap,
        encounters: &mut Vec<VesselEncounter>,
        t: i64,
        a: &VesselSample<'_>,
        b: &VesselSample<'_>,
        distance: f64,
    ) {
        let key = PairKey::new(a.vessel_id, b.vessel_id);

        if distance > self.config.formation_threshold {
            if let Some(session) = sessions.remove(&key) {
                log::trace!("{}: separated to {:.0} m at {}", key, distance, t);
                self.finalize(session, encounters);
            }
            return;
        }

        match sessions.get_mut(&key) {
            Some(session) if t.saturating_sub(session.start_time) > self.config.maximum_encounter_duration => {
                // Cap reached: finish this one and start afresh at this tick
                log::debug!("{}: session reached maximum duration, splitting at {}", key, t);
                let finished = std::mem::replace(session, PotentialEncounterSession::open(t, a, b, distance));
                self.finalize(finished, encounters);
            }
            Some(session) => session.extend(t, a, b, distance),
            None => {
                log::trace!("{}: in range at {:.0} m, opening session at {}", key, distance, t);
                sessions.insert(key, PotentialEncounterSession::open(t, a, b, distance));
            }
        }
    }

    /// Classify a closed session and keep the encounter if it qualifies
    fn finalize(&self, session: PotentialEncounterSession, encounters: &mut Vec<VesselEncounter>) {
        if session.duration() < self.config.minimum_encounter_duration {
            log::trace!(
                "{}-{}: dropped session of {} ms, shorter than minimum",
                session.vessel_ids.0,
                session.vessel_ids.1,
                session.duration()
            );
            return;
        }

        let encounter = self.classifier.classify(&session);
        if encounter.confidence < self.config.confidence_threshold {
            log::debug!(
                "{}: dropped {} with confidence {:.2}",
                encounter.id,
                encounter.encounter_type,
                encounter.confidence
            );
            return;
        }

        log::debug!(
            "{}: {} for {} ms, min {:.0} m, confidence {:.2}",
            encounter.id,
            encounter.encounter_type,
            encounter.duration,
            encounter.distance,
            encounter.confidence
        );
        encounters.push(encounter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::EncounterType;
    use crate::enrich::Enrichment;
    use crate::geo::{offset_north, Position};

    const MINUTE: i64 = 60_000;
    // 2024-03-01T12:00:00Z
    const NOON: i64 = 1_709_294_400_000;

    /// Stationary trip sampled every minute for `minutes`, at `offset` meters
    /// north of a reference point
    fn parked(id: &str, offset: f64, start: i64, minutes: i64, speed: f64) -> VesselTrip {
        let origin = Position::new(56.3, 26.1);
        let mut trip = VesselTrip::new(id);
        for m in 0..=minutes {
            trip.push(start + m * MINUTE, offset_north(&origin, offset), Some(speed), Some(0.0));
        }
        trip
    }

    fn scan(trips: &[VesselTrip], config: &DetectionConfig, range: TimeRange) -> Vec<VesselEncounter> {
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(config, &enrichment);
        let scanner = ProximityScanner::new(config, &classifier);
        scanner.scan(trips, &all_pairs(trips), range)
    }

    #[test]
    fn test_all_pairs_orders_by_vessel_id() {
        let trips = vec![VesselTrip::new("c"), VesselTrip::new("a"), VesselTrip::new("b")];
        assert_eq!(all_pairs(&trips), vec![(1, 0), (2, 0), (1, 2)]);
    }

    #[test]
    fn test_all_pairs_skips_same_vessel() {
        let trips = vec![VesselTrip::new("a"), VesselTrip::new("a")];
        assert!(all_pairs(&trips).is_empty());
    }

    #[test]
    fn test_separation_closes_session() {
        let config = DetectionConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        };
        // In range for 30 minutes, then apart for 30 minutes, then back together
        let a = parked("a", 0.0, NOON, 90, 8.0);
        let mut b = VesselTrip::new("b");
        let origin = Position::new(56.3, 26.1);
        for m in 0..=90 {
            let offset = if (30..60).contains(&m) { 5000.0 } else { 1500.0 };
            b.push(NOON + m * MINUTE, offset_north(&origin, offset), Some(8.0), Some(0.0));
        }

        let encounters = scan(&[a, b], &config, TimeRange::new(NOON, NOON + 90 * MINUTE));
        assert_eq!(encounters.len(), 2);
        assert_eq!(encounters[0].duration, 29 * MINUTE);
        assert_eq!(encounters[1].duration, 30 * MINUTE);
        assert!(encounters.iter().all(|e| e.encounter_type == EncounterType::Formation));
    }

    #[test]
    fn test_absent_vessel_does_not_close_session() {
        let config = DetectionConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        };
        let a = parked("a", 0.0, NOON, 120, 8.0);
        // b goes silent for 40 minutes in the middle
        let mut b = VesselTrip::new("b");
        let origin = Position::new(56.3, 26.1);
        for m in (0..=120).filter(|m| !(40..80).contains(m)) {
            b.push(NOON + m * MINUTE, offset_north(&origin, 1500.0), Some(8.0), Some(0.0));
        }

        let encounters = scan(&[a, b], &config, TimeRange::new(NOON, NOON + 120 * MINUTE));
        assert_eq!(encounters.len(), 1);
        assert_eq!(encounters[0].duration, 120 * MINUTE);
    }

    #[test]
    fn test_short_session_dropped() {
        let config = DetectionConfig::default();
        let a = parked("a", 0.0, NOON, 3, 8.0);
        let b = parked("b", 1500.0, NOON, 3, 8.0);
        // Grid stops after four minutes, below the five minute minimum
        let encounters = scan(&[a, b], &config, TimeRange::new(NOON, NOON + 4 * MINUTE));
        assert!(encounters.is_empty());
    }

    #[test]
    fn test_low_confidence_dropped() {
        let config = DetectionConfig {
            confidence_threshold: 0.55,
            ..Default::default()
        };
        // Formation at 1500 m for 20 minutes scores 0.5
        let a = parked("a", 0.0, NOON, 20, 8.0);
        let b = parked("b", 1500.0, NOON, 20, 8.0);
        let encounters = scan(&[a, b], &config, TimeRange::new(NOON, NOON + 20 * MINUTE));
        assert!(encounters.is_empty());
    }

    #[test]
    fn test_maximum_duration_splits_session() {
        let config = DetectionConfig {
            maximum_encounter_duration: 60 * MINUTE,
            ..Default::default()
        };
        let a = parked("a", 0.0, NOON, 150, 1.0);
        let b = parked("b", 40.0, NOON, 150, 1.0);
        let encounters = scan(&[a, b], &config, TimeRange::new(NOON, NOON + 150 * MINUTE));

        assert_eq!(encounters.len(), 3);
        assert!(encounters.iter().all(|e| e.duration <= 60 * MINUTE));
        assert_eq!(encounters[0].duration, 60 * MINUTE);
        assert_eq!(encounters[1].duration, 60 * MINUTE);
        assert_eq!(encounters[2].duration, 28 * MINUTE);
    }

    #[test]
    fn test_concurrent_pairs_tracked_independently() {
        let config = DetectionConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        };
        let a = parked("a", 0.0, NOON, 60, 8.0);
        let b = parked("b", 1500.0, NOON, 60, 8.0);
        // c sits far from both, next to d
        let c = parked("c", 20_000.0, NOON, 60, 8.0);
        let d = parked("d", 21_000.0, NOON, 60, 8.0);
        let encounters = scan(&[a, b, c, d], &config, TimeRange::new(NOON, NOON + 60 * MINUTE));

        let mut pairs: Vec<_> = encounters.iter().map(|e| e.vessel_ids.clone()).collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![("a".to_string(), "b".to_string()), ("c".to_string(), "d".to_string())]
        );
    }

    #[test]
    fn test_dashed_vessel_ids_keep_separate_sessions() {
        let config = DetectionConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        };
        let ab = parked("a-b", 0.0, NOON, 60, 8.0);
        let c = parked("c", 1500.0, NOON, 60, 8.0);
        let a = parked("a", 20_000.0, NOON, 60, 8.0);
        let bc = parked("b-c", 21_000.0, NOON, 60, 8.0);
        let mut encounters = scan(&[ab, c, a, bc], &config, TimeRange::new(NOON, NOON + 60 * MINUTE));
        encounters.sort_by(|x, y| x.vessel_ids.cmp(&y.vessel_ids));

        assert_eq!(encounters.len(), 2);
        assert_eq!(encounters[0].vessel_ids, ("a".to_string(), "b-c".to_string()));
        assert_eq!(encounters[1].vessel_ids, ("a-b".to_string(), "c".to_string()));
        for e in &encounters {
            assert_eq!(e.metadata.sample_count, 61);
        }
        assert!((encounters[0].distance - 1000.0).abs() < 1.0);
        assert!((encounters[1].distance - 1500.0).abs() < 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        let config = DetectionConfig::default();
        assert!(scan(&[], &config, TimeRange::new(0, 1000)).is_empty());
        let a = parked("a", 0.0, NOON, 10, 1.0);
        let b = parked("b", 0.0, NOON, 10, 1.0);
        assert!(scan(&[a, b], &config, TimeRange::new(NOON, NOON - 1)).is_empty());
    }
}
