//! Per-pair session state
//!
//! A session accumulates every tick two vessels spent within the formation
//! band. It is created the first tick they are in range and finalized when
//! they separate, the scan ends, or it reaches the maximum encounter length.

use std::collections::BTreeMap;

use crate::geo::Position;
use crate::trip::VesselSample;

/// Order-independent key for a vessel pair.
///
/// Holds both ids separately; ids may contain any character, so a joined
/// string would not be unique. Displays as `"<min>-<max>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(id1: &str, id2: &str) -> Self {
        let (a, b) = if id1 <= id2 { (id1, id2) } else { (id2, id1) };
        PairKey(a.to_string(), b.to_string())
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Both vessels at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSample {
    pub timestamp: i64,
    pub position1: Position,
    pub position2: Position,
    /// Meters
    pub distance: f64,
}

/// In-progress encounter between two vessels.
///
/// The vessel ids are stored in sorted order; samples, speeds and headings
/// follow the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialEncounterSession {
    pub vessel_ids: (String, String),
    pub start_time: i64,
    pub end_time: i64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub samples: Vec<PairSample>,
    /// Knots, `None` when the trip carries no speed for that sample
    pub speeds: Vec<(Option<f64>, Option<f64>)>,
    /// Degrees
    pub headings: Vec<(Option<f64>, Option<f64>)>,
}

impl PotentialEncounterSession {
    /// Open a session at tick `t`. `a` and `b` must be in sorted id order.
    pub fn open(t: i64, a: &VesselSample<'_>, b: &VesselSample<'_>, distance: f64) -> Self {
        let mut session = PotentialEncounterSession {
            vessel_ids: (a.vessel_id.to_string(), b.vessel_id.to_string()),
            start_time: t,
            end_time: t,
            min_distance: distance,
            max_distance: distance,
            samples: Vec::new(),
            speeds: Vec::new(),
            headings: Vec::new(),
        };
        session.extend(t, a, b, distance);
        session
    }

    /// Record tick `t`
    pub fn extend(&mut self, t: i64, a: &VesselSample<'_>, b: &VesselSample<'_>, distance: f64) {
        self.end_time = t;
        self.min_distance = self.min_distance.min(distance);
        self.max_distance = self.max_distance.max(distance);
        self.samples.push(PairSample {
            timestamp: t,
            position1: a.position,
            position2: b.position,
            distance,
        });
        self.speeds.push((a.speed, b.speed));
        self.headings.push((a.heading, b.heading));
    }

    /// Milliseconds between the first and last recorded tick
    pub fn duration(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Open sessions for one scan, keyed by pair.
///
/// A `BTreeMap` so sessions still open at the end of a scan are finalized in
/// a stable order.
pub type SessionMap = BTreeMap<PairKey, PotentialEncounterSession>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, lon: f64, speed: Option<f64>) -> VesselSample<'_> {
        VesselSample {
            vessel_id: id,
            timestamp: 0,
            position: Position::new(lon, 0.0),
            speed,
            heading: None,
        }
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(PairKey::new("b", "a"), PairKey::new("a", "b"));
        assert_eq!(PairKey::new("b", "a").to_string(), "a-b");
        assert_eq!(PairKey::new("b", "a").first(), "a");
        assert_eq!(PairKey::new("b", "a").second(), "b");
    }

    #[test]
    fn test_pair_key_with_dashed_ids_is_unique() {
        let left = PairKey::new("a-b", "c");
        let right = PairKey::new("a", "b-c");
        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);

        let mut sessions = SessionMap::new();
        let (ab, c) = (sample("a-b", 0.0, None), sample("c", 0.0, None));
        let (a, bc) = (sample("a", 0.0, None), sample("b-c", 0.0, None));
        sessions.insert(left, PotentialEncounterSession::open(0, &ab, &c, 10.0));
        sessions.insert(right, PotentialEncounterSession::open(0, &a, &bc, 20.0));
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_session_tracks_extremes() {
        let a = sample("a", 0.0, Some(1.0));
        let b = sample("b", 0.001, None);
        let mut session = PotentialEncounterSession::open(1_000, &a, &b, 300.0);
        session.extend(61_000, &a, &b, 120.0);
        session.extend(121_000, &a, &b, 450.0);

        assert_eq!(session.vessel_ids, ("a".to_string(), "b".to_string()));
        assert_eq!(session.min_distance, 120.0);
        assert_eq!(session.max_distance, 450.0);
        assert_eq!(session.duration(), 120_000);
        assert_eq!(session.samples.len(), 3);
        assert_eq!(session.speeds[0], (Some(1.0), None));
    }

    #[test]
    fn test_single_tick_session_has_zero_duration() {
        let a = sample("a", 0.0, None);
        let b = sample("b", 0.0, None);
        let session = PotentialEncounterSession::open(5, &a, &b, 0.0);
        assert_eq!(session.duration(), 0);
        assert_eq!(session.samples.len(), 1);
    }
}
