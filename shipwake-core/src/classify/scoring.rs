//! Confidence, severity and suspicion scoring
//!
//! Pure functions over an encounter's aggregate features.

use chrono::{DateTime, Timelike};

use crate::encounter::{EncounterType, Severity};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Minimum separation below which a fast pass counts as a collision risk (m)
pub const COLLISION_RISK_DISTANCE: f64 = 200.0;

/// Speed above which a vessel is considered under way for collision risk (kn)
pub const COLLISION_RISK_SPEED: f64 = 10.0;

/// Shortest STS transfer
pub const STS_MIN_DURATION_MS: i64 = 30 * MINUTE_MS;

/// Shortest rendezvous
pub const RENDEZVOUS_MIN_DURATION_MS: i64 = 10 * MINUTE_MS;

/// Night window for the suspicious-activity check, hours of day (UTC)
pub const NIGHT_START_HOUR: u32 = 22;
pub const NIGHT_END_HOUR: u32 = 6;

/// Aggregate features the scorers work from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterFeatures {
    /// Meters
    pub min_distance: f64,
    /// Milliseconds
    pub duration: i64,
    /// Knots, one per vessel
    pub average_speeds: (f64, f64),
}

impl EncounterFeatures {
    pub fn both_at_or_below(&self, knots: f64) -> bool {
        self.average_speeds.0 <= knots && self.average_speeds.1 <= knots
    }

    pub fn both_below(&self, knots: f64) -> bool {
        self.average_speeds.0 < knots && self.average_speeds.1 < knots
    }

    pub fn either_at_or_below(&self, knots: f64) -> bool {
        self.average_speeds.0 <= knots || self.average_speeds.1 <= knots
    }

    pub fn either_above(&self, knots: f64) -> bool {
        self.average_speeds.0 > knots || self.average_speeds.1 > knots
    }
}

/// Severity from type and minimum distance
pub fn severity(encounter_type: EncounterType, min_distance: f64) -> Severity {
    match encounter_type {
        EncounterType::CollisionRisk => Severity::Critical,
        EncounterType::StsTransfer => Severity::High,
        _ if min_distance < 200.0 => Severity::High,
        _ if min_distance < 500.0 => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Confidence for encounters found by the grid scan, in `[0, 1]`
pub fn encounter_confidence(encounter_type: EncounterType, features: &EncounterFeatures) -> f64 {
    let mut confidence = 0.5;

    if features.min_distance < 100.0 {
        confidence += 0.3;
    } else if features.min_distance < 500.0 {
        confidence += 0.2;
    } else if features.min_distance < 1000.0 {
        confidence += 0.1;
    }

    if features.duration > HOUR_MS {
        confidence += 0.2;
    } else if features.duration > 30 * MINUTE_MS {
        confidence += 0.1;
    }

    if encounter_type == EncounterType::StsTransfer && features.both_below(2.0) {
        confidence += 0.2;
    }

    clamp_unit(confidence)
}

/// Confidence for transfers found by the STS pass, in `[0, 1]`
pub fn sts_confidence(features: &EncounterFeatures) -> f64 {
    let mut confidence = 0.6;

    if features.both_below(1.0) {
        confidence += 0.2;
    }
    if features.min_distance < 50.0 {
        confidence += 0.2;
    }
    if features.duration > 2 * HOUR_MS {
        confidence += 0.1;
    }

    clamp_unit(confidence)
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Hour of day (UTC) for an epoch-millisecond timestamp
pub fn hour_of_day(timestamp: i64) -> Option<u32> {
    DateTime::from_timestamp_millis(timestamp).map(|t| t.hour())
}

fn is_night(timestamp: i64) -> bool {
    matches!(hour_of_day(timestamp), Some(h) if h >= NIGHT_START_HOUR || h < NIGHT_END_HOUR)
}

/// Flag encounters that look like deliberate concealment or recklessness.
///
/// Any one of: the encounter's midpoint falls at night, a transfer lasting
/// more than four hours, or a sub-100 m pass with a vessel above 15 knots.
pub fn is_suspicious(encounter_type: EncounterType, features: &EncounterFeatures, timestamp: i64) -> bool {
    if is_night(timestamp) {
        return true;
    }
    if encounter_type == EncounterType::StsTransfer && features.duration > 4 * HOUR_MS {
        return true;
    }
    features.min_distance < 100.0 && features.either_above(15.0)
}
