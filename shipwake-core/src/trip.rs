//! Vessel trajectories and nearest-sample lookup
//!
//! A [`VesselTrip`] is a batch of recorded positions for one vessel, stored as
//! parallel arrays. The sampler answers "where was this vessel at time `t`"
//! with the closest recorded sample, or nothing when the vessel was silent
//! for too long around `t`.

use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// Maximum gap between a query time and the nearest sample for the vessel to
/// count as present (10 minutes)
pub const SAMPLE_TOLERANCE_MS: i64 = 10 * 60 * 1000;

/// Recorded trajectory of a single vessel.
///
/// `path`, `timestamps` and the optional `speeds`/`headings` are parallel
/// arrays. Timestamps are epoch milliseconds, non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselTrip {
    pub vessel_id: String,

    pub path: Vec<Position>,

    pub timestamps: Vec<i64>,

    /// Speed over ground in knots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speeds: Option<Vec<f64>>,

    /// Heading in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<f64>>,
}

/// State of a vessel at a sampled instant
#[derive(Debug, Clone, PartialEq)]
pub struct VesselSample<'a> {
    pub vessel_id: &'a str,
    /// Timestamp of the recorded sample (not the query time)
    pub timestamp: i64,
    pub position: Position,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

impl VesselTrip {
    pub fn new(vessel_id: impl Into<String>) -> Self {
        VesselTrip {
            vessel_id: vessel_id.into(),
            ..Default::default()
        }
    }

    /// Append a sample, keeping the parallel arrays aligned.
    ///
    /// Speed and heading arrays are created on first use; earlier samples get
    /// 0.0 so the arrays stay the same length as `path`.
    pub fn push(&mut self, timestamp: i64, position: Position, speed: Option<f64>, heading: Option<f64>) {
        let len = self.path.len();
        if let Some(speed) = speed {
            self.speeds.get_or_insert_with(|| vec![0.0; len]).push(speed);
        } else if let Some(speeds) = self.speeds.as_mut() {
            speeds.push(0.0);
        }
        if let Some(heading) = heading {
            self.headings.get_or_insert_with(|| vec![0.0; len]).push(heading);
        } else if let Some(headings) = self.headings.as_mut() {
            headings.push(0.0);
        }
        self.path.push(position);
        self.timestamps.push(timestamp);
    }

    /// Number of usable samples
    pub fn len(&self) -> usize {
        self.path.len().min(self.timestamps.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First and last timestamp, if any
    pub fn span(&self) -> Option<(i64, i64)> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        Some((self.timestamps[0], self.timestamps[n - 1]))
    }

    /// Index of the sample closest in time to `t`.
    ///
    /// Ties go to the earlier sample.
    pub fn nearest_index(&self, t: i64) -> Option<usize> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let timestamps = &self.timestamps[..n];
        let after = timestamps.partition_point(|&ts| ts < t);
        if after == 0 {
            return Some(0);
        }
        if after == n {
            return Some(n - 1);
        }
        let before = after - 1;
        if t.abs_diff(timestamps[before]) <= timestamps[after].abs_diff(t) {
            Some(before)
        } else {
            Some(after)
        }
    }

    /// Sample at `index`, without any tolerance check
    pub fn sample(&self, index: usize) -> Option<VesselSample<'_>> {
        let position = *self.path.get(index)?;
        let timestamp = *self.timestamps.get(index)?;
        Some(VesselSample {
            vessel_id: &self.vessel_id,
            timestamp,
            position,
            speed: self.speeds.as_ref().and_then(|s| s.get(index)).copied(),
            heading: self.headings.as_ref().and_then(|h| h.get(index)).copied(),
        })
    }

    /// Position, speed and heading of the vessel at time `t`.
    ///
    /// Returns the nearest recorded sample, or `None` when that sample is more
    /// than [`SAMPLE_TOLERANCE_MS`] away from `t`. No interpolation is done.
    pub fn sample_at(&self, t: i64) -> Option<VesselSample<'_>> {
        let index = self.nearest_index(t)?;
        if self.timestamps[index].abs_diff(t) > SAMPLE_TOLERANCE_MS.unsigned_abs() {
            return None;
        }
        self.sample(index)
    }
}

/// Closed time interval in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        TimeRange { start, end }
    }

    /// Smallest range containing every sample of every trip
    pub fn covering(trips: &[VesselTrip]) -> Option<TimeRange> {
        trips
            .iter()
            .filter_map(VesselTrip::span)
            .fold(None, |acc: Option<TimeRange>, (first, last)| match acc {
                None => Some(TimeRange::new(first, last)),
                Some(r) => Some(TimeRange::new(r.start.min(first), r.end.max(last))),
            })
    }

    pub fn contains(&self, t: i64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Milliseconds covered, saturating for extreme bounds
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}
