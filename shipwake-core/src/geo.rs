//! Great-circle geometry
//!
//! Positions are `[longitude, latitude]` pairs in degrees, matching the
//! GeoJSON ordering used by the trajectory feeds.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// One nautical mile in meters
pub const NAUTICAL_MILE: f64 = 1852.0;

/// A `[longitude, latitude]` pair in degrees.
///
/// Serializes as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub f64, pub f64);

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Position(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// Arithmetic midpoint of two positions.
    ///
    /// Good enough for vessels a few kilometers apart; not a great-circle
    /// midpoint.
    pub fn midpoint(&self, other: &Position) -> Position {
        Position((self.0 + other.0) / 2.0, (self.1 + other.1) / 2.0)
    }
}

impl From<[f64; 2]> for Position {
    fn from(p: [f64; 2]) -> Self {
        Position(p[0], p[1])
    }
}

/// Distance in meters between two positions using the haversine formula.
pub fn haversine_distance(a: &Position, b: &Position) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lon = (b.lon() - a.lon()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Mean of a set of positions, or `None` when empty.
pub fn centroid<'a, I>(positions: I) -> Option<Position>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut count = 0usize;
    let mut lon = 0.0;
    let mut lat = 0.0;
    for p in positions {
        lon += p.lon();
        lat += p.lat();
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Position(lon / count as f64, lat / count as f64))
}

/// Offset a position northwards by `meters`, for short distances
#[cfg(test)]
pub(crate) fn offset_north(p: &Position, meters: f64) -> Position {
    let d_lat = (meters / EARTH_RADIUS_M).to_degrees();
    Position(p.lon(), p.lat() + d_lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero() {
        let p = Position::new(103.8, 1.25);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Position::new(-0.1, 51.5);
        let b = Position::new(2.35, 48.85);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_one_minute_of_latitude_is_a_nautical_mile() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(0.0, 1.0 / 60.0);
        let d = haversine_distance(&a, &b);
        // Spherical earth, so roughly 1853m rather than exactly 1852m
        assert!((d - NAUTICAL_MILE).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_london_paris() {
        let london = Position::new(-0.1278, 51.5074);
        let paris = Position::new(2.3522, 48.8566);
        let d = haversine_distance(&london, &paris);
        assert!((d - 343_500.0).abs() < 1_000.0, "got {}", d);
    }

    #[test]
    fn test_offset_north_round_trips_distance() {
        let p = Position::new(56.0, 26.0);
        let q = offset_north(&p, 40.0);
        assert!((haversine_distance(&p, &q) - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_centroid() {
        let points = [Position::new(0.0, 0.0), Position::new(2.0, 4.0)];
        assert_eq!(centroid(points.iter()), Some(Position::new(1.0, 2.0)));
        assert_eq!(centroid(std::iter::empty::<&Position>()), None);
    }

    #[test]
    fn test_position_serializes_as_array() {
        let json = serde_json::to_string(&Position::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");
    }
}
