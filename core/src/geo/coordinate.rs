// Coordinates — fixed-point storage with floating-point geometry helpers

use serde::{Deserialize, Serialize};

/// Fixed-point scale: coordinates are stored as degrees * 1e6.
pub const COORDINATE_PRECISION: f64 = 1_000_000.0;

const EARTH_RADIUS_M: f64 = 6_372_797.560856;

/// A WGS84 position in degrees, as supplied by callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A position stored as integer micro-degrees.
///
/// Every location that ends up in a result or a hint goes through this type,
/// so equal inputs always serialize to equal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedCoordinate {
    pub lat: i32,
    pub lon: i32,
}

impl FixedCoordinate {
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat: (lat * COORDINATE_PRECISION).round() as i32,
            lon: (lon * COORDINATE_PRECISION).round() as i32,
        }
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat as f64 / COORDINATE_PRECISION
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon as f64 / COORDINATE_PRECISION
    }

    pub fn is_valid(&self) -> bool {
        (-90_000_000..=90_000_000).contains(&self.lat)
            && (-180_000_000..=180_000_000).contains(&self.lon)
    }

    /// Project onto a local plane (metres) centred on `origin`.
    pub(crate) fn to_local(self, origin: FixedCoordinate) -> (f64, f64) {
        let cos_lat = origin.lat_deg().to_radians().cos();
        let x = (self.lon_deg() - origin.lon_deg()).to_radians() * EARTH_RADIUS_M * cos_lat;
        let y = (self.lat_deg() - origin.lat_deg()).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    /// Linear interpolation between `self` and `other`, rounded to fixed point.
    pub(crate) fn interpolate(self, other: FixedCoordinate, ratio: f64) -> FixedCoordinate {
        let lat = self.lat as f64 + (other.lat as f64 - self.lat as f64) * ratio;
        let lon = self.lon as f64 + (other.lon as f64 - self.lon as f64) * ratio;
        FixedCoordinate {
            lat: lat.round() as i32,
            lon: lon.round() as i32,
        }
    }
}

impl From<Coordinate> for FixedCoordinate {
    fn from(c: Coordinate) -> Self {
        FixedCoordinate::from_degrees(c.lat, c.lon)
    }
}

/// Great-circle distance in metres.
pub fn haversine_distance(a: FixedCoordinate, b: FixedCoordinate) -> f64 {
    let lat1 = a.lat_deg().to_radians();
    let lat2 = b.lat_deg().to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon_deg() - a.lon_deg()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from `a` to `b`, degrees clockwise from north in [0, 360).
pub fn bearing(a: FixedCoordinate, b: FixedCoordinate) -> f64 {
    let lat1 = a.lat_deg().to_radians();
    let lat2 = b.lat_deg().to_radians();
    let dlon = (b.lon_deg() - a.lon_deg()).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let deg = y.atan2(x).to_degrees();
    (deg + 360.0) % 360.0
}
