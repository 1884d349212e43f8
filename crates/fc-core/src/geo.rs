//! Geographic coordinates and straight-line distance.
//!
//! Node positions are WGS-84 `f32` pairs.  Trip distance floors are a few
//! hundred metres at most, so single precision (~1 m at the equator) is
//! plenty.

/// A WGS-84 coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f32,
    pub lon: f32,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f32 {
        const R: f32 = 6_371_000.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
        2.0 * R * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// The point `north_m` metres north and `east_m` metres east of `self`.
    ///
    /// Flat-earth offset; only meant for laying out synthetic city-scale
    /// networks.
    pub fn offset_m(self, north_m: f32, east_m: f32) -> GeoPoint {
        const M_PER_DEG: f32 = 111_195.0;
        let lat = self.lat + north_m / M_PER_DEG;
        let lon = self.lon + east_m / (M_PER_DEG * self.lat.to_radians().cos());
        GeoPoint { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
