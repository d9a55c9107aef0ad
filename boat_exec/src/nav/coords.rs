//! # Coordinate frames
//!
//! Three frames are used on the boat:
//!
//! - Geocentric (ECEF): earth centred, earth fixed cartesian coordinates, as reported by the GPS
//!   and used for the origin exchanged with the shore.
//! - Geodetic: latitude, longitude and altitude on the WGS-84 ellipsoid. Only used to build the
//!   rotation into the local frame.
//! - Local (NED): north, east, down relative to the origin. All navigation happens in this frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// WGS-84 semi-major axis.
///
/// Units: meters
pub const WGS84_A_M: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

/// Iteration limit of the latitude solution, it converges to well below a millimeter in 4 or 5.
const MAX_LAT_ITERATIONS: usize = 10;

/// Latitude solution stops once the update is smaller than this.
///
/// Units: radians
const LAT_CONVERGENCE_RAD: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Earth centred, earth fixed position.
///
/// Units: meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocentricCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

/// Position on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCoordinate {
    /// Units: degrees
    pub lat_deg: f64,

    /// Units: degrees
    pub lon_deg: f64,

    /// Units: meters
    pub alt_m: f64
}

/// North, east, down position relative to the origin.
///
/// Units: meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalCoordinate {
    pub north: f64,
    pub east: f64,
    pub down: f64
}

/// Distance and bearing from one local coordinate to another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseVector {
    /// Horizontal distance.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Bearing clockwise from north.
    ///
    /// Units: degrees in [0, 360)
    pub bearing_deg: f64
}

/// The origin of the local frame, in both geocentric and geodetic form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub ecef: GeocentricCoordinate,
    pub geodetic: GeodeticCoordinate
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeocentricCoordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vector(v: Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Position of this coordinate in the local frame of the given origin.
    pub fn to_local(&self, origin: &Origin) -> LocalCoordinate {
        let delta = self.as_vector() - origin.ecef.as_vector();
        LocalCoordinate::from_vector(ecef_to_ned_rotation(&origin.geodetic) * delta)
    }
}

impl std::ops::Add for GeocentricCoordinate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_vector(self.as_vector() + rhs.as_vector())
    }
}

impl GeodeticCoordinate {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self { lat_deg, lon_deg, alt_m }
    }

    /// Convert to earth centred, earth fixed coordinates.
    pub fn to_geocentric(&self) -> GeocentricCoordinate {
        let lat = self.lat_deg.to_radians();
        let lon = self.lon_deg.to_radians();
        let n = prime_vertical_radius(lat);

        GeocentricCoordinate {
            x: (n + self.alt_m) * lat.cos() * lon.cos(),
            y: (n + self.alt_m) * lat.cos() * lon.sin(),
            z: (n * (1.0 - WGS84_E2) + self.alt_m) * lat.sin()
        }
    }

    /// Convert from earth centred, earth fixed coordinates, solving for latitude iteratively.
    pub fn from_geocentric(ecef: &GeocentricCoordinate) -> Self {
        let lon = ecef.y.atan2(ecef.x);
        let p = ecef.x.hypot(ecef.y);

        // On the polar axis the iteration degenerates, but the answer is known
        if p < 1e-6 {
            let b = WGS84_A_M * (1.0 - WGS84_E2).sqrt();
            return Self {
                lat_deg: 90f64.copysign(ecef.z),
                lon_deg: 0.0,
                alt_m: ecef.z.abs() - b
            }
        }

        let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
        let mut alt = 0.0;

        for _ in 0..MAX_LAT_ITERATIONS {
            let n = prime_vertical_radius(lat);
            alt = p / lat.cos() - n;
            let next = ecef.z.atan2(p * (1.0 - WGS84_E2 * n / (n + alt)));
            let step = (next - lat).abs();
            lat = next;

            if step < LAT_CONVERGENCE_RAD {
                break
            }
        }

        Self {
            lat_deg: lat.to_degrees(),
            lon_deg: lon.to_degrees(),
            alt_m: alt
        }
    }
}

impl LocalCoordinate {
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.north, self.east, self.down)
    }

    pub fn from_vector(v: Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Convert back to earth centred, earth fixed coordinates.
    pub fn to_geocentric(&self, origin: &Origin) -> GeocentricCoordinate {
        let rot = ecef_to_ned_rotation(&origin.geodetic);
        GeocentricCoordinate::from_vector(
            origin.ecef.as_vector() + rot.transpose() * self.as_vector()
        )
    }

    /// Course from this coordinate to `dest`, ignoring the vertical component.
    pub fn course_to(&self, dest: &LocalCoordinate) -> CourseVector {
        let north = dest.north - self.north;
        let east = dest.east - self.east;

        CourseVector {
            distance_m: north.hypot(east),
            bearing_deg: util::maths::bearing_deg(north, east)
        }
    }

    /// Horizontal distance to `other`.
    pub fn distance_to(&self, other: &LocalCoordinate) -> f64 {
        self.course_to(other).distance_m
    }
}

impl Origin {
    /// Build an origin from its geocentric coordinate, deriving the geodetic form.
    pub fn from_geocentric(ecef: GeocentricCoordinate) -> Self {
        Self {
            ecef,
            geodetic: GeodeticCoordinate::from_geocentric(&ecef)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Rotation from ECEF axes into the NED axes at the given position.
pub fn ecef_to_ned_rotation(at: &GeodeticCoordinate) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = at.lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = at.lon_deg.to_radians().sin_cos();

    Matrix3::new(
        -sin_lat * cos_lon, -sin_lat * sin_lon,  cos_lat,
        -sin_lon,            cos_lon,            0.0,
        -cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat
    )
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Radius of curvature in the prime vertical at the given latitude (radians).
fn prime_vertical_radius(lat_rad: f64) -> f64 {
    WGS84_A_M / (1.0 - WGS84_E2 * lat_rad.sin().powi(2)).sqrt()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn santa_cruz() -> Origin {
        Origin::from_geocentric(GeodeticCoordinate::new(36.96, -122.02, 10.0).to_geocentric())
    }

    #[test]
    fn test_geodetic_reference_points() {
        let equator = GeodeticCoordinate::new(0.0, 0.0, 0.0).to_geocentric();
        assert!((equator.x - WGS84_A_M).abs() < 1e-6);
        assert!(equator.y.abs() < 1e-6 && equator.z.abs() < 1e-6);

        let pole = GeodeticCoordinate::new(90.0, 0.0, 0.0).to_geocentric();
        assert!((pole.z - 6_356_752.314).abs() < 1e-3);

        let back = GeodeticCoordinate::from_geocentric(&pole);
        assert!((back.lat_deg - 90.0).abs() < 1e-9);
        assert!(back.alt_m.abs() < 1e-3);
    }

    #[test]
    fn test_geodetic_round_trip() {
        let geo = GeodeticCoordinate::new(-33.86, 151.21, 120.0);
        let back = GeodeticCoordinate::from_geocentric(&geo.to_geocentric());

        assert!((back.lat_deg - geo.lat_deg).abs() < 1e-8);
        assert!((back.lon_deg - geo.lon_deg).abs() < 1e-8);
        assert!((back.alt_m - geo.alt_m).abs() < 1e-3);
    }

    #[test]
    fn test_local_frame_axes() {
        let origin = santa_cruz();

        // A point straight up from the origin is negative down
        let up = GeodeticCoordinate::new(
            origin.geodetic.lat_deg, origin.geodetic.lon_deg, origin.geodetic.alt_m + 50.0
        ).to_geocentric();
        let ned = up.to_local(&origin);
        assert!(ned.north.abs() < 1e-3 && ned.east.abs() < 1e-3);
        assert!((ned.down + 50.0).abs() < 1e-3);

        // A small step east in longitude is east
        let east = GeodeticCoordinate::new(
            origin.geodetic.lat_deg, origin.geodetic.lon_deg + 0.001, origin.geodetic.alt_m
        ).to_geocentric();
        let ned = east.to_local(&origin);
        assert!(ned.east > 80.0 && ned.east < 95.0);
        assert!(ned.north.abs() < 0.1);
    }

    #[test]
    fn test_local_round_trip() {
        let origin = santa_cruz();
        let local = LocalCoordinate::new(120.0, -45.5, 0.0);
        let back = local.to_geocentric(&origin).to_local(&origin);

        assert!((back.north - local.north).abs() < 1e-6);
        assert!((back.east - local.east).abs() < 1e-6);
        assert!(back.down.abs() < 1e-6);
    }

    #[test]
    fn test_course_vector() {
        let here = LocalCoordinate::new(10.0, 10.0, 3.0);

        let c = here.course_to(&LocalCoordinate::new(13.0, 14.0, -20.0));
        assert!((c.distance_m - 5.0).abs() < 1e-9);
        assert!((c.bearing_deg - 53.130_102).abs() < 1e-5);

        let c = here.course_to(&LocalCoordinate::new(10.0, 0.0, 0.0));
        assert!((c.bearing_deg - 270.0).abs() < 1e-9);

        let c = here.course_to(&here);
        assert_eq!(c.distance_m, 0.0);
        assert!(c.bearing_deg >= 0.0 && c.bearing_deg < 360.0);
    }
}
