use crate::predict::EARTH_ROTATION_RAD_S;

// WGS-84
const SEMI_MAJOR_AXIS_KM: f64 = 6378.137;
const ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

/// Observer on the WGS-84 ellipsoid with its ECEF position precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    ecef_km: [f64; 3],
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
        let n = SEMI_MAJOR_AXIS_KM / (1.0 - ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        let alt_km = altitude_m / 1000.0;
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
            ecef_km: [
                (n + alt_km) * cos_lat * cos_lon,
                (n + alt_km) * cos_lat * sin_lon,
                (n * (1.0 - ECCENTRICITY_SQ) + alt_km) * sin_lat,
            ],
        }
    }

    /// Parses "lat,lon" in degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: f64) -> Option<Self> {
        let (lat, lon) = coordinates.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=360.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon, altitude_m))
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        self.ecef_km
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        [
            -EARTH_ROTATION_RAD_S * self.ecef_km[1],
            EARTH_ROTATION_RAD_S * self.ecef_km[0],
            0.0,
        ]
    }

    /// Rotates an ECEF offset from the observer into (east, north, up).
    pub fn to_enu(&self, dr: [f64; 3]) -> [f64; 3] {
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();
        [
            -sin_lon * dr[0] + cos_lon * dr[1],
            -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2],
            cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2],
        ]
    }
}
