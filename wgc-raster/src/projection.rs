use crate::coords::{GeoBounds, GeoPoint, GridPoint};
use crate::error::RasterError;

// WGS84 ellipsoid
const SEMI_MAJOR: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM is undefined poleward of 84 degrees.
const MAX_UTM_LATITUDE: f64 = 84.0;

/// A Universal Transverse Mercator projection on the WGS84 ellipsoid.
///
/// Forward and inverse are the USGS (Snyder) series, accurate to well under
/// a millimeter inside a zone. The same projection value must be used for
/// grid building, crossmapping and inverse export so coordinates never
/// drift between stages.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct UtmProjection {
    pub zone: u8,
    pub northern: bool,
}

impl UtmProjection {
    /// The UTM zone containing a longitude.
    pub fn zone_for(lon: f64) -> u8 {
        let zone = ((lon + 180.0) / 6.0).floor() as i32 + 1;
        zone.clamp(1, 60) as u8
    }

    /// Pick the zone of a bounding box's centroid.
    pub fn for_bounds(bounds: &GeoBounds) -> Result<UtmProjection, RasterError> {
        let center = bounds.center();
        if center.lat.abs() > MAX_UTM_LATITUDE {
            return Err(RasterError::Projection {
                reason: format!("latitude {} is outside the UTM domain", center.lat),
            });
        }
        Ok(UtmProjection {
            zone: UtmProjection::zone_for(center.lon),
            northern: center.lat >= 0.0,
        })
    }

    /// Central meridian of this zone, in degrees.
    pub fn central_meridian(&self) -> f64 {
        (self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }

    /// Project a geographic coordinate to easting/northing meters.
    pub fn forward(&self, p: &GeoPoint) -> Result<GridPoint, RasterError> {
        if !p.lon.is_finite() || !p.lat.is_finite() {
            return Err(RasterError::Projection {
                reason: "non-finite coordinate".to_string(),
            });
        }
        if p.lat.abs() > MAX_UTM_LATITUDE {
            return Err(RasterError::Projection {
                reason: format!("latitude {} is outside the UTM domain", p.lat),
            });
        }

        let e2 = FLATTENING * (2.0 - FLATTENING);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let phi = p.lat.to_radians();
        let dlam = (p.lon - self.central_meridian()).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = SEMI_MAJOR / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * dlam;

        let m = SEMI_MAJOR
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let x = SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;

        let mut y = SCALE_FACTOR
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
        if !self.northern {
            y += FALSE_NORTHING_SOUTH;
        }

        Ok(GridPoint { x, y })
    }

    /// Invert easting/northing meters back to a geographic coordinate.
    pub fn inverse(&self, p: &GridPoint) -> GeoPoint {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let x = p.x - FALSE_EASTING;
        let y = if self.northern {
            p.y
        } else {
            p.y - FALSE_NORTHING_SOUTH
        };

        let m = y / SCALE_FACTOR;
        let mu = m / (SEMI_MAJOR * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = SEMI_MAJOR / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = SEMI_MAJOR * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * SCALE_FACTOR);

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let dlam = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

        GeoPoint {
            lon: self.central_meridian() + dlam.to_degrees(),
            lat: phi.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_for() {
        assert_eq!(UtmProjection::zone_for(-121.5), 10); // Pacific Northwest
        assert_eq!(UtmProjection::zone_for(-0.1), 30);
        assert_eq!(UtmProjection::zone_for(0.1), 31);
        assert_eq!(UtmProjection::zone_for(179.9), 60);
        assert_eq!(UtmProjection::zone_for(-180.0), 1);
    }

    #[test]
    fn test_for_bounds_picks_centroid_zone() {
        let b = GeoBounds::new(-121.8, 47.8, -121.0, 48.6).unwrap();
        let proj = UtmProjection::for_bounds(&b).unwrap();
        assert_eq!(proj.zone, 10);
        assert!(proj.northern);
        assert_eq!(proj.central_meridian(), -123.0);
    }

    #[test]
    fn test_known_point() {
        // Seattle-ish reference point, UTM zone 10N
        let proj = UtmProjection { zone: 10, northern: true };
        let p = proj
            .forward(&GeoPoint { lon: -122.3321, lat: 47.6062 })
            .unwrap();
        // Expected easting/northing, a few meters of slack
        assert!((p.x - 550_200.0).abs() < 200.0, "easting {}", p.x);
        assert!((p.y - 5_272_700.0).abs() < 200.0, "northing {}", p.y);
    }

    #[test]
    fn test_round_trip_tolerance() {
        let proj = UtmProjection { zone: 10, northern: true };
        for &(lon, lat) in &[
            (-121.6, 47.9),
            (-121.4, 48.2),
            (-121.1, 48.5),
            (-123.0, 45.0),
            (-120.0, 49.0),
        ] {
            let forward = proj.forward(&GeoPoint { lon, lat }).unwrap();
            let back = proj.inverse(&forward);
            assert!((back.lon - lon).abs() < 1e-6, "lon {} -> {}", lon, back.lon);
            assert!((back.lat - lat).abs() < 1e-6, "lat {} -> {}", lat, back.lat);
        }
    }

    #[test]
    fn test_southern_hemisphere_round_trip() {
        let proj = UtmProjection { zone: 19, northern: false };
        let p = GeoPoint { lon: -70.6, lat: -33.4 };
        let forward = proj.forward(&p).unwrap();
        assert!(forward.y > 0.0); // false northing applied
        let back = proj.inverse(&forward);
        assert!((back.lon - p.lon).abs() < 1e-6);
        assert!((back.lat - p.lat).abs() < 1e-6);
    }

    #[test]
    fn test_polar_latitude_rejected() {
        let proj = UtmProjection { zone: 10, northern: true };
        assert!(matches!(
            proj.forward(&GeoPoint { lon: -121.0, lat: 89.0 }),
            Err(RasterError::Projection { .. })
        ));
    }
}
