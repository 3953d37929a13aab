//! Vincenty inverse geodesic on the ellipsoid
//!
//! Reference:
//! Vincenty, T. (1975). Direct and inverse solutions of geodesics on the
//! ellipsoid with application of nested equations. Survey Review 23(176).

const WGS84_A: f64 = 6_378_137.0; // semi-major axis (m)
const WGS84_F: f64 = 1.0 / 298.257_223_563; // flattening

/// Ellipsoid parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major: f64,
    pub flattening: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid {
    pub fn wgs84() -> Self {
        Self {
            semi_major: WGS84_A,
            flattening: WGS84_F,
        }
    }
}

/// Solution of the inverse problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodesic {
    /// Ellipsoidal distance (m)
    pub distance: f64,
    /// Forward azimuth at the first point, degrees clockwise from north in [0, 360)
    pub azimuth: f64,
}

/// Geodesic distance and initial azimuth between two lon/lat points (degrees).
///
/// Returns `None` for coincident points, where the azimuth is undefined.
pub fn inverse(lon1: f64, lat1: f64, lon2: f64, lat2: f64, ellipsoid: &Ellipsoid) -> Option<Geodesic> {
    let a = ellipsoid.semi_major;
    let f = ellipsoid.flattening;
    let b = a * (1.0 - f);

    let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
    let l = (lon2 - lon1).to_radians();

    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let azimuth = |lambda: f64| {
        let (sin_l, cos_l) = lambda.sin_cos();
        let alpha = (cos_u2 * sin_l).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_l);
        alpha.to_degrees().rem_euclid(360.0)
    };

    let mut lambda = l;

    for _ in 0..200 {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        if sin_sigma < 1e-15 {
            return None;
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos2_alpha = 1.0 - sin_alpha * sin_alpha;

        // Equatorial lines have cos²α = 0
        let cos_2sigma_m = if cos2_alpha > 1e-15 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos2_alpha
        } else {
            0.0
        };

        let c = f / 16.0 * cos2_alpha * (4.0 + f * (4.0 - 3.0 * cos2_alpha));
        let lambda_prev = lambda;
        lambda = l + (1.0 - c) * f * sin_alpha
            * (sigma + c * sin_sigma
                * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - lambda_prev).abs() < 1e-12 {
            let u_sq = cos2_alpha * (a * a - b * b) / (b * b);
            let big_a = 1.0 + u_sq / 16384.0
                * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b * sin_sigma
                * (cos_2sigma_m + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0 * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

            return Some(Geodesic {
                distance: b * big_a * (sigma - delta_sigma),
                azimuth: azimuth(lambda),
            });
        }
    }

    // Nearly antipodal: fall back to the spherical solution
    let central = (sin_u1 * sin_u2 + cos_u1 * cos_u2 * l.cos()).clamp(-1.0, 1.0).acos();
    Some(Geodesic {
        distance: a * central,
        azimuth: azimuth(l),
    })
}

/// Axial bearing from point 1 to point 2: the azimuth reduced modulo 180°,
/// so a direction and its opposite coincide. NaN for coincident points.
pub fn axial_bearing(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    inverse(lon1, lat1, lon2, lat2, &Ellipsoid::wgs84())
        .map_or(f64::NAN, |g| g.azimuth.rem_euclid(180.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_distance() {
        // Flinders Peak to Buninyong (Vincenty's own test line)
        let g = inverse(
            144.0 + 25.0 / 60.0 + 29.52440 / 3600.0,
            -(37.0 + 57.0 / 60.0 + 3.72030 / 3600.0),
            143.0 + 55.0 / 60.0 + 35.38390 / 3600.0,
            -(37.0 + 39.0 / 60.0 + 10.15610 / 3600.0),
            &Ellipsoid::default(),
        )
        .unwrap();
        assert_relative_eq!(g.distance, 54_972.27, epsilon = 0.5);
        assert_relative_eq!(g.azimuth, 306.0 + 52.0 / 60.0 + 5.37 / 3600.0, epsilon = 1e-3);
    }

    #[test]
    fn test_cardinal_azimuths() {
        let north = inverse(150.0, -30.0, 150.0, -29.99, &Ellipsoid::default()).unwrap();
        assert_relative_eq!(north.azimuth, 0.0, epsilon = 1e-6);
        let east = inverse(150.0, 0.0, 150.01, 0.0, &Ellipsoid::default()).unwrap();
        assert_relative_eq!(east.azimuth, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_axial_bearing_folds_opposites() {
        let ab = axial_bearing(150.0, -30.0, 150.01, -30.01);
        let ba = axial_bearing(150.01, -30.01, 150.0, -30.0);
        assert!((0.0..180.0).contains(&ab));
        // Differs only by meridian convergence over the short line
        assert_relative_eq!(ab, ba, epsilon = 0.01);
        assert!(axial_bearing(150.0, -30.0, 150.0, -30.0).is_nan());
    }
}
