//! Cox and Munk (1954) sea-surface slope statistics and Fresnel optics.
//!
//! The per-pixel model evaluates the probability that a wind-roughened sea
//! surface tilts a facet so that direct sunlight is reflected into the
//! sensor, then weights it by the Fresnel reflectance at the facet's angle
//! of incidence.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Refractive index of sea water in the visible
pub const SEAWATER_REFRACTIVE_INDEX: f64 = 1.34;

/// Parameters of the glint model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoxMunkParams {
    /// Refractive index of the water body
    pub refractive_index: f64,
    /// Lower bound of the upwind slope variance, keeps a calm sea finite
    pub min_upwind_variance: f64,
}

impl Default for CoxMunkParams {
    fn default() -> Self {
        Self {
            refractive_index: SEAWATER_REFRACTIVE_INDEX,
            min_upwind_variance: 1e-6,
        }
    }
}

/// Gram-Charlier coefficients of the clean-surface slope distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeStatistics {
    /// Crosswind slope standard deviation
    pub sigma_c: f64,
    /// Upwind slope standard deviation
    pub sigma_u: f64,
    /// Skewness coefficients
    pub c21: f64,
    pub c03: f64,
    /// Peakedness coefficients
    pub c40: f64,
    pub c22: f64,
    pub c04: f64,
}

impl SlopeStatistics {
    /// Clean-surface fit of Cox and Munk (1954) for a wind speed in m/s
    pub fn clean_surface(wind_speed: f64, params: &CoxMunkParams) -> Self {
        let var_c = 0.003 + 0.00192 * wind_speed;
        let var_u = (0.00316 * wind_speed).max(params.min_upwind_variance);

        Self {
            sigma_c: var_c.sqrt(),
            sigma_u: var_u.sqrt(),
            c21: 0.01 - 0.0086 * wind_speed,
            c03: 0.04 - 0.033 * wind_speed,
            c40: 0.40,
            c22: 0.12,
            c04: 0.23,
        }
    }

    /// Slope probability density at crosswind/upwind slope components
    pub fn probability(&self, z_x: f64, z_y: f64) -> f64 {
        let xi = z_x / self.sigma_c;
        let eta = z_y / self.sigma_u;
        let xi2 = xi * xi;
        let eta2 = eta * eta;

        let skewness = -0.5 * self.c21 * (xi2 - 1.0) * eta
            - (self.c03 / 6.0) * (eta2 - 3.0) * eta;
        let peakedness = (self.c40 / 24.0) * (xi2 * xi2 - 6.0 * xi2 + 3.0)
            + 0.25 * self.c22 * (xi2 - 1.0) * (eta2 - 1.0)
            + (self.c04 / 24.0) * (eta2 * eta2 - 6.0 * eta2 + 3.0);

        let gaussian = (-0.5 * (xi2 + eta2)).exp() / (2.0 * PI * self.sigma_c * self.sigma_u);
        gaussian * (1.0 + skewness + peakedness)
    }
}

/// Model output for a single pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlintSample {
    pub glint: f64,
    pub fresnel: f64,
}

/// Fresnel reflectance of unpolarised light at incidence angle `omega` (radians)
pub fn fresnel_reflectance(omega: f64, refractive_index: f64) -> f64 {
    if omega.abs() < 1e-8 {
        let r = (refractive_index - 1.0) / (refractive_index + 1.0);
        return r * r;
    }

    let omega_t = (omega.sin() / refractive_index).clamp(-1.0, 1.0).asin();
    let rs = (omega - omega_t).sin() / (omega + omega_t).sin();
    let rp = (omega - omega_t).tan() / (omega + omega_t).tan();
    0.5 * (rs * rs + rp * rp)
}

/// Evaluate the glint model for one pixel.
///
/// Angles are in degrees. The caller is responsible for skipping nodata.
/// Negative Gram-Charlier tails are clamped to zero and grazing geometry
/// that overflows the tilt normalisation yields zero glint.
pub fn glint_sample(
    solar_zenith: f32,
    view_zenith: f32,
    relative_azimuth: f32,
    stats: &SlopeStatistics,
    params: &CoxMunkParams,
) -> GlintSample {
    let szen = (solar_zenith as f64).to_radians();
    let vzen = (view_zenith as f64).to_radians();
    let razi = (relative_azimuth as f64).to_radians();

    let (sin_szen, cos_szen) = szen.sin_cos();
    let (sin_vzen, cos_vzen) = vzen.sin_cos();
    let (sin_razi, cos_razi) = razi.sin_cos();

    // Angle of incidence on the reflecting facet
    let cos_2omega = (cos_szen * cos_vzen + sin_szen * sin_vzen * cos_razi).clamp(-1.0, 1.0);
    let omega = 0.5 * cos_2omega.acos();

    let fresnel = fresnel_reflectance(omega, params.refractive_index);

    // Facet tilt and slope components
    let cos_sum = cos_szen + cos_vzen;
    let cos_beta = cos_sum / (2.0 * omega.cos());
    let z_x = -sin_vzen * sin_razi / cos_sum;
    let z_y = (sin_szen + sin_vzen * cos_razi) / cos_sum;

    let probability = stats.probability(z_x, z_y).max(0.0);

    let glint = PI * fresnel * probability
        / (4.0 * cos_szen * cos_vzen * cos_beta.powi(4));

    let glint = if glint.is_finite() { glint.max(0.0) } else { 0.0 };
    let fresnel = if fresnel.is_finite() { fresnel } else { 0.0 };

    GlintSample { glint, fresnel }
}
