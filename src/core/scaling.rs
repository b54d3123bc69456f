use crate::types::{FresnelField, GlintField, GlintImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Float to int16 conversion applied when glint products leave the crate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPointScaling {
    /// Multiplier applied to valid reflectance values
    pub scale_factor: f32,
    /// Integer written for `GLINT_NODATA` pixels
    pub nodata: i16,
}

impl Default for FixedPointScaling {
    fn default() -> Self {
        Self {
            scale_factor: 10000.0,
            nodata: -999,
        }
    }
}

impl FixedPointScaling {
    /// Scale and truncate towards zero; NaN becomes the nodata sentinel.
    ///
    /// Values beyond the i16 range saturate.
    pub fn convert(&self, data: &GlintImage) -> Array2<i16> {
        data.mapv(|v| {
            if v.is_nan() {
                self.nodata
            } else {
                (v * self.scale_factor) as i16
            }
        })
    }

    pub fn to_fixed_point(&self, glint: &GlintField) -> Array2<i16> {
        self.convert(&glint.data)
    }

    pub fn fresnel_to_fixed_point(&self, fresnel: &FresnelField) -> Array2<i16> {
        self.convert(&fresnel.data)
    }

    /// Inverse conversion back to reflectance, nodata becomes NaN
    pub fn to_reflectance(&self, data: &Array2<i16>) -> GlintImage {
        data.mapv(|v| {
            if v == self.nodata {
                f32::NAN
            } else {
                v as f32 / self.scale_factor
            }
        })
    }
}
