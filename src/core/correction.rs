use crate::core::validation::require_matching_shape;
use crate::types::{is_nodata, CorrectedBand, GlintField, GlintResult, VisibleBand};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Parameters of the band correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionParams {
    /// Factor taking glint reflectance onto the band's reflectance units
    pub scale: f32,
    /// Lowest value a corrected water pixel may take
    pub floor: f32,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            // Surface reflectance products store reflectance x 10000
            scale: 10000.0,
            floor: 0.0,
        }
    }
}

/// Subtracts modelled glint from visible bands over water
pub struct CorrectionEngine {
    params: CorrectionParams,
}

impl CorrectionEngine {
    pub fn new(params: CorrectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CorrectionParams {
        &self.params
    }

    /// Deglint a single band.
    ///
    /// Pixels below `water_val` get `band - scale * glint`, clamped to the
    /// floor. Everything else is passed through. A pixel that is nodata in
    /// either the band or the glint field is written as the band's nodata.
    pub fn correct(&self, band: &VisibleBand, glint: &GlintField, water_val: f32) -> GlintResult<CorrectedBand> {
        require_matching_shape(&[("glint field", glint.dim()), (band.name.as_str(), band.dim())])?;

        log::debug!(
            "Correcting band {} ({}) with water threshold {}",
            band.band_id,
            band.name,
            water_val
        );

        let CorrectionParams { scale, floor } = self.params;
        let band_nodata = band.nodata;
        let out_nodata = band.output_nodata();

        let data = Zip::from(&band.data)
            .and(&glint.data)
            .map_collect(|&value, &g| {
                if is_nodata(value, band_nodata) || g.is_nan() {
                    out_nodata
                } else if value < water_val {
                    (value - scale * g).max(floor)
                } else {
                    value
                }
            });

        Ok(CorrectedBand {
            band_id: band.band_id.clone(),
            name: band.name.clone(),
            data,
            nodata: out_nodata,
        })
    }

    /// Deglint several bands against the same glint field.
    ///
    /// Every band is checked before any is corrected, so one bad band fails
    /// the whole request.
    pub fn correct_bands(
        &self,
        bands: &[VisibleBand],
        glint: &GlintField,
        water_val: f32,
    ) -> GlintResult<Vec<CorrectedBand>> {
        for band in bands {
            require_matching_shape(&[("glint field", glint.dim()), (band.name.as_str(), band.dim())])?;
        }

        self.correct_each(bands, glint, water_val)
    }

    #[cfg(feature = "parallel")]
    fn correct_each(&self, bands: &[VisibleBand], glint: &GlintField, water_val: f32) -> GlintResult<Vec<CorrectedBand>> {
        use rayon::prelude::*;

        bands
            .par_iter()
            .map(|band| self.correct(band, glint, water_val))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn correct_each(&self, bands: &[VisibleBand], glint: &GlintField, water_val: f32) -> GlintResult<Vec<CorrectedBand>> {
        bands
            .iter()
            .map(|band| self.correct(band, glint, water_val))
            .collect()
    }
}

impl Default for CorrectionEngine {
    fn default() -> Self {
        Self::new(CorrectionParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlintError, GLINT_NODATA};
    use ndarray::{array, Array2};

    fn band(id: &str, data: Array2<f32>, nodata: Option<f32>) -> VisibleBand {
        VisibleBand::new(id, &format!("lmbadj_{}", id), data.into_dyn(), nodata).unwrap()
    }

    fn engine(scale: f32) -> CorrectionEngine {
        CorrectionEngine::new(CorrectionParams { scale, floor: 0.0 })
    }

    #[test]
    fn test_water_pixels_are_corrected() {
        let b = band("3", array![[100.0, 200.0], [300.0, 5000.0]], Some(-999.0));
        let glint = GlintField {
            data: array![[0.0625, 0.125], [0.25, 0.125]],
        };

        let out = engine(1000.0).correct(&b, &glint, 1000.0).unwrap();
        assert_eq!(out.data, array![[37.5, 75.0], [50.0, 5000.0]]);
        assert_eq!(out.nodata, -999.0);
        assert_eq!(out.band_id, "3");
    }

    #[test]
    fn test_water_threshold_is_exclusive() {
        let b = band("3", array![[999.0, 1000.0], [1001.0, 500.0]], Some(-999.0));
        let glint = GlintField {
            data: Array2::from_elem((2, 2), 0.0625),
        };

        let out = engine(1000.0).correct(&b, &glint, 1000.0).unwrap();
        assert_eq!(out.data[[0, 0]], 936.5);
        // A pixel equal to the water value is not water
        assert_eq!(out.data[[0, 1]], 1000.0);
        assert_eq!(out.data[[1, 0]], 1001.0);
        assert_eq!(out.data[[1, 1]], 437.5);
    }

    #[test]
    fn test_negative_results_clamp_to_floor() {
        let b = band("2", array![[10.0, 20.0], [30.0, 40.0]], None);
        let glint = GlintField {
            data: Array2::from_elem((2, 2), 0.5),
        };

        let clamped = CorrectionEngine::new(CorrectionParams { scale: 100.0, floor: 1.0 })
            .correct(&b, &glint, 1000.0)
            .unwrap();
        assert!(clamped.data.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_nodata_propagation() {
        let b = band("4", array![[-999.0, 200.0], [300.0, 400.0]], Some(-999.0));
        let glint = GlintField {
            data: array![[0.0625, GLINT_NODATA], [0.0625, 0.0625]],
        };

        let out = engine(1000.0).correct(&b, &glint, 1000.0).unwrap();
        assert_eq!(out.data[[0, 0]], -999.0);
        assert_eq!(out.data[[0, 1]], -999.0);
        assert_eq!(out.data[[1, 0]], 237.5);
    }

    #[test]
    fn test_band_without_nodata_uses_nan() {
        let b = band("1", array![[f32::NAN, 200.0], [300.0, 400.0]], None);
        let glint = GlintField {
            data: Array2::from_elem((2, 2), 0.0),
        };

        let out = engine(10000.0).correct(&b, &glint, 1000.0).unwrap();
        assert!(out.nodata.is_nan());
        assert!(out.data[[0, 0]].is_nan());
        assert_eq!(out.data[[1, 1]], 400.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let b = band("3", Array2::from_elem((4, 4), 100.0), None);
        let glint = GlintField {
            data: Array2::from_elem((2, 2), 0.01),
        };

        let err = engine(1.0).correct(&b, &glint, 10.0).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));

        let err = engine(1.0).correct_bands(&[b], &glint, 10.0).unwrap_err();
        assert!(matches!(err, GlintError::DimensionMismatch(_)));
    }

    #[test]
    fn test_correction_is_idempotent() {
        let data = Array2::from_shape_fn((16, 16), |(i, j)| (i * 16 + j) as f32 * 3.0);
        let b = band("3", data, Some(-999.0));
        let glint = GlintField {
            data: Array2::from_shape_fn((16, 16), |(i, j)| 0.001 * ((i + j) % 5) as f32),
        };

        let eng = engine(10000.0);
        let first = eng.correct(&b, &glint, 500.0).unwrap();
        let second = eng.correct(&b, &glint, 500.0).unwrap();
        assert!(first
            .data
            .iter()
            .zip(second.data.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
        assert_eq!(first.dim(), b.dim());
    }

    #[test]
    fn test_correct_bands_keeps_order() {
        let bands = vec![
            band("2", Array2::from_elem((3, 3), 10.0), None),
            band("3", Array2::from_elem((3, 3), 20.0), None),
            band("4", Array2::from_elem((3, 3), 30.0), None),
        ];
        let glint = GlintField {
            data: Array2::from_elem((3, 3), 0.0),
        };

        let out = engine(1.0).correct_bands(&bands, &glint, 100.0).unwrap();
        let ids: Vec<&str> = out.iter().map(|b| b.band_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }
}
