//! Input checks that gate the glint model and the band correction.
//!
//! Every check is a pure predicate over loaded arrays. They are always run
//! in the order 2D -> shape -> single value -> wind speed, so a malformed
//! input reports the same error every time.

use crate::types::{is_nodata, GlintError, GlintImage, GlintResult};
use ndarray::{ArrayBase, ArrayD, Data, Ix2};
use std::collections::HashSet;

/// Convert a dynamic-dimensional array into a 2D image.
pub fn require_2d(array: ArrayD<f32>, name: &str) -> GlintResult<GlintImage> {
    let ndim = array.ndim();
    if ndim != 2 {
        return Err(GlintError::Shape {
            name: name.to_string(),
            ndim,
        });
    }

    array.into_dimensionality::<Ix2>().map_err(|_| GlintError::Shape {
        name: name.to_string(),
        ndim,
    })
}

/// Every named shape must equal the first one.
pub fn require_matching_shape(shapes: &[(&str, (usize, usize))]) -> GlintResult<()> {
    let Some(&(first_name, first_dim)) = shapes.first() else {
        return Ok(());
    };

    for &(name, dim) in &shapes[1..] {
        if dim != first_dim {
            return Err(GlintError::DimensionMismatch(format!(
                "{} has shape {:?} but {} has shape {:?}",
                name, dim, first_name, first_dim
            )));
        }
    }

    Ok(())
}

/// Fails when the array holds fewer than two distinct valid values.
///
/// An all-nodata raster has no valid values at all and is rejected too.
pub fn require_nontrivial<S>(array: &ArrayBase<S, Ix2>, nodata: Option<f32>, name: &str) -> GlintResult<()>
where
    S: Data<Elem = f32>,
{
    let mut seen = HashSet::with_capacity(2);
    for &value in array.iter() {
        if is_nodata(value, nodata) {
            continue;
        }
        // -0.0 and 0.0 are the same reflectance
        let key = if value == 0.0 { 0u32 } else { value.to_bits() };
        seen.insert(key);
        if seen.len() > 1 {
            return Ok(());
        }
    }

    log::debug!("{} has {} distinct valid value(s)", name, seen.len());
    Err(GlintError::DegenerateInput(name.to_string()))
}

pub fn require_nonnegative(wind_speed: f32) -> GlintResult<()> {
    // NaN fails the comparison and is rejected along with negatives
    if !(wind_speed >= 0.0) {
        return Err(GlintError::InvalidParameter(format!(
            "wind_speed must be greater than 0 m/s, got {}",
            wind_speed
        )));
    }
    Ok(())
}
