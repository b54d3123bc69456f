use crate::core::cox_munk::{glint_sample, CoxMunkParams, SlopeStatistics};
use crate::core::validation::{require_matching_shape, require_nonnegative, require_nontrivial};
use crate::types::{AngleRaster, FresnelField, GlintField, GlintImage, GlintResult, GLINT_NODATA};
use ndarray::{Array2, Zip};

/// Compute the Cox and Munk glint reflectance for a scene.
///
/// Inputs are validated in a fixed order before any pixel is modelled:
/// matching shapes, more than one distinct value per layer, then a
/// non-negative wind speed. A pixel that is nodata in any of the three
/// layers is `GLINT_NODATA` in the output.
pub fn coxmunk_backend(
    view_zenith: &AngleRaster,
    solar_zenith: &AngleRaster,
    relative_azimuth: &AngleRaster,
    wind_speed: f32,
    return_fresnel: bool,
) -> GlintResult<(GlintField, Option<FresnelField>)> {
    coxmunk_backend_with_params(
        view_zenith,
        solar_zenith,
        relative_azimuth,
        wind_speed,
        return_fresnel,
        &CoxMunkParams::default(),
    )
}

pub fn coxmunk_backend_with_params(
    view_zenith: &AngleRaster,
    solar_zenith: &AngleRaster,
    relative_azimuth: &AngleRaster,
    wind_speed: f32,
    return_fresnel: bool,
    params: &CoxMunkParams,
) -> GlintResult<(GlintField, Option<FresnelField>)> {
    validate_geometry(view_zenith, solar_zenith, relative_azimuth, wind_speed)?;
    Ok(model_glint(
        view_zenith,
        solar_zenith,
        relative_azimuth,
        wind_speed,
        return_fresnel,
        params,
    ))
}

/// Model an already validated scene.
pub(crate) fn model_glint(
    view_zenith: &AngleRaster,
    solar_zenith: &AngleRaster,
    relative_azimuth: &AngleRaster,
    wind_speed: f32,
    return_fresnel: bool,
    params: &CoxMunkParams,
) -> (GlintField, Option<FresnelField>) {
    let (rows, cols) = view_zenith.dim();
    log::info!(
        "Computing Cox and Munk glint for {}x{} pixels at {} m/s",
        rows,
        cols,
        wind_speed
    );

    let stats = SlopeStatistics::clean_surface(wind_speed as f64, params);
    log::debug!("Slope statistics: {:?}", stats);

    let (glint, fresnel) = if return_fresnel {
        let nodata = (GLINT_NODATA, GLINT_NODATA);
        let samples = map_valid_pixels(view_zenith, solar_zenith, relative_azimuth, nodata, |v, s, r| {
            let sample = glint_sample(s, v, r, &stats, params);
            (sample.glint as f32, sample.fresnel as f32)
        });
        let glint = GlintField {
            data: samples.mapv(|(g, _)| g),
        };
        let fresnel = FresnelField {
            data: samples.mapv(|(_, f)| f),
        };
        (glint, Some(fresnel))
    } else {
        let data = map_valid_pixels(view_zenith, solar_zenith, relative_azimuth, GLINT_NODATA, |v, s, r| {
            glint_sample(s, v, r, &stats, params).glint as f32
        });
        (GlintField { data }, None)
    };

    log::debug!(
        "Glint field has {} valid pixels out of {}",
        glint.valid_count(),
        rows * cols
    );

    (glint, fresnel)
}

/// Run every geometry check the model depends on.
pub fn validate_geometry(
    view_zenith: &AngleRaster,
    solar_zenith: &AngleRaster,
    relative_azimuth: &AngleRaster,
    wind_speed: f32,
) -> GlintResult<()> {
    require_matching_shape(&[
        ("view zenith", view_zenith.dim()),
        ("solar zenith", solar_zenith.dim()),
        ("relative azimuth", relative_azimuth.dim()),
    ])?;

    require_nontrivial(&view_zenith.data, view_zenith.nodata, "view zenith")?;
    require_nontrivial(&solar_zenith.data, solar_zenith.nodata, "solar zenith")?;
    require_nontrivial(&relative_azimuth.data, relative_azimuth.nodata, "relative azimuth")?;

    require_nonnegative(wind_speed)
}

/// Apply `model` to every pixel valid in all three layers, `nodata` elsewhere
fn map_valid_pixels<T, F>(
    view_zenith: &AngleRaster,
    solar_zenith: &AngleRaster,
    relative_azimuth: &AngleRaster,
    nodata: T,
    model: F,
) -> Array2<T>
where
    T: Copy + Send + Sync,
    F: Fn(f32, f32, f32) -> T + Send + Sync,
{
    let pixel = |&vzen: &f32, &szen: &f32, &razi: &f32| {
        if !view_zenith.is_valid(vzen) || !solar_zenith.is_valid(szen) || !relative_azimuth.is_valid(razi) {
            nodata
        } else {
            model(vzen, szen, razi)
        }
    };
    zip_pixels(&view_zenith.data, &solar_zenith.data, &relative_azimuth.data, pixel)
}

#[cfg(feature = "parallel")]
fn zip_pixels<T, F>(vzen: &GlintImage, szen: &GlintImage, razi: &GlintImage, pixel: F) -> Array2<T>
where
    T: Send,
    F: Fn(&f32, &f32, &f32) -> T + Send + Sync,
{
    Zip::from(vzen).and(szen).and(razi).par_map_collect(pixel)
}

#[cfg(not(feature = "parallel"))]
fn zip_pixels<T, F>(vzen: &GlintImage, szen: &GlintImage, razi: &GlintImage, pixel: F) -> Array2<T>
where
    F: Fn(&f32, &f32, &f32) -> T,
{
    Zip::from(vzen).and(szen).and(razi).map_collect(pixel)
}
