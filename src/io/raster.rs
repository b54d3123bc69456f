use crate::types::{GlintResult, Raster};
use std::path::Path;

#[cfg(feature = "gdal")]
use crate::types::{GeoTransform, GlintError, RasterMeta};
#[cfg(feature = "gdal")]
use gdal::{Dataset, DriverManager};
#[cfg(feature = "gdal")]
use ndarray::Array2;

/// Source of single-band rasters
pub trait RasterLoader {
    fn load(&self, path: &Path) -> GlintResult<Raster>;
}

/// Reads the first band of any GDAL-readable raster
#[cfg(feature = "gdal")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalRasterLoader;

#[cfg(feature = "gdal")]
impl RasterLoader for GdalRasterLoader {
    fn load(&self, path: &Path) -> GlintResult<Raster> {
        load_singleband(path)
    }
}

/// Load band 1 of a raster together with its nodata value and georeferencing
#[cfg(feature = "gdal")]
pub fn load_singleband<P: AsRef<Path>>(path: P) -> GlintResult<Raster> {
    log::debug!("Loading raster: {}", path.as_ref().display());

    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();

    let rasterband = dataset.rasterband(1)?;
    let nodata = rasterband.no_data_value().map(|v| v as f32);
    let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let data = Array2::from_shape_vec((height, width), band_data.data)
        .map_err(|e| GlintError::Processing(format!("Failed to reshape raster data: {}", e)))?;

    let geo_transform = dataset.geo_transform().ok().map(GeoTransform::from_gdal);
    let projection = Some(dataset.projection()).filter(|p| !p.is_empty());

    log::debug!("Raster size: {}x{}, nodata: {:?}", width, height, nodata);

    Ok(Raster {
        data: data.into_dyn(),
        meta: RasterMeta {
            nodata,
            width,
            height,
            geo_transform,
            projection,
        },
    })
}

/// Write a single-band GeoTIFF carrying the georeferencing of `meta`
#[cfg(feature = "gdal")]
pub fn save_geotiff<T, P>(image: &Array2<T>, nodata: f64, meta: &RasterMeta, output_path: P) -> GlintResult<()>
where
    T: gdal::raster::GdalType + Copy,
    P: AsRef<Path>,
{
    log::info!("Saving GeoTIFF: {}", output_path.as_ref().display());

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = image.dim();

    let mut dataset = driver.create_with_band_type::<T, _>(
        output_path.as_ref(),
        width as isize,
        height as isize,
        1,
    )?;

    if let Some(transform) = meta.geo_transform {
        dataset.set_geo_transform(&transform.to_gdal())?;
    }
    if let Some(projection) = &meta.projection {
        dataset.set_projection(projection)?;
    }

    let mut rasterband = dataset.rasterband(1)?;
    let flat_data: Vec<T> = image.iter().copied().collect();
    let buffer = gdal::raster::Buffer::new((width, height), flat_data);
    rasterband.write((0, 0), (width, height), &buffer)?;
    rasterband.set_no_data_value(Some(nodata))?;

    Ok(())
}
