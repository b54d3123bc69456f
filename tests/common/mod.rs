#![allow(dead_code)]

use deglint::{
    BandResolver, BandSource, GeometryResolver, GeometryRole, GlintError, GlintResult, Raster, RasterLoader,
    RasterMeta,
};
use ndarray::{Array2, ArrayD};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ROWS: usize = 24;
pub const COLS: usize = 32;
pub const BAND_NODATA: f32 = -999.0;

/// Catalog backed by a fixed table of paths
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    pub geometry: HashMap<GeometryRole, PathBuf>,
    pub bands: Vec<BandSource>,
}

impl GeometryResolver for MemoryCatalog {
    fn resolve(&self, role: GeometryRole, _sub_product: &str) -> GlintResult<PathBuf> {
        self.geometry
            .get(&role)
            .cloned()
            .ok_or_else(|| GlintError::Metadata(format!("Unable to find '{}'", role)))
    }
}

impl BandResolver for MemoryCatalog {
    fn available_bands(&self, _sub_product: &str) -> Vec<BandSource> {
        self.bands.clone()
    }
}

/// Loader serving rasters from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    pub rasters: HashMap<PathBuf, Raster>,
}

impl MemoryLoader {
    pub fn insert(&mut self, path: &str, data: ArrayD<f32>, nodata: Option<f32>) {
        let shape = data.shape().to_vec();
        let meta = RasterMeta {
            nodata,
            width: shape.last().copied().unwrap_or(0),
            height: shape.first().copied().unwrap_or(0),
            geo_transform: None,
            projection: None,
        };
        self.rasters.insert(PathBuf::from(path), Raster { data, meta });
    }
}

impl RasterLoader for MemoryLoader {
    fn load(&self, path: &Path) -> GlintResult<Raster> {
        self.rasters.get(path).cloned().ok_or_else(|| {
            GlintError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
        })
    }
}

pub fn view_zenith(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(_, j)| 0.2 + 7.0 * j as f32 / cols as f32)
}

pub fn solar_zenith(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(i, j)| 38.0 + 0.05 * i as f32 + 0.02 * j as f32)
}

pub fn relative_azimuth(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(i, j)| 150.0 + 60.0 * (i + j) as f32 / (rows + cols) as f32)
}

/// Reflectance x 10000: water on the left half, land on the right
pub fn visible_band(band: usize, rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        if j < cols / 2 {
            300.0 + 10.0 * band as f32 + (i % 7) as f32
        } else {
            2500.0 + 25.0 * band as f32 + (j % 5) as f32
        }
    })
}

/// Geometry with a NaN collar on the first row, like a real swath edge
fn with_collar(mut data: Array2<f32>) -> ArrayD<f32> {
    data.row_mut(0).fill(f32::NAN);
    data.into_dyn()
}

/// A Landsat-like scene: geometry layers plus bands 1..7, band 7 is all nodata
pub fn synthetic_scene() -> (MemoryCatalog, MemoryLoader) {
    let mut catalog = MemoryCatalog::default();
    let mut loader = MemoryLoader::default();

    let geometry = [
        (GeometryRole::SatelliteView, "oa_satellite_view.tif", view_zenith(ROWS, COLS)),
        (GeometryRole::SolarZenith, "oa_solar_zenith.tif", solar_zenith(ROWS, COLS)),
        (GeometryRole::RelativeAzimuth, "oa_relative_azimuth.tif", relative_azimuth(ROWS, COLS)),
    ];
    for (role, path, data) in geometry {
        catalog.geometry.insert(role, PathBuf::from(path));
        loader.insert(path, with_collar(data), None);
    }

    let names = ["coastal_aerosol", "blue", "green", "red", "nir", "swir_1", "swir_2"];
    for (idx, name) in names.iter().enumerate() {
        let band = idx + 1;
        let path = format!("lmbadj_band{:02}.tif", band);
        let data = if band == 7 {
            Array2::from_elem((ROWS, COLS), BAND_NODATA)
        } else {
            let mut data = visible_band(band, ROWS, COLS);
            data[[5, 5]] = BAND_NODATA;
            data
        };
        loader.insert(&path, data.into_dyn(), Some(BAND_NODATA));
        catalog.bands.push(BandSource {
            band_id: band.to_string(),
            name: format!("lmbadj_{}", name),
            path: PathBuf::from(path),
        });
    }

    (catalog, loader)
}

/// Largest unbiased relative deviation between valid pixels of two rasters
pub fn urd(test: &Array2<f32>, expected: &Array2<f32>, nodata: Option<f32>) -> f32 {
    let is_valid = |v: f32| !v.is_nan() && nodata.map_or(true, |nd| v != nd);

    test.iter()
        .zip(expected.iter())
        .filter(|(a, b)| is_valid(**a) && is_valid(**b))
        .map(|(a, b)| {
            let mean = 0.5 * (a + b).abs();
            if mean == 0.0 {
                (a - b).abs()
            } else {
                (a - b).abs() / mean
            }
        })
        .fold(0.0, f32::max)
}
