use ndarray::{Array2, ArrayD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Float-domain nodata sentinel used by every field produced by the core
pub const GLINT_NODATA: f32 = f32::NAN;

/// Real-valued reflectance or angle data
pub type GlintReal = f32;

/// 2D real-valued raster (rows x columns)
pub type GlintImage = Array2<GlintReal>;

/// Returns true when `value` is a nodata pixel under `nodata`.
///
/// NaN is always treated as nodata, whether or not the raster declares it.
#[inline]
pub fn is_nodata(value: f32, nodata: Option<f32>) -> bool {
    value.is_nan() || nodata.map_or(false, |nd| value == nd)
}

/// Sun/sensor geometry layers required by the Cox and Munk model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryRole {
    SolarZenith,
    SatelliteView,
    RelativeAzimuth,
}

impl GeometryRole {
    /// Role string used by the metadata catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryRole::SolarZenith => "solar_zenith",
            GeometryRole::SatelliteView => "satellite_view",
            GeometryRole::RelativeAzimuth => "relative_azimuth",
        }
    }
}

impl std::fmt::Display for GeometryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

/// Metadata carried alongside a loaded raster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterMeta {
    pub nodata: Option<f32>,
    pub width: usize,
    pub height: usize,
    pub geo_transform: Option<GeoTransform>,
    pub projection: Option<String>,
}

/// A raster as handed over by a loader, before any dimensionality check
#[derive(Debug, Clone)]
pub struct Raster {
    pub data: ArrayD<GlintReal>,
    pub meta: RasterMeta,
}

/// One of the three per-pixel geometry layers, in degrees
#[derive(Debug, Clone)]
pub struct AngleRaster {
    pub role: GeometryRole,
    pub data: GlintImage,
    pub nodata: Option<f32>,
}

impl AngleRaster {
    /// Build an angle raster, failing with `GlintError::Shape` unless the data is 2D
    pub fn new(role: GeometryRole, data: ArrayD<GlintReal>, nodata: Option<f32>) -> GlintResult<Self> {
        let data = crate::core::validation::require_2d(data, role.as_str())?;
        Ok(Self { role, data, nodata })
    }

    pub fn from_raster(role: GeometryRole, raster: Raster) -> GlintResult<Self> {
        Self::new(role, raster.data, raster.meta.nodata)
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_valid(&self, value: f32) -> bool {
        !is_nodata(value, self.nodata)
    }
}

/// Modelled glint reflectance, nodata is always `GLINT_NODATA`
#[derive(Debug, Clone)]
pub struct GlintField {
    pub data: GlintImage,
}

impl GlintField {
    pub fn nodata(&self) -> f32 {
        GLINT_NODATA
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Fresnel reflectance component of the glint model
#[derive(Debug, Clone)]
pub struct FresnelField {
    pub data: GlintImage,
}

impl FresnelField {
    pub fn nodata(&self) -> f32 {
        GLINT_NODATA
    }
}

/// Location of a visible band, as resolved by the band collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSource {
    /// Band number as a string key, e.g. "3"
    pub band_id: String,
    /// Measurement name, e.g. "lmbadj_green"
    pub name: String,
    pub path: PathBuf,
}

/// A visible band loaded for correction
#[derive(Debug, Clone)]
pub struct VisibleBand {
    pub band_id: String,
    pub name: String,
    pub data: GlintImage,
    pub nodata: Option<f32>,
}

impl VisibleBand {
    pub fn new(band_id: &str, name: &str, data: ArrayD<GlintReal>, nodata: Option<f32>) -> GlintResult<Self> {
        let data = crate::core::validation::require_2d(data, name)?;
        Ok(Self {
            band_id: band_id.to_string(),
            name: name.to_string(),
            data,
            nodata,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Sentinel written into corrected output for invalid pixels
    pub fn output_nodata(&self) -> f32 {
        self.nodata.unwrap_or(GLINT_NODATA)
    }
}

/// A deglinted visible band
#[derive(Debug, Clone)]
pub struct CorrectedBand {
    pub band_id: String,
    pub name: String,
    pub data: GlintImage,
    pub nodata: f32,
}

impl CorrectedBand {
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Error types for glint modelling and correction
#[derive(Debug, thiserror::Error)]
pub enum GlintError {
    #[error("{name} must be two-dimensional, got {ndim} dimension(s)")]
    Shape { name: String, ndim: usize },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("{0} only contains a single value")]
    DegenerateInput(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("band id {band_id} is missing from bands {available:?}")]
    BandNotFound { band_id: String, available: Vec<String> },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for glint operations
pub type GlintResult<T> = Result<T, GlintError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_is_nodata() {
        assert!(is_nodata(f32::NAN, None));
        assert!(is_nodata(f32::NAN, Some(-999.0)));
        assert!(is_nodata(-999.0, Some(-999.0)));
        assert!(!is_nodata(-999.0, None));
        assert!(!is_nodata(12.5, Some(-999.0)));
    }

    #[test]
    fn test_angle_raster_requires_2d() {
        let cube = ArrayD::<f32>::zeros(IxDyn(&[2, 3, 4]));
        let err = AngleRaster::new(GeometryRole::SatelliteView, cube, None).unwrap_err();
        assert!(matches!(err, GlintError::Shape { ndim: 3, .. }));

        let plane = ArrayD::<f32>::zeros(IxDyn(&[3, 4]));
        let raster = AngleRaster::new(GeometryRole::SatelliteView, plane, None).unwrap();
        assert_eq!(raster.dim(), (3, 4));
    }

    #[test]
    fn test_error_messages() {
        let err = GlintError::BandNotFound {
            band_id: "20".to_string(),
            available: vec!["1".to_string(), "2".to_string()],
        };
        assert!(err.to_string().contains("is missing from bands"));

        let err = GlintError::DegenerateInput("view zenith".to_string());
        assert!(err.to_string().contains("only contains a single value"));

        let err = GlintError::DimensionMismatch("(2, 2) vs (4, 4)".to_string());
        assert!(err.to_string().contains("Dimension mismatch"));
    }

    #[test]
    fn test_geotransform_round_trip() {
        let gt = [500000.0, 30.0, 0.0, 6000000.0, 0.0, -30.0];
        assert_eq!(GeoTransform::from_gdal(gt).to_gdal(), gt);
    }
}
