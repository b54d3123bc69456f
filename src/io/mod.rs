//! Raster and metadata collaborators

pub mod raster;
pub mod odc_metadata;

pub use raster::RasterLoader;
#[cfg(feature = "gdal")]
pub use raster::{GdalRasterLoader, load_singleband, save_geotiff};
pub use odc_metadata::{BandResolver, GeometryResolver, OdcMetadata};
