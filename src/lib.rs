//! deglint: Cox and Munk sun-glint correction for multispectral water imagery
//!
//! The crate models the specular reflection of sunlight off a wind-roughened
//! sea surface from per-pixel sun/sensor geometry and removes it from the
//! visible bands of a surface reflectance product.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    AngleRaster, BandSource, CorrectedBand, FresnelField, GeometryRole, GlintError, GlintField, GlintResult,
    Raster, RasterMeta, VisibleBand, GLINT_NODATA,
};

pub use crate::core::{
    coxmunk_backend, CorrectionEngine, CorrectionParams, CoxMunkOptions, CoxMunkParams, CoxMunkProduct,
    DeglintConfig, FixedPointScaling, GlintCorrector,
};

pub use io::{BandResolver, GeometryResolver, OdcMetadata, RasterLoader};

#[cfg(feature = "gdal")]
pub use io::GdalRasterLoader;

#[cfg(feature = "python")]
mod python {
    use crate::types::{AngleRaster, GeometryRole, GlintError};
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArrayDyn};
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    fn to_py_err(err: GlintError) -> PyErr {
        match err {
            GlintError::Shape { .. }
            | GlintError::DimensionMismatch(_)
            | GlintError::DegenerateInput(_)
            | GlintError::InvalidParameter(_)
            | GlintError::BandNotFound { .. } => PyErr::new::<PyValueError, _>(format!("{}", err)),
            _ => PyErr::new::<PyRuntimeError, _>(format!("{}", err)),
        }
    }

    fn angle_raster(role: GeometryRole, array: PyReadonlyArrayDyn<f32>, nodata: Option<f32>) -> PyResult<AngleRaster> {
        AngleRaster::new(role, array.as_array().to_owned(), nodata).map_err(to_py_err)
    }

    /// Cox and Munk glint reflectance (and optionally Fresnel reflectance)
    #[pyfunction]
    #[pyo3(signature = (view_zenith, solar_zenith, relative_azimuth, wind_speed, return_fresnel=false, nodata=None))]
    fn coxmunk_backend<'py>(
        py: Python<'py>,
        view_zenith: PyReadonlyArrayDyn<'py, f32>,
        solar_zenith: PyReadonlyArrayDyn<'py, f32>,
        relative_azimuth: PyReadonlyArrayDyn<'py, f32>,
        wind_speed: f32,
        return_fresnel: bool,
        nodata: Option<f32>,
    ) -> PyResult<(&'py PyArray2<f32>, Option<&'py PyArray2<f32>>)> {
        let vzen = angle_raster(GeometryRole::SatelliteView, view_zenith, nodata)?;
        let szen = angle_raster(GeometryRole::SolarZenith, solar_zenith, nodata)?;
        let razi = angle_raster(GeometryRole::RelativeAzimuth, relative_azimuth, nodata)?;

        let (glint, fresnel) = py
            .allow_threads(|| crate::core::coxmunk_backend(&vzen, &szen, &razi, wind_speed, return_fresnel))
            .map_err(to_py_err)?;

        Ok((
            glint.data.into_pyarray(py),
            fresnel.map(|f| f.data.into_pyarray(py)),
        ))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(coxmunk_backend, m)?)?;
        m.add("GLINT_NODATA", crate::types::GLINT_NODATA)?;
        Ok(())
    }
}
