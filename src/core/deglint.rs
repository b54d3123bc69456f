use crate::core::correction::{CorrectionEngine, CorrectionParams};
use crate::core::cox_munk::CoxMunkParams;
use crate::core::glint_field::{model_glint, validate_geometry};
use crate::core::scaling::FixedPointScaling;
use crate::core::validation::{require_matching_shape, require_nontrivial};
use crate::io::{BandResolver, GeometryResolver, RasterLoader};
use crate::types::{
    AngleRaster, BandSource, CorrectedBand, FresnelField, GeometryRole, GlintField, GlintResult, RasterMeta,
    VisibleBand,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables of the whole deglint pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeglintConfig {
    pub cox_munk: CoxMunkParams,
    pub correction: CorrectionParams,
    pub fixed_point: FixedPointScaling,
}

impl DeglintConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> GlintResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Optional overrides of the geometry files found in the catalog
#[derive(Debug, Clone, Default)]
pub struct CoxMunkOptions {
    pub vzen_file: Option<PathBuf>,
    pub szen_file: Option<PathBuf>,
    pub razi_file: Option<PathBuf>,
    pub return_fresnel: bool,
}

/// Result of a Cox and Munk deglint run
#[derive(Debug, Clone)]
pub struct CoxMunkProduct {
    /// Corrected bands in request order
    pub bands: Vec<CorrectedBand>,
    pub sources: Vec<BandSource>,
    pub band_meta: Vec<RasterMeta>,
    pub glint: GlintField,
    pub fresnel: Option<FresnelField>,
    pub glint_meta: RasterMeta,
    pub wind_speed: f32,
    pub water_val: f32,
}

impl CoxMunkProduct {
    pub fn band(&self, band_id: &str) -> Option<&CorrectedBand> {
        self.bands.iter().find(|b| b.band_id == band_id)
    }
}

/// Sun-glint correction of one dataset
pub struct GlintCorrector<C, L> {
    catalog: C,
    loader: L,
    sub_product: String,
    config: DeglintConfig,
}

#[cfg(feature = "gdal")]
impl GlintCorrector<crate::io::OdcMetadata, crate::io::GdalRasterLoader> {
    /// Corrector over an ODC dataset read through GDAL
    pub fn from_odc_metadata<P: AsRef<Path>>(metadata_file: P, sub_product: &str) -> GlintResult<Self> {
        let catalog = crate::io::OdcMetadata::from_file(metadata_file)?;
        Ok(Self::new(catalog, crate::io::GdalRasterLoader, sub_product))
    }
}

impl<C, L> GlintCorrector<C, L>
where
    C: GeometryResolver + BandResolver,
    L: RasterLoader,
{
    pub fn new(catalog: C, loader: L, sub_product: &str) -> Self {
        Self {
            catalog,
            loader,
            sub_product: sub_product.to_string(),
            config: DeglintConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DeglintConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DeglintConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Path of a geometry layer from the catalog
    pub fn find_file(&self, role: GeometryRole) -> GlintResult<PathBuf> {
        self.catalog.resolve(role, &self.sub_product)
    }

    /// Deglint the requested visible bands with the Cox and Munk model.
    ///
    /// Every input is loaded and validated before the glint field is
    /// computed; the first invalid input aborts the whole request.
    pub fn cox_munk(
        &self,
        vis_bands: &[&str],
        wind_speed: f32,
        water_val: f32,
        options: &CoxMunkOptions,
    ) -> GlintResult<CoxMunkProduct> {
        log::info!(
            "Cox and Munk deglint of bands {:?} ({}), wind speed {} m/s, water value {}",
            vis_bands,
            self.sub_product,
            wind_speed,
            water_val
        );

        let sources = self.catalog.resolve_bands(vis_bands, &self.sub_product)?;

        let (vzen, vzen_meta) = self.load_geometry(GeometryRole::SatelliteView, options.vzen_file.as_deref())?;
        let (szen, _) = self.load_geometry(GeometryRole::SolarZenith, options.szen_file.as_deref())?;
        let (razi, _) = self.load_geometry(GeometryRole::RelativeAzimuth, options.razi_file.as_deref())?;

        validate_geometry(&vzen, &szen, &razi, wind_speed)?;

        let mut bands = Vec::with_capacity(sources.len());
        let mut band_meta = Vec::with_capacity(sources.len());
        for source in &sources {
            let (band, meta) = self.load_band(source)?;
            require_matching_shape(&[("view zenith", vzen.dim()), (band.name.as_str(), band.dim())])?;
            require_nontrivial(&band.data, band.nodata, &band.name)?;
            bands.push(band);
            band_meta.push(meta);
        }

        let (glint, fresnel) = model_glint(
            &vzen,
            &szen,
            &razi,
            wind_speed,
            options.return_fresnel,
            &self.config.cox_munk,
        );

        let engine = CorrectionEngine::new(self.config.correction);
        let corrected = engine.correct_bands(&bands, &glint, water_val)?;

        log::info!("Deglinted {} band(s)", corrected.len());

        Ok(CoxMunkProduct {
            bands: corrected,
            sources,
            band_meta,
            glint,
            fresnel,
            glint_meta: vzen_meta,
            wind_speed,
            water_val,
        })
    }

    fn load_geometry(&self, role: GeometryRole, path: Option<&Path>) -> GlintResult<(AngleRaster, RasterMeta)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.find_file(role)?,
        };
        log::debug!("Loading {} from {}", role, path.display());

        let raster = self.loader.load(&path)?;
        let meta = raster.meta.clone();
        Ok((AngleRaster::from_raster(role, raster)?, meta))
    }

    fn load_band(&self, source: &BandSource) -> GlintResult<(VisibleBand, RasterMeta)> {
        log::debug!("Loading band {} from {}", source.band_id, source.path.display());

        let raster = self.loader.load(&source.path)?;
        let meta = raster.meta.clone();
        let band = VisibleBand::new(&source.band_id, &source.name, raster.data, raster.meta.nodata)?;
        Ok((band, meta))
    }
}

#[cfg(feature = "gdal")]
impl<C, L> GlintCorrector<C, L> {
    /// Write the corrected bands and the int16 glint field into `out_dir`.
    ///
    /// Corrected bands are always Float32, whatever the source band type.
    /// Returns the written paths, bands first.
    pub fn write_product<P: AsRef<Path>>(&self, product: &CoxMunkProduct, out_dir: P) -> GlintResult<Vec<PathBuf>> {
        use crate::io::save_geotiff;

        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let mut written = Vec::new();
        for ((band, source), meta) in product.bands.iter().zip(&product.sources).zip(&product.band_meta) {
            let path = out_dir.join(format!("{}-deglint.tif", file_stem(&source.path)));
            save_geotiff(&band.data, band.nodata as f64, meta, &path)?;
            written.push(path);
        }

        let prefix = product
            .sources
            .first()
            .map(|s| product_prefix(&file_stem(&s.path)))
            .unwrap_or_else(|| "cox_munk".to_string());
        let scaling = &self.config.fixed_point;

        let glint_path = out_dir.join(format!("{}_cm_glint.tif", prefix));
        save_geotiff(
            &scaling.to_fixed_point(&product.glint),
            scaling.nodata as f64,
            &product.glint_meta,
            &glint_path,
        )?;
        written.push(glint_path);

        if let Some(fresnel) = &product.fresnel {
            let fresnel_path = out_dir.join(format!("{}_cm_fresnel.tif", prefix));
            save_geotiff(
                &scaling.fresnel_to_fixed_point(fresnel),
                scaling.nodata as f64,
                &product.glint_meta,
                &fresnel_path,
            )?;
            written.push(fresnel_path);
        }

        Ok(written)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Dataset prefix of a band file stem, e.g. "..._final_band03" -> "..._final"
fn product_prefix(stem: &str) -> String {
    match regex::Regex::new(r"(?i)_band\d+$") {
        Ok(re) => re.replace(stem, "").into_owned(),
        Err(_) => stem.to_string(),
    }
}
