//! Open Data Cube dataset documents (`*.odc-metadata.yaml`).
//!
//! The document lists every measurement of a product with a path relative to
//! the yaml file. Visible bands of a sub-product are the measurements named
//! `<sub_product>_<colour>` whose file name carries `band<NN>`; the
//! sun/sensor geometry layers are the `oa_<role>` measurements.

use crate::types::{BandSource, GeometryRole, GlintError, GlintResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolves a geometry layer to a file on disk
pub trait GeometryResolver {
    fn resolve(&self, role: GeometryRole, sub_product: &str) -> GlintResult<PathBuf>;
}

/// Resolves band identifiers to files on disk
pub trait BandResolver {
    /// Every band of the sub-product, sorted by band number
    fn available_bands(&self, sub_product: &str) -> Vec<BandSource>;

    /// The requested bands in request order
    fn resolve_bands(&self, band_ids: &[&str], sub_product: &str) -> GlintResult<Vec<BandSource>> {
        let available = self.available_bands(sub_product);
        band_ids
            .iter()
            .map(|id| {
                available
                    .iter()
                    .find(|b| b.band_id == *id)
                    .cloned()
                    .ok_or_else(|| GlintError::BandNotFound {
                        band_id: id.to_string(),
                        available: available.iter().map(|b| b.band_id.clone()).collect(),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OdcDocument {
    id: Option<String>,
    product: Option<OdcProduct>,
    #[serde(default)]
    properties: OdcProperties,
    #[serde(default)]
    measurements: BTreeMap<String, OdcMeasurement>,
}

#[derive(Debug, Deserialize)]
struct OdcProduct {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct OdcProperties {
    datetime: Option<String>,
    #[serde(rename = "eo:platform")]
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OdcMeasurement {
    path: String,
}

/// Measurement catalog of one ODC dataset
#[derive(Debug, Clone)]
pub struct OdcMetadata {
    pub source: PathBuf,
    pub dataset_id: Option<String>,
    pub product: Option<String>,
    pub platform: Option<String>,
    pub acquisition_time: Option<DateTime<Utc>>,
    measurements: BTreeMap<String, PathBuf>,
}

impl OdcMetadata {
    pub fn from_file<P: AsRef<Path>>(path: P) -> GlintResult<Self> {
        let path = path.as_ref();
        log::info!("Reading ODC metadata: {}", path.display());

        let contents = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&contents, base_dir, path)
    }

    /// Parse a document whose measurement paths are relative to `base_dir`
    pub fn from_yaml(contents: &str, base_dir: &Path, source: &Path) -> GlintResult<Self> {
        let doc: OdcDocument = serde_yaml::from_str(contents)?;

        if doc.measurements.is_empty() {
            return Err(GlintError::Metadata(format!(
                "{} does not list any measurements",
                source.display()
            )));
        }

        let acquisition_time = doc.properties.datetime.as_deref().and_then(|s| {
            match DateTime::parse_from_rfc3339(s) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    log::warn!("Could not parse acquisition datetime '{}': {}", s, e);
                    None
                }
            }
        });

        let measurements = doc
            .measurements
            .into_iter()
            .map(|(name, m)| (name, base_dir.join(m.path)))
            .collect();

        let metadata = Self {
            source: source.to_path_buf(),
            dataset_id: doc.id,
            product: doc.product.map(|p| p.name),
            platform: doc.properties.platform,
            acquisition_time,
            measurements,
        };

        log::debug!(
            "ODC dataset {:?} ({:?}, {:?}) with {} measurements",
            metadata.dataset_id,
            metadata.platform,
            metadata.acquisition_time,
            metadata.measurements.len()
        );

        Ok(metadata)
    }

    pub fn measurement(&self, name: &str) -> Option<&Path> {
        self.measurements.get(name).map(PathBuf::as_path)
    }

    /// Find the measurement for a keyword such as "satellite_view"
    pub fn find_file(&self, keyword: &str, sub_product: &str) -> GlintResult<PathBuf> {
        let preferred = [format!("{}_{}", sub_product, keyword), format!("oa_{}", keyword)];

        for name in &preferred {
            if let Some(path) = self.measurements.get(name) {
                return Ok(path.clone());
            }
        }

        let suffix = format!("_{}", keyword);
        self.measurements
            .iter()
            .find(|(name, _)| name.as_str() == keyword || name.ends_with(&suffix))
            .map(|(_, path)| path.clone())
            .ok_or_else(|| {
                GlintError::Metadata(format!(
                    "Unable to find '{}' in {}",
                    keyword,
                    self.source.display()
                ))
            })
    }
}

impl GeometryResolver for OdcMetadata {
    fn resolve(&self, role: GeometryRole, sub_product: &str) -> GlintResult<PathBuf> {
        self.find_file(role.as_str(), sub_product)
    }
}

impl BandResolver for OdcMetadata {
    fn available_bands(&self, sub_product: &str) -> Vec<BandSource> {
        let prefix = format!("{}_", sub_product);
        let Ok(band_re) = Regex::new(r"(?i)band0*(\d+)") else {
            return Vec::new();
        };

        let mut bands: Vec<(u32, BandSource)> = self
            .measurements
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .filter_map(|(name, path)| {
                let file_name = path.file_name()?.to_string_lossy();
                let number: u32 = band_re.captures(&file_name)?.get(1)?.as_str().parse().ok()?;
                Some((
                    number,
                    BandSource {
                        band_id: number.to_string(),
                        name: name.clone(),
                        path: path.clone(),
                    },
                ))
            })
            .collect();

        bands.sort_by_key(|(number, _)| *number);
        bands.into_iter().map(|(_, band)| band).collect()
    }
}
