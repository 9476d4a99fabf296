//! Run configuration: simulation selection, filter parameters and archive access.
//!
//! Value types validate their ranges on construction so that downstream stages
//! can rely on `crop_percent ∈ [1, 100]`, `snapshot ∈ [0, 99]` and
//! `min_mass ≥ 0` without re-checking.

use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Environment variable consulted for the archive API key
pub const API_KEY_ENV: &str = "TNG_API_KEY";

/// Default archive host
pub const DEFAULT_HOST: &str = "www.tng-project.org";

/// IllustrisTNG simulation runs served by the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Tng100_1,
    Tng100_1Dark,
    Tng50_1,
    Tng50_1Dark,
    Tng300_1,
    Tng300_1Dark,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Tng100_1,
        Dataset::Tng100_1Dark,
        Dataset::Tng50_1,
        Dataset::Tng50_1Dark,
        Dataset::Tng300_1,
        Dataset::Tng300_1Dark,
    ];

    /// Archive name, also used as the data directory name
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Tng100_1 => "TNG100-1",
            Dataset::Tng100_1Dark => "TNG100-1-Dark",
            Dataset::Tng50_1 => "TNG50-1",
            Dataset::Tng50_1Dark => "TNG50-1-Dark",
            Dataset::Tng300_1 => "TNG300-1",
            Dataset::Tng300_1Dark => "TNG300-1-Dark",
        }
    }

    /// Dark-matter-only runs carry no baryonic component
    pub fn is_dark(&self) -> bool {
        self.name().ends_with("-Dark")
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::Tng50_1Dark
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Dataset::ALL.iter().map(|d| d.name()).collect();
                PipelineError::InvalidConfig(format!(
                    "unknown dataset '{s}' (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}

/// Workflow selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Cubical complex persistence of a precomputed density field
    Ccph,
    /// Point-cloud preprocessing (and optional Rips persistence)
    Pp,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Ccph => "CCPH",
            Algorithm::Pp => "PP",
        })
    }
}

impl FromStr for Algorithm {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CCPH" => Ok(Algorithm::Ccph),
            "PP" => Ok(Algorithm::Pp),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown algorithm '{other}' (expected CCPH or PP)"
            ))),
        }
    }
}

/// Snapshot index in `0..=99` (99 is redshift zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snapshot(u8);

impl Snapshot {
    pub const MAX: u8 = 99;

    pub fn new(index: u32) -> Result<Self> {
        if index > Self::MAX as u32 {
            return Err(PipelineError::InvalidConfig(format!(
                "snapshot {index} out of range 0..={}",
                Self::MAX
            )));
        }
        Ok(Snapshot(index as u8))
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot(99)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snapshot {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let index: u32 = s
            .trim()
            .parse()
            .map_err(|_| PipelineError::InvalidConfig(format!("snapshot '{s}' is not an integer")))?;
        Snapshot::new(index)
    }
}

/// Percentage of the largest axis extent kept by the crop, in `1..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropPercent(u8);

impl CropPercent {
    pub fn new(percent: u32) -> Result<Self> {
        if !(1..=100).contains(&percent) {
            return Err(PipelineError::InvalidConfig(format!(
                "crop percentage {percent} out of range 1..=100"
            )));
        }
        Ok(CropPercent(percent as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Crop as a fraction of the extent
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for CropPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CropPercent {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let percent: u32 = s
            .trim()
            .parse()
            .map_err(|_| PipelineError::InvalidConfig(format!("crop '{s}' is not an integer")))?;
        CropPercent::new(percent)
    }
}

/// Mass threshold, crop and normalisation switch for the point-cloud filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Minimum subhalo mass kept (units of 10^10 M_sun/h)
    min_mass: f64,
    pub crop_percent: CropPercent,
    pub normalize: bool,
}

impl FilterConfig {
    pub fn new(min_mass: f64, crop_percent: CropPercent, normalize: bool) -> Result<Self> {
        if !(min_mass >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "mass threshold {min_mass} must be a non-negative number"
            )));
        }
        Ok(Self {
            min_mass,
            crop_percent,
            normalize,
        })
    }

    pub fn min_mass(&self) -> f64 {
        self.min_mass
    }

    /// Same selection rescaled to `[-1, 1]`
    pub fn normalized(&self) -> Self {
        Self {
            normalize: true,
            ..*self
        }
    }

    /// Same selection, original units
    pub fn unnormalized(&self) -> Self {
        Self {
            normalize: false,
            ..*self
        }
    }
}

/// Remote archive endpoint and credentials
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub host: String,
    pub api_key: String,
}

impl ArchiveConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
        }
    }

    /// Default host, key taken from `TNG_API_KEY` when set
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(DEFAULT_HOST, api_key)
    }

    /// Per-snapshot group catalog endpoint
    pub fn groupcat_url(&self, dataset: Dataset, snapshot: Snapshot) -> String {
        format!(
            "http://{}/api/{}/files/groupcat-{}/",
            self.host, dataset, snapshot
        )
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_names_round_trip() {
        for d in Dataset::ALL {
            assert_eq!(d.name().parse::<Dataset>().unwrap(), d);
        }
        assert!("TNG42-1".parse::<Dataset>().is_err());
        assert!(Dataset::Tng50_1Dark.is_dark());
        assert!(!Dataset::Tng300_1.is_dark());
        assert_eq!(Dataset::default().to_string(), "TNG50-1-Dark");
    }

    #[test]
    fn test_algorithm_selector() {
        assert_eq!("CCPH".parse::<Algorithm>().unwrap(), Algorithm::Ccph);
        assert_eq!("PP".parse::<Algorithm>().unwrap(), Algorithm::Pp);
        assert!("pp".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::Ccph.to_string(), "CCPH");
    }

    #[test]
    fn test_ranges_are_enforced() {
        assert!(Snapshot::new(99).is_ok());
        assert!(Snapshot::new(100).is_err());
        assert!(CropPercent::new(0).is_err());
        assert!(CropPercent::new(101).is_err());
        assert_eq!(CropPercent::new(12).unwrap().fraction(), 0.12);
        assert!("abc".parse::<CropPercent>().is_err());

        let crop = CropPercent::new(40).unwrap();
        assert!(FilterConfig::new(-1.0, crop, true).is_err());
        assert!(FilterConfig::new(f64::NAN, crop, true).is_err());
        let cfg = FilterConfig::new(0.0, crop, true).unwrap();
        assert!(!cfg.unnormalized().normalize);
        assert_eq!(cfg.unnormalized().crop_percent, crop);
    }

    #[test]
    fn test_groupcat_url() {
        let archive = ArchiveConfig::new("www.tng-project.org", "key");
        let url = archive.groupcat_url(Dataset::Tng50_1Dark, Snapshot::new(99).unwrap());
        assert_eq!(url, "http://www.tng-project.org/api/TNG50-1-Dark/files/groupcat-99/");
    }
}
