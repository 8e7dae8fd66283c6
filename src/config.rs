//! Query builder configuration loading.
//!
//! The configuration is read once, then shared read-only by every
//! [`ImageQueryBuilder`](crate::ImageQueryBuilder) through an `Arc`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::geodetic::Ellipsoid;
use crate::{Result, SearchError};

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const LONG_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Query builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Localized month names, used to recognize dates in legacy keyword searches
    pub months: MonthNames,
    /// Compile tag properties against an `ImageTagProperties` table that is
    /// already joined into the outer query instead of a subquery
    pub image_tag_properties_joined: bool,
    /// Reference ellipsoid for geographic searches
    pub ellipsoid: EllipsoidKind,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            months: MonthNames::default(),
            image_tag_properties_joined: false,
            ellipsoid: EllipsoidKind::default(),
        }
    }
}

impl BuilderConfig {
    /// Parse configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BuilderConfig = toml::from_str(content)
            .map_err(|e| SearchError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            SearchError::Config(message) => {
                SearchError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.months.short.len() != 12 || self.months.long.len() != 12 {
            return Err(SearchError::Config(format!(
                "Expected 12 month names, got {} short and {} long",
                self.months.short.len(),
                self.months.long.len()
            )));
        }
        Ok(())
    }
}

/// Short and long month names, January first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthNames {
    pub short: Vec<String>,
    pub long: Vec<String>,
}

impl Default for MonthNames {
    fn default() -> Self {
        Self {
            short: SHORT_MONTHS.iter().map(|m| m.to_string()).collect(),
            long: LONG_MONTHS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl MonthNames {
    /// Month number (1-12) of a short or long month name, ignoring case.
    pub fn month_number(&self, name: &str) -> Option<u32> {
        let name = name.to_lowercase();

        [&self.short, &self.long].iter().find_map(|names| {
            names
                .iter()
                .position(|month| month.to_lowercase() == name)
                .map(|index| index as u32 + 1)
        })
    }
}

/// Reference ellipsoids selectable in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EllipsoidKind {
    #[default]
    Wgs84,
    Grs80,
    International1924,
    Clarke1866,
    Sphere,
}

impl EllipsoidKind {
    pub fn ellipsoid(&self) -> Ellipsoid {
        match self {
            EllipsoidKind::Wgs84 => Ellipsoid::wgs84(),
            EllipsoidKind::Grs80 => Ellipsoid::grs80(),
            EllipsoidKind::International1924 => Ellipsoid::international_1924(),
            EllipsoidKind::Clarke1866 => Ellipsoid::clarke_1866(),
            EllipsoidKind::Sphere => Ellipsoid::sphere(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.months.short.len(), 12);
        assert_eq!(config.ellipsoid, EllipsoidKind::Wgs84);
        assert!(!config.image_tag_properties_joined);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = BuilderConfig::from_toml_str("").unwrap();
        assert_eq!(config, BuilderConfig::default());
    }

    #[test]
    fn test_month_number() {
        let months = MonthNames::default();
        assert_eq!(months.month_number("jan"), Some(1));
        assert_eq!(months.month_number("DECEMBER"), Some(12));
        assert_eq!(months.month_number("Smarch"), None);
    }

    #[test]
    fn test_parse_localized_months() {
        let toml = r#"
image_tag_properties_joined = true
ellipsoid = "grs80"

[months]
short = ["jan", "feb", "mär", "apr", "mai", "jun", "jul", "aug", "sep", "okt", "nov", "dez"]
long = ["Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September", "Oktober", "November", "Dezember"]
"#;
        let config = BuilderConfig::from_toml_str(toml).unwrap();
        assert!(config.image_tag_properties_joined);
        assert_eq!(config.ellipsoid, EllipsoidKind::Grs80);
        assert_eq!(config.months.month_number("März"), Some(3));
        assert_eq!(config.months.month_number("okt"), Some(10));
    }

    #[test]
    fn test_rejects_incomplete_month_list() {
        let result = BuilderConfig::from_toml_str("[months]\nshort = [\"jan\"]\n");
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_ellipsoid() {
        let result = BuilderConfig::from_toml_str("ellipsoid = \"flat\"\n");
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("digiquery.toml");
        fs::write(&path, "ellipsoid = \"sphere\"\n").unwrap();

        let config = BuilderConfig::load(&path).unwrap();
        assert_eq!(config.ellipsoid, EllipsoidKind::Sphere);
        assert!(config.ellipsoid.ellipsoid().is_sphere());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = BuilderConfig::load(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(SearchError::Io(_))));
    }
}
