//! Fareline configuration

use fareline_common::{FareError, RatePolicy, Result, RideClassId};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarelineConfig {
    /// JSON rate table; the built-in table is used when unset
    pub rate_table_path: Option<PathBuf>,
    /// Record finalized fares in the ride ledger
    pub enable_ledger: bool,
}

impl Default for FarelineConfig {
    fn default() -> Self {
        Self {
            rate_table_path: None,
            enable_ledger: true,
        }
    }
}

impl FarelineConfig {
    /// Load configuration from environment (and `.env`, if present)
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(path) = std::env::var("FARELINE_RATE_TABLE") {
            if !path.trim().is_empty() {
                cfg.rate_table_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(val) = std::env::var("FARELINE_ENABLE_LEDGER") {
            cfg.enable_ledger = parse_bool(&val).ok_or_else(|| {
                FareError::Config(format!("FARELINE_ENABLE_LEDGER: expected a boolean, got '{}'", val))
            })?;
        }

        Ok(cfg)
    }

    /// Rate table this configuration points at
    pub fn rate_table(&self) -> Result<RateTable> {
        match &self.rate_table_path {
            Some(path) => RateTable::from_file(path),
            None => Ok(RateTable::default()),
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Ride classes installed at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub ride_classes: BTreeMap<RideClassId, RatePolicy>,
}

impl RateTable {
    /// Read a JSON rate table
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FareError::Config(format!("Failed to read rate table {}: {}", path.display(), e))
        })?;

        let table = Self::from_json(&content)?;
        info!(path = %path.display(), classes = table.ride_classes.len(), "Loaded rate table");
        Ok(table)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FareError::Config(format!("Failed to parse rate table JSON: {}", e)))
    }

    pub fn into_policies(self) -> impl Iterator<Item = (RideClassId, RatePolicy)> {
        self.ride_classes.into_iter()
    }
}

impl Default for RateTable {
    /// Standard and premium tiers
    fn default() -> Self {
        let mut ride_classes = BTreeMap::new();
        ride_classes.insert(
            RideClassId::new(crate::STANDARD_CLASS),
            RatePolicy::new(dec!(2.00), dec!(1.50)),
        );
        ride_classes.insert(
            RideClassId::new(crate::PREMIUM_CLASS),
            RatePolicy::new(dec!(5.00), dec!(3.00)),
        );
        Self { ride_classes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fareline_common::SurgeSchedule;

    #[test]
    fn test_default_config() {
        let cfg = FarelineConfig::default();
        assert!(cfg.enable_ledger);

        let table = cfg.rate_table().unwrap();
        assert_eq!(table.ride_classes.len(), 2);
        assert_eq!(
            table.ride_classes[&RideClassId::new("standard")].per_mile_rate,
            dec!(1.50)
        );
    }

    #[test]
    fn test_rate_table_json() {
        let json = r#"{
            "ride_classes": {
                "standard": {"base_fee": "2.00", "per_mile_rate": "1.50"},
                "night": {
                    "base_fee": "3.00",
                    "per_mile_rate": "1.75",
                    "surge": {
                        "kind": "windows",
                        "windows": [{"start_hour": 22, "end_hour": 5, "multiplier": "1.4"}]
                    }
                },
                "airport": {
                    "base_fee": "40",
                    "per_mile_rate": "0",
                    "surge": {"kind": "flat", "multiplier": "1.1"}
                }
            }
        }"#;

        let table = RateTable::from_json(json).unwrap();
        assert_eq!(table.ride_classes.len(), 3);
        assert!(matches!(
            table.ride_classes[&RideClassId::new("night")].surge,
            SurgeSchedule::Windows { .. }
        ));
        assert_eq!(
            table.ride_classes[&RideClassId::new("airport")].surge,
            SurgeSchedule::flat(dec!(1.1))
        );
    }

    #[test]
    fn test_bad_rate_table() {
        let err = RateTable::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), "config_error");

        let err = RateTable::from_file("/nonexistent/rates.json").unwrap_err();
        assert_eq!(err.code(), "config_error");
    }

    // Single test so nothing else in this process races on these variables
    #[test]
    fn test_load_from_env() {
        std::env::set_var("FARELINE_ENABLE_LEDGER", "maybe");
        let err = FarelineConfig::load().unwrap_err();
        assert_eq!(err.code(), "config_error");

        let path = std::env::temp_dir().join(format!("fareline-rates-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"ride_classes": {"shuttle": {"base_fee": "1.00", "per_mile_rate": "0.80"}}}"#,
        )
        .unwrap();
        std::env::set_var("FARELINE_ENABLE_LEDGER", "off");
        std::env::set_var("FARELINE_RATE_TABLE", &path);

        let cfg = FarelineConfig::load().unwrap();
        assert!(!cfg.enable_ledger);
        assert_eq!(cfg.rate_table_path.as_deref(), Some(path.as_path()));

        let table = cfg.rate_table().unwrap();
        assert_eq!(table.ride_classes.len(), 1);
        assert_eq!(
            table.ride_classes[&RideClassId::new("shuttle")].per_mile_rate,
            dec!(0.80)
        );

        std::env::remove_var("FARELINE_ENABLE_LEDGER");
        std::env::remove_var("FARELINE_RATE_TABLE");
        std::fs::remove_file(&path).unwrap();

        let cfg = FarelineConfig::load().unwrap();
        assert!(cfg.enable_ledger);
        assert!(cfg.rate_table_path.is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
