/// Mapper configuration
///
/// - Matching defaults (removable prefixes)
/// - Which unmapped items get reported, and at what tracing level
/// - Cache growth warning threshold

use crate::diagnostics::DiagnosticLevel;
use crate::error::{ProjectionError, ProjectionResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapperConfig {
    /// Name matching
    pub matching: MatchingConfig,

    /// Unmapped member/column reporting
    pub diagnostics: DiagnosticsConfig,

    /// Projector cache
    pub cache: CacheConfig,
}

/// Name matching configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Removable column prefix used when a call does not pass its own
    pub column_prefix: Option<String>,

    /// Treat the target type's name as a removable member prefix
    /// (column `ID` can fill member `OrderId` on type `Order`)
    pub strip_type_name_prefix: bool,
}

/// Diagnostics configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Report members no column was found for
    pub report_unmapped_members: bool,

    /// Report columns no member consumed
    pub report_unmapped_columns: bool,

    /// Level the default tracing sink logs at
    pub level: DiagnosticLevel,
}

/// Cache configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Log a warning once the number of cached shapes passes this (0 disables)
    pub warn_after_shapes: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            column_prefix: None,
            strip_type_name_prefix: true,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            report_unmapped_members: true,
            report_unmapped_columns: true,
            level: DiagnosticLevel::Debug,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            warn_after_shapes: 10_000,
        }
    }
}

impl MapperConfig {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> ProjectionResult<Self> {
        let config: Self = serde_json::from_str(json)
            .context("invalid mapper configuration")?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let path = path.as_ref();
        let load = || -> anyhow::Result<Self> {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("invalid mapper configuration")
        };
        load().map_err(|e| ProjectionError::config_with_path(format!("{:#}", e), path.display().to_string()))
    }

    pub fn to_json_string(&self) -> ProjectionResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProjectionError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.matching.column_prefix, None);
        assert!(config.matching.strip_type_name_prefix);
        assert!(config.diagnostics.report_unmapped_members);
        assert_eq!(config.diagnostics.level, DiagnosticLevel::Debug);
        assert_eq!(config.cache.warn_after_shapes, 10_000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapperConfig::from_json_str(
            r#"{ "matching": { "column_prefix": "ord_" }, "diagnostics": { "level": "warn" } }"#,
        )
        .unwrap();

        assert_eq!(config.matching.column_prefix.as_deref(), Some("ord_"));
        assert!(config.matching.strip_type_name_prefix);
        assert_eq!(config.diagnostics.level, DiagnosticLevel::Warn);
        assert!(config.diagnostics.report_unmapped_columns);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = MapperConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ProjectionError::Config { .. }));
        assert!(err.to_string().contains("invalid mapper configuration"));
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = MapperConfig::default();
        config.cache.warn_after_shapes = 5;
        config.diagnostics.report_unmapped_columns = false;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json_string().unwrap().as_bytes()).unwrap();

        assert_eq!(MapperConfig::from_json_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        match MapperConfig::from_json_file(&path) {
            Err(ProjectionError::Config { path: Some(p), .. }) => assert!(p.ends_with("absent.json")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
