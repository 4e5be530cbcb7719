use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Error;
use crate::sort::RuleTable;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub sort: SortConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Table name -> spreadsheet export holding it.
    #[serde(default = "default_sources")]
    pub sources: BTreeMap<String, SourceFile>,
    /// Restrict a run to these query names. Empty means the whole catalog.
    #[serde(default)]
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceFile {
    pub file: String,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortConfig {
    #[serde(default = "default_output_dir")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub overwrite: bool,
    /// Ordered keyword -> label pairs; the standard table when absent.
    #[serde(default)]
    pub rules: Option<Vec<RuleConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub keyword: String,
    pub label: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            sources: default_sources(),
            queries: Vec::new(),
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_dir(),
            dry_run: false,
            overwrite: false,
            rules: None,
        }
    }
}

impl SortConfig {
    pub fn rule_table(&self) -> Result<RuleTable, Error> {
        match &self.rules {
            Some(rules) => RuleTable::from_pairs(
                rules
                    .iter()
                    .map(|r| (r.keyword.as_str(), r.label.as_str())),
            ),
            None => Ok(RuleTable::standard()),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_true() -> bool {
    true
}

fn default_sources() -> BTreeMap<String, SourceFile> {
    let source = |file: &str, required: bool| SourceFile {
        file: file.to_string(),
        sheet: None,
        required,
    };

    BTreeMap::from([
        ("cu_status".to_string(), source("cu_status.xlsx", true)),
        ("cu_sites".to_string(), source("cu_sites.xlsx", true)),
        ("cu_boundary".to_string(), source("cu_boundary.xlsx", true)),
        (
            "region_translations".to_string(),
            source("region_translations.xlsx", false),
        ),
        ("cu_names_fr".to_string(), source("cu_names_fr.xlsx", false)),
    ])
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from("Config")
}

/// Load `<name>.toml` (optional), then `SALMON_CU_*` environment overrides,
/// e.g. `SALMON_CU_SORT__DRY_RUN=true`.
pub fn load_configuration_from(name: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("SALMON_CU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_use_standard_rules() {
        let config = AppConfig::default();
        assert_eq!(config.sort.output_root, PathBuf::from("output"));
        assert!(!config.sort.dry_run);
        assert!(!config.sort.overwrite);
        let rules = config.sort.rule_table().unwrap();
        assert_eq!(rules.len(), RuleTable::standard().len());
        assert!(config.extract.sources.contains_key("cu_status"));
        assert!(!config.extract.sources["cu_names_fr"].required);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Settings.toml");
        fs::write(
            &path,
            r#"
[extract]
input_dir = "exports"
queries = ["CK_CU_SITES_En"]

[sort]
output_root = "out"
overwrite = true
rules = [
  { keyword = "SITES", label = "Sites" },
  { keyword = "STATUS", label = "Status" },
]
"#,
        )
        .unwrap();

        let name = dir.path().join("Settings");
        let config = load_configuration_from(name.to_str().unwrap()).unwrap();
        assert_eq!(config.extract.input_dir, PathBuf::from("exports"));
        assert_eq!(config.extract.queries, vec!["CK_CU_SITES_En".to_string()]);
        assert_eq!(config.sort.output_root, PathBuf::from("out"));
        assert!(config.sort.overwrite);

        let rules = config.sort.rule_table().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.classify("CK_CU_SITES_En.csv"), Some("Sites"));
    }

    #[test]
    fn test_empty_rule_keyword_rejected() {
        let sort = SortConfig {
            rules: Some(vec![RuleConfig {
                keyword: "  ".to_string(),
                label: "Nowhere".to_string(),
            }]),
            ..SortConfig::default()
        };
        assert!(sort.rule_table().is_err());
    }
}
