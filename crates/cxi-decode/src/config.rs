use std::fs;
use std::path::{Path, PathBuf};

use cxi_range::IdRangeList;
use cxi_store::Teardown;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};

/// Settings for one import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Parent directory for the working directory; system temp when unset.
    pub work_dir: Option<PathBuf>,
    /// Id range list gating pages and blog posts, e.g. `"[2,9],[10,7]"`.
    pub id_ranges: Option<String>,
    /// Space keys to flag as excluded.
    pub excluded_spaces: Vec<String>,
    pub background_cleanup: bool,
    pub keep_work_dir: bool,
    pub entities_file: String,
    pub descriptor_file: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            id_ranges: None,
            excluded_spaces: Vec::new(),
            background_cleanup: false,
            keep_work_dir: false,
            entities_file: "entities.xml".into(),
            descriptor_file: "exportDescriptor.properties".into(),
        }
    }
}

impl ImportConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> DecodeResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&text).map_err(|e| DecodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DecodeResult<()> {
        self.id_range_list()?;
        for (name, value) in [
            ("entities_file", &self.entities_file),
            ("descriptor_file", &self.descriptor_file),
        ] {
            if value.trim().is_empty() {
                return Err(DecodeError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Parse the configured id range list.
    pub fn id_range_list(&self) -> DecodeResult<Option<IdRangeList<i64>>> {
        match &self.id_ranges {
            Some(text) => Ok(Some(text.parse()?)),
            None => Ok(None),
        }
    }

    /// Teardown mode for the working directory.
    pub fn teardown(&self) -> Teardown {
        if self.keep_work_dir {
            Teardown::Keep
        } else if self.background_cleanup {
            Teardown::Background
        } else {
            Teardown::Blocking
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ImportConfig::default();
        assert_eq!(c.entities_file, "entities.xml");
        assert_eq!(c.descriptor_file, "exportDescriptor.properties");
        assert!(c.id_range_list().unwrap().is_none());
        assert_eq!(c.teardown(), Teardown::Blocking);
    }

    #[test]
    fn load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cxi.toml");
        fs::write(
            &path,
            "id_ranges = \"[2,9],(10,]\"\nexcluded_spaces = [\"ARCHIVE\"]\nbackground_cleanup = true\n",
        )
        .unwrap();
        let c = ImportConfig::load(&path).unwrap();
        assert_eq!(c.excluded_spaces, vec!["ARCHIVE".to_string()]);
        assert_eq!(c.entities_file, "entities.xml");
        assert_eq!(c.id_range_list().unwrap().unwrap().len(), 2);
        assert_eq!(c.teardown(), Teardown::Background);
    }

    #[test]
    fn keep_wins_over_background() {
        let c = ImportConfig {
            keep_work_dir: true,
            background_cleanup: true,
            ..ImportConfig::default()
        };
        assert_eq!(c.teardown(), Teardown::Keep);
    }

    #[test]
    fn invalid_ranges_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cxi.toml");
        fs::write(&path, "id_ranges = \"[2,9\"\n").unwrap();
        let err = ImportConfig::load(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Range(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cxi.toml");
        fs::write(&path, "keep_work_dir = maybe\n").unwrap();
        assert!(matches!(ImportConfig::load(&path), Err(DecodeError::Config(_))));
    }
}
