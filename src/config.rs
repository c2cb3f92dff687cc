//! Optional settings file; command-line flags take precedence over it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{aggregate::DEFAULT_TOP_N, yaml_file};

pub const DEFAULT_STORE_ROOT: &str = ".salesboard";
pub const DEFAULT_ACCOUNT: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub store_root: Option<PathBuf>,
    pub top_n: Option<usize>,
    pub default_account: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = yaml_file::load_from_path(path)
            .with_context(|| format!("Loading settings from {path:?}"))?;
        debug!("Loaded settings from {path:?}: {settings:?}");
        Ok(settings)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn store_root(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store_root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_ROOT))
    }

    pub fn account(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.default_account.clone())
            .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string())
    }

    pub fn top_n(&self, flag: Option<usize>) -> usize {
        flag.or(self.top_n).unwrap_or(DEFAULT_TOP_N)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let settings: Settings =
            yaml_file::from_str("store_root: /srv/sales\ntop_n: 5\ndefault_account: acme\n")
                .unwrap();
        assert_eq!(settings.top_n(None), 5);
        assert_eq!(settings.top_n(Some(3)), 3);
        assert_eq!(settings.account(None), "acme");
        assert_eq!(settings.account(Some("other")), "other");
        assert_eq!(settings.store_root(None), PathBuf::from("/srv/sales"));
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::default();
        assert_eq!(settings.top_n(None), DEFAULT_TOP_N);
        assert_eq!(settings.account(None), DEFAULT_ACCOUNT);
        assert_eq!(settings.store_root(None), PathBuf::from(DEFAULT_STORE_ROOT));
    }
}
