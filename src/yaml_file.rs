//! Settings and mapping files. JSON is valid YAML, so mapping files may use
//! either syntax.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Reading {path:?}"))?;
    from_str(&raw).with_context(|| format!("Parsing {path:?}"))
}

pub fn save_to_path<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let rendered = serde_yaml::to_string(data)?;
    fs::write(path, rendered).with_context(|| format!("Writing {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{CanonicalField, ColumnMapping};

    #[test]
    fn mapping_files_parse_as_yaml_or_json() {
        let from_yaml: ColumnMapping = from_str("revenue: Total Price\nbrand: ~\n").unwrap();
        let from_json: ColumnMapping = from_str(r#"{"revenue": "Total Price"}"#).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.get(CanonicalField::Revenue), Some("Total Price"));
    }

    #[test]
    fn saved_mapping_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.yaml");
        let mapping = ColumnMapping::new()
            .with(CanonicalField::Revenue, "final amount")
            .with(CanonicalField::OrderId, "seller order id");
        save_to_path(&path, &mapping).unwrap();
        let loaded: ColumnMapping = load_from_path(&path).unwrap();
        assert_eq!(loaded, mapping);
        assert!(load_from_path::<ColumnMapping>(&dir.path().join("missing.yaml")).is_err());
    }
}
