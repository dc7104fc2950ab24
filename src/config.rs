//! Daemon configuration, loaded from an optional YAML file
//! via the teacher's own `config-yaml`/`config-yaml-derive` parser rather
//! than `serde_yaml` — it already owns this concern, generalized from its
//! nested server/route shape to this daemon's flatter option set.

use crate::error::Result;
use config_yaml::{FromYaml, Parser, YamlValue};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, config_yaml_derive::YamlStruct)]
pub struct DaemonConfig {
    #[field(default = "8080")]
    pub listen_port: u16,
    #[field(default = "4")]
    pub worker_count: u32,
    #[field(default = "./public")]
    pub document_root: String,
    #[field(default = "./liborigin_plugin.so")]
    pub plugin_path: String,
    #[field(default = "./origind.kv")]
    pub kv_store_path: String,
}

impl DaemonConfig {
    pub fn defaults() -> Result<Self> {
        let empty = YamlValue::Map(BTreeMap::new());
        Ok(Self::from_yaml(&empty)?)
    }
}

/// Loads `path` if it exists; falls back to [`DaemonConfig::defaults`] if
/// the file is absent (not finding a config file is not a startup failure —
/// only a malformed one is).
pub fn load_config(path: &Path) -> Result<DaemonConfig> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            origin_log::info!("no config file at {path:?}, using defaults");
            return DaemonConfig::defaults();
        }
        Err(e) => return Err(e.into()),
    };

    let mut parser = Parser::new(&text)?;
    let value = parser.parse()?;
    Ok(DaemonConfig::from_yaml(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_cli_defaults() {
        let cfg = DaemonConfig::defaults().unwrap();
        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.document_root, "./public");
    }

    #[test]
    fn loads_overrides_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origind.yaml");
        fs::write(&path, "listen_port: 9090\nworker_count: 8\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.listen_port, 9090);
        assert_eq!(cfg.worker_count, 8);
        assert_eq!(cfg.document_root, "./public");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(cfg.listen_port, 8080);
    }
}
