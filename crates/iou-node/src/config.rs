//! Node configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

use iou_core::PartyName;

/// Full configuration for the IOU node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IouConfig {
    /// HTTP API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Parties and notary hosted by this node.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// X.500 name of the notary.
    #[serde(default = "default_notary")]
    pub notary: String,
    /// X.500 names of the parties to host.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    10007
}
fn default_notary() -> String {
    "O=Notary, L=London, C=GB".into()
}
fn default_nodes() -> Vec<String> {
    vec![
        "O=PartyA, L=London, C=GB".into(),
        "O=PartyB, L=New York, C=US".into(),
        "O=PartyC, L=Paris, C=FR".into(),
    ]
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            notary: default_notary(),
            nodes: default_nodes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl IouConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: IouConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }

    pub fn notary_name(&self) -> anyhow::Result<PartyName> {
        Ok(PartyName::parse(&self.network.notary)?)
    }

    /// Parsed party names, rejecting duplicates by organisation.
    pub fn node_names(&self) -> anyhow::Result<Vec<PartyName>> {
        let mut names: Vec<PartyName> = Vec::with_capacity(self.network.nodes.len());
        for raw in &self.network.nodes {
            let name = PartyName::parse(raw)?;
            if names
                .iter()
                .any(|n| n.organisation.eq_ignore_ascii_case(&name.organisation))
            {
                anyhow::bail!("duplicate organisation in [network] nodes: {}", name.organisation);
            }
            names.push(name);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IouConfig::default();
        assert_eq!(config.api.port, 10007);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.network.nodes.len(), 3);
        assert_eq!(config.api_addr(), "127.0.0.1:10007");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = IouConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let decoded: IouConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(decoded.api.port, config.api.port);
        assert_eq!(decoded.network.nodes, config.network.nodes);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let config = IouConfig::load(Path::new("/nonexistent/iou.toml")).unwrap();
        assert_eq!(config.api.port, 10007);
    }

    #[test]
    fn test_config_from_toml_partial() {
        let toml_str = r#"
[api]
port = 8001

[network]
nodes = ["O=Bank, L=Zurich, C=CH"]
"#;
        let config: IouConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.api.port, 8001);
        assert_eq!(config.network.notary, "O=Notary, L=London, C=GB");
        let names = config.node_names().unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].organisation, "Bank");
    }

    #[test]
    fn test_duplicate_organisation_rejected() {
        let mut config = IouConfig::default();
        config.network.nodes.push("O=partya, L=Leeds, C=GB".into());
        assert!(config.node_names().is_err());
    }

    #[test]
    fn test_bad_party_name_rejected() {
        let mut config = IouConfig::default();
        config.network.notary = "Notary".into();
        assert!(config.notary_name().is_err());
    }
}
