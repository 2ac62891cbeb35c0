//! The `.cloud-graphrc.json` config file.
//!
//! ```json
//! {
//!   "cloudGraph": {"dgraphHost": "http://localhost:8080"},
//!   "aws": {"regions": "us-east-1,us-west-2", "resources": "alb,ec2", "inventory": "aws.json"}
//! }
//! ```
//!
//! Every key other than `cloudGraph` is a provider section.

use anyhow::{Context, Result};
use cloudgraph_provider::Selector;
use cloudgraph_store::DgraphConfig;
use cloudgraph_types::ProviderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable consulted for the Dgraph host.
pub const DGRAPH_HOST_ENV: &str = "DGRAPH_HOST";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudGraphSection {
    #[serde(default)]
    pub dgraph_host: Option<String>,
}

/// One provider's section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Comma-separated region list.
    #[serde(default)]
    pub regions: Option<String>,
    /// Comma-separated service type list.
    #[serde(default)]
    pub resources: Option<String>,
    /// Inventory file, relative to the config file.
    #[serde(default)]
    pub inventory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(rename = "cloudGraph", default)]
    pub cloud_graph: CloudGraphSection,
    #[serde(flatten)]
    pub providers: BTreeMap<String, ProviderSection>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl CliConfig {
    /// Reads the config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self {
                base_dir,
                ..Self::default()
            });
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Providers to scan: the ones requested, or else every configured one.
    /// Repeated names keep their first position.
    pub fn providers_to_scan(&self, requested: &[String]) -> Vec<ProviderName> {
        let names: Vec<&String> = if requested.is_empty() {
            self.providers.keys().collect()
        } else {
            requested.iter().collect()
        };
        let mut providers: Vec<ProviderName> = Vec::with_capacity(names.len());
        for name in names {
            let name = ProviderName::new(name.trim());
            if !name.as_str().is_empty() && !providers.contains(&name) {
                providers.push(name);
            }
        }
        providers
    }

    fn section(&self, provider: &ProviderName) -> Option<&ProviderSection> {
        self.providers.get(provider.as_str())
    }

    /// The configured selector, if the provider's section narrows the scan.
    pub fn selector(&self, provider: &ProviderName) -> Option<Selector> {
        let section = self.section(provider)?;
        if section.regions.is_none() && section.resources.is_none() {
            return None;
        }
        Some(Selector::parse(
            section.regions.as_deref().unwrap_or_default(),
            section.resources.as_deref().unwrap_or_default(),
        ))
    }

    /// Where the provider's inventory lives; `<provider>.json` next to the
    /// config file unless the section says otherwise.
    pub fn inventory_path(&self, provider: &ProviderName) -> PathBuf {
        let path = self
            .section(provider)
            .and_then(|s| s.inventory.clone())
            .unwrap_or_else(|| PathBuf::from(format!("{provider}.json")));
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Picks the Dgraph host: flag, then environment, then config file, then
/// the local default.
pub fn resolve_dgraph_host(
    flag: Option<&str>,
    env: Option<&str>,
    config: &CliConfig,
) -> String {
    [flag, env, config.cloud_graph.dgraph_host.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|host| !host.is_empty())
        .unwrap_or(DgraphConfig::DEFAULT_HOST)
        .to_string()
}

/// [`resolve_dgraph_host`] reading `DGRAPH_HOST` from the process environment.
pub fn dgraph_host(flag: Option<&str>, config: &CliConfig) -> String {
    let env = std::env::var(DGRAPH_HOST_ENV).ok();
    resolve_dgraph_host(flag, env.as_deref(), config)
}
