//! Deployment configuration
//!
//! Networks, the artifacts directory and chain limits are read from a
//! JSON file, `deploy.json` in the working directory unless a different
//! path is given. The `local` network is always available, even when
//! there is no configuration file at all.

use {
  crate::{
    primitives::{Keypair, KeypairError},
    provider::{
      dev_keypair,
      Commitment,
      HttpProvider,
      LocalNetwork,
      Provider,
      ProviderError,
    },
    vm::Limits,
  },
  serde::{Deserialize, Serialize},
  std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
  },
  thiserror::Error,
  tracing::debug,
};

pub const DEFAULT_CONFIG_FILE: &str = "deploy.json";
pub const LOCAL_NETWORK: &str = "local";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed reading config file {}: {source}", path.display())]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("Malformed config file {}: {source}", path.display())]
  Malformed {
    path: PathBuf,
    source: serde_json::Error,
  },

  #[error("Failed expanding '{0}': {1}")]
  Expansion(String, String),

  #[error("Network '{0}' is not configured")]
  UnknownNetwork(String),

  #[error("No deployer keypair configured for network '{0}'")]
  MissingKeypair(String),

  #[error("Invalid deployer keypair for network '{network}': {source}")]
  InvalidKeypair {
    network: String,
    source: KeypairError,
  },

  #[error(transparent)]
  Provider(#[from] ProviderError),
}

fn default_network() -> String {
  LOCAL_NETWORK.to_owned()
}

fn default_artifacts() -> PathBuf {
  PathBuf::from("./artifacts")
}

fn default_timeout() -> Duration {
  Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
  Duration::from_millis(500)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
  /// Network used when none is selected on the command line.
  #[serde(default = "default_network")]
  pub default_network: String,

  /// Directory with compiled contract artifacts.
  #[serde(default = "default_artifacts")]
  pub artifacts: PathBuf,

  #[serde(default)]
  pub networks: HashMap<String, NetworkConfig>,

  /// Limits of the target chain, also enforced by the local network.
  #[serde(default)]
  pub limits: Limits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
  /// Base url of the node JSON API.
  pub url: String,

  /// Base58 secret of the deployer account. Environment
  /// variables are expanded, e.g. `"$DEPLOYER_KEY"`.
  #[serde(default)]
  pub keypair: Option<String>,

  #[serde(default)]
  pub commitment: Commitment,

  /// Timeout of a single request to the node.
  #[serde(default = "default_timeout", with = "humantime_serde")]
  pub timeout: Duration,

  /// How often the contract account is checked while
  /// waiting for a deployment to complete.
  #[serde(default = "default_poll_interval", with = "humantime_serde")]
  pub poll_interval: Duration,
}

impl Default for DeployConfig {
  fn default() -> Self {
    Self {
      default_network: default_network(),
      artifacts: default_artifacts(),
      networks: HashMap::new(),
      limits: Limits::default(),
    }
  }
}

/// A network resolved from the configuration, ready to deploy to.
pub struct Network {
  pub name: String,
  pub provider: Arc<dyn Provider>,
  pub keypair: Keypair,
  pub poll_interval: Duration,
  pub timeout: Duration,
}

impl DeployConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let path = expand_path(path)?;
    let json = std::fs::read_to_string(&path).map_err(|source| {
      ConfigError::Io {
        path: path.clone(),
        source,
      }
    })?;
    serde_json::from_str(&json)
      .map_err(|source| ConfigError::Malformed { path, source })
  }

  /// Loads the config file at the given path, or `deploy.json` from the
  /// working directory if it exists. Without either, the default config
  /// with only the local network is used.
  pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::load(path),
      None => {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
          Self::load(default)
        } else {
          debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
          Ok(Self::default())
        }
      }
    }
  }

  pub fn artifacts_dir(&self) -> Result<PathBuf, ConfigError> {
    expand_path(&self.artifacts)
  }

  /// Resolves a network by name, the default network when `None`.
  /// A keypair given explicitly takes precedence over the configured one.
  pub fn network(
    &self,
    name: Option<&str>,
    keypair: Option<Keypair>,
  ) -> Result<Network, ConfigError> {
    let name = name.unwrap_or(&self.default_network);

    let config = match self.networks.get(name) {
      Some(config) => config,
      None if name == LOCAL_NETWORK => {
        return Ok(Network {
          name: name.to_owned(),
          provider: Arc::new(LocalNetwork::new(self.limits.clone())),
          keypair: keypair.unwrap_or_else(dev_keypair),
          poll_interval: Duration::from_millis(10),
          timeout: default_timeout(),
        });
      }
      None => return Err(ConfigError::UnknownNetwork(name.to_owned())),
    };

    let keypair = match (keypair, &config.keypair) {
      (Some(keypair), _) => keypair,
      (None, Some(secret)) => shellexpand::env(secret)
        .map_err(|e| ConfigError::Expansion(secret.clone(), e.to_string()))?
        .parse::<Keypair>()
        .map_err(|source| ConfigError::InvalidKeypair {
          network: name.to_owned(),
          source,
        })?,
      (None, None) => return Err(ConfigError::MissingKeypair(name.to_owned())),
    };

    let provider = HttpProvider::new(
      name,
      &config.url,
      config.commitment,
      config.timeout,
    )?;

    Ok(Network {
      name: name.to_owned(),
      provider: Arc::new(provider),
      keypair,
      poll_interval: config.poll_interval,
      timeout: config.timeout,
    })
  }
}

fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
  let raw = path.to_string_lossy();
  shellexpand::full(&raw)
    .map(|p| PathBuf::from(p.into_owned()))
    .map_err(|e| ConfigError::Expansion(raw.to_string(), e.to_string()))
}
