use {
  clap::Parser,
  std::path::PathBuf,
  tracking_deploy::{
    config::{ConfigError, DeployConfig},
    deployer::ContractSeed,
    factory::DeployOptions,
    primitives::Keypair,
  },
};

#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct CliOpts {
  #[clap(
    short,
    long,
    parse(from_os_str),
    help = "path to the deployment config file [default: ./deploy.json]"
  )]
  pub config: Option<PathBuf>,

  #[clap(
    short,
    long,
    help = "name of the network to deploy to [default: from config]"
  )]
  pub network: Option<String>,

  #[clap(
    long,
    parse(from_os_str),
    help = "directory with compiled contract artifacts [default: from config]"
  )]
  pub artifacts: Option<PathBuf>,

  #[clap(
    long,
    help = "name of the contract to deploy",
    default_value = "Tracking"
  )]
  pub contract: String,

  #[clap(short, long, help = "secret key of the deployer account")]
  pub keypair: Option<Keypair>,

  #[clap(
    long,
    parse(try_from_str = parse_seed),
    help = "base58 seed of the contract address [default: random]"
  )]
  pub seed: Option<ContractSeed>,

  #[clap(long, help = "base58 encoded constructor params of the contract")]
  init: Option<String>,

  #[clap(long, help = "wait until the contract is executable on chain")]
  pub wait: bool,

  #[clap(
    short,
    long,
    parse(from_occurrences),
    help = "Use verbose output (-vv very verbose output)"
  )]
  pub verbose: u64,
}

fn parse_seed(value: &str) -> Result<ContractSeed, String> {
  let mut seed = ContractSeed::default();
  match bs58::decode(value).into(&mut seed) {
    Ok(32) => Ok(seed),
    Ok(len) => Err(format!("expected a 32 bytes seed, got {len} bytes")),
    Err(e) => Err(format!("{e:?}")),
  }
}

impl CliOpts {
  /// Reads the config file and applies command line overrides.
  pub fn config(&self) -> Result<DeployConfig, ConfigError> {
    let mut config = DeployConfig::discover(self.config.as_deref())?;
    if let Some(ref artifacts) = self.artifacts {
      config.artifacts = artifacts.clone();
    }
    Ok(config)
  }

  pub fn deploy_options(&self) -> anyhow::Result<DeployOptions> {
    let init = match self.init {
      Some(ref init) => Some(
        bs58::decode(init)
          .into_vec()
          .map_err(|e| anyhow::anyhow!("invalid constructor params: {e:?}"))?,
      ),
      None => None,
    };

    Ok(DeployOptions {
      seed: self.seed,
      init,
    })
  }
}
