mod cli;

use {
  clap::Parser,
  cli::CliOpts,
  tracing::{info, warn, Level},
  tracking_deploy::{config::LOCAL_NETWORK, factory::ContractFactory},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let opts = CliOpts::parse();

  // stdout carries only the deployment result
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_max_level(match opts.verbose {
      1 => Level::DEBUG,
      2 => Level::TRACE,
      _ => Level::INFO,
    })
    .init();

  info!("Version: {}", env!("CARGO_PKG_VERSION"));

  let config = opts.config()?;
  let network = config.network(opts.network.as_deref(), opts.keypair.clone())?;

  info!("Network: {}", network.name);
  info!("Deployer: {}", network.keypair.public());
  if network.name == LOCAL_NETWORK {
    warn!("the local network state is discarded when the deployment exits");
  }

  let factory = ContractFactory::from_artifacts(
    &config.artifacts_dir()?,
    &opts.contract,
    network.keypair,
    network.provider,
  )?
  .with_limits(config.limits.clone());

  let contract = factory.deploy(opts.deploy_options()?).await?;

  if opts.wait {
    contract
      .wait_for_deployment(network.poll_interval, network.timeout)
      .await?;
  }

  println!("{} deployed to {}, using target", opts.contract, contract.target);
  println!(
    "{} deployed to {}, using address method",
    opts.contract,
    contract.address()
  );

  Ok(())
}
