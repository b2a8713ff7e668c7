//! Network providers
//!
//! A provider is the boundary between the deployer and a network. It
//! submits signed transactions and reads back accounts state. Remote
//! nodes are reached through [`HttpProvider`], and [`LocalNetwork`] is
//! an in-process chain used for development and tests.

mod http;
mod local;

pub use {http::HttpProvider, local::LocalNetwork};

use {
  crate::{
    primitives::{Account, Keypair, Pubkey},
    transaction::{Transaction, TransactionHash},
  },
  async_trait::async_trait,
  serde::{Deserialize, Serialize},
  thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("Transaction rejected by {network}: {reason}")]
  Rejected { network: String, reason: String },

  #[error("Request to {network} failed: {source}")]
  Transport {
    network: String,
    source: reqwest::Error,
  },

  #[error("Invalid network url '{0}'")]
  InvalidUrl(String),

  #[error("Unexpected response from {network}: {reason}")]
  InvalidResponse { network: String, reason: String },
}

/// The level of finality of the state returned by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
  Confirmed,
  Finalized,
}

impl Default for Commitment {
  fn default() -> Self {
    Commitment::Confirmed
  }
}

impl Commitment {
  pub fn as_str(&self) -> &'static str {
    match self {
      Commitment::Confirmed => "confirmed",
      Commitment::Finalized => "finalized",
    }
  }
}

#[async_trait]
pub trait Provider: Send + Sync {
  /// Human readable name of the network, used in logs and errors.
  fn name(&self) -> &str;

  /// Submits a signed transaction and returns its hash once the
  /// network has accepted it.
  async fn send_transaction(
    &self,
    transaction: &Transaction,
  ) -> Result<TransactionHash, ProviderError>;

  /// Reads an account, `None` when it does not exist.
  async fn get_account(
    &self,
    address: &Pubkey,
  ) -> Result<Option<Account>, ProviderError>;
}

/// Well known keypair that pays for deployments on the local network
/// when no other keypair is configured.
pub fn dev_keypair() -> Keypair {
  const SECRET: [u8; 32] = [
    157, 97, 177, 157, 239, 253, 90, 96, 186, 132, 74, 244, 146, 236, 44, 196,
    68, 73, 197, 105, 123, 50, 105, 25, 112, 59, 172, 3, 28, 174, 127, 96,
  ];
  Keypair::try_from(&SECRET[..]).expect("valid ed25519 secret")
}
