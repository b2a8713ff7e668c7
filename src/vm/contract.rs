//! Builtin contract interface
//!
//! This module defines the basic types that are used to
//! invoke builtin contracts by the local network and carry
//! input and output data into and from the contract.

use {
  crate::{
    primitives::{Account, Pubkey},
    transaction::SignatureError,
  },
  thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
  #[error("Account does not exist")]
  AccountDoesNotExist,

  #[error("Account already exists")]
  AccountAlreadyExists,

  #[error("The specified account is not writable")]
  AccountNotWritable,

  #[error("Account is not owned by the invoked contract")]
  InvalidAccountOwner,

  #[error("Account size exceeds the maximum allowed limit")]
  AccountTooLarge,

  #[error("Invalid input accounts")]
  InvalidInputAccounts,

  #[error("Invalid input parameters")]
  InvalidInputParameters,

  #[error("Too many input accounts")]
  TooManyInputAccounts,

  #[error("Transaction nonce does not match the payer account nonce")]
  InvalidTransactionNonce,

  #[error("No builtin contract at {0}")]
  ContractDoesNotExist(Pubkey),

  #[error("Signature error: {0}")]
  SignatureError(#[from] SignatureError),

  #[error("{0}")]
  Other(String),
}

/// An account referenced by a transaction as seen by the contract.
#[derive(Debug, Clone)]
pub struct AccountView {
  pub account: Option<Account>,
  pub writable: bool,
  pub signer: bool,
}

impl AccountView {
  /// Accounts that have no data, no owner and are not executable
  /// are treated as not existing.
  pub fn is_empty(&self) -> bool {
    match &self.account {
      None => true,
      Some(acc) => !acc.executable && acc.data.is_none() && acc.owner.is_none(),
    }
  }
}

/// This is the self-cointained input type that is passed to the
/// contract code containing all accounts data referenced by the
/// transaction.
#[derive(Debug)]
pub struct Environment {
  pub address: Pubkey,
  pub accounts: Vec<(Pubkey, AccountView)>,
}

/// Effects of a successful contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
  LogEntry(String, String),
  CreateOwnedAccount(Pubkey, Option<Vec<u8>>),
  WriteAccountData(Pubkey, Option<Vec<u8>>),
  DeleteOwnedAccount(Pubkey),
  CreateExecutableAccount(Pubkey, Vec<u8>),
}

/// Represents the output of invocing a contract by a transaction.
pub type Result = std::result::Result<Vec<Output>, ContractError>;
