mod contract;
mod machine;
mod wasm;

pub use {
  contract::{AccountView, ContractError, Environment, Output},
  machine::{Executed, Limits, Machine, NativeContractEntrypoint},
};

use {
  crate::primitives::{Account, Pubkey},
  std::collections::BTreeMap,
};

/// Read access to accounts state.
pub trait State {
  fn get(&self, key: &Pubkey) -> Option<Account>;
}

impl State for BTreeMap<Pubkey, Account> {
  fn get(&self, key: &Pubkey) -> Option<Account> {
    BTreeMap::get(self, key).cloned()
  }
}
