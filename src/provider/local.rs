use {
  super::{Provider, ProviderError},
  crate::{
    primitives::{Account, Pubkey, ToBase58String},
    transaction::{Transaction, TransactionHash},
    vm::{Limits, Machine, State},
  },
  async_trait::async_trait,
  dashmap::DashMap,
  std::sync::Mutex,
  tracing::{debug, trace},
};

/// An in-process development chain.
///
/// Every accepted transaction is executed and applied immediately,
/// there are no blocks and no finality delays. Failed transactions
/// are rejected with the reason reported by the contract.
pub struct LocalNetwork {
  vm: Machine,
  accounts: DashMap<Pubkey, Account>,
  // transactions are applied one at a time
  executing: Mutex<()>,
}

impl Default for LocalNetwork {
  fn default() -> Self {
    Self::new(Limits::default())
  }
}

impl LocalNetwork {
  pub fn new(limits: Limits) -> Self {
    Self {
      vm: Machine::new(limits),
      accounts: DashMap::new(),
      executing: Mutex::new(()),
    }
  }

  fn apply(&self, transaction: &Transaction) -> Result<(), String> {
    let _guard = self.executing.lock().map_err(|e| e.to_string())?;
    let executed = self
      .vm
      .execute(transaction, self)
      .map_err(|e| e.to_string())?;

    for (key, value) in &executed.logs {
      trace!("transaction {} log: {key} => {value}", transaction.hash().to_b58());
    }

    for (addr, change) in executed.changes {
      match change {
        Some(account) => {
          self.accounts.insert(addr, account);
        }
        None => {
          self.accounts.remove(&addr);
        }
      }
    }
    Ok(())
  }
}

impl State for LocalNetwork {
  fn get(&self, key: &Pubkey) -> Option<Account> {
    self.accounts.get(key).map(|acc| acc.value().clone())
  }
}

#[async_trait]
impl Provider for LocalNetwork {
  fn name(&self) -> &str {
    "local"
  }

  async fn send_transaction(
    &self,
    transaction: &Transaction,
  ) -> Result<TransactionHash, ProviderError> {
    let hash = transaction.hash();
    debug!("local network executing transaction {}", hash.to_b58());
    self
      .apply(transaction)
      .map_err(|reason| ProviderError::Rejected {
        network: self.name().to_owned(),
        reason,
      })?;
    Ok(hash)
  }

  async fn get_account(
    &self,
    address: &Pubkey,
  ) -> Result<Option<Account>, ProviderError> {
    Ok(State::get(self, address))
  }
}
