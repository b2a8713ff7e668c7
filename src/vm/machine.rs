use {
  super::{
    contract::{AccountView, ContractError, Environment, Output},
    wasm,
    State,
  },
  crate::{
    deployer::WASM_VM_ADDR,
    primitives::{Account, Pubkey, ToBase58String},
    transaction::Transaction,
  },
  serde::{Deserialize, Serialize},
  std::collections::{BTreeMap, HashMap},
  tracing::debug,
};

/// The signature of a builtin contract implemented in native code.
pub type NativeContractEntrypoint =
  fn(&Environment, &[u8], &Machine) -> super::contract::Result;

/// Chain-wide limits enforced on transactions and accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
  /// Maximum size of the WASM bytecode of a single contract.
  pub max_contract_size: usize,

  /// Maximum number of accounts referenced by a transaction.
  pub max_input_accounts: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      max_contract_size: 614400,
      max_input_accounts: 32,
    }
  }
}

/// The result of executing one transaction: every account it
/// modified (`None` for deleted accounts) and the emitted logs.
#[derive(Debug, Default)]
pub struct Executed {
  pub changes: BTreeMap<Pubkey, Option<Account>>,
  pub logs: Vec<(String, String)>,
}

/// Represents a state machine that takes as an input a state
/// and a transaction and outputs the changes to that state.
pub struct Machine {
  limits: Limits,
  builtins: HashMap<Pubkey, NativeContractEntrypoint>,
}

impl Default for Machine {
  fn default() -> Self {
    Self::new(Limits::default())
  }
}

impl Machine {
  pub fn new(limits: Limits) -> Self {
    let mut builtins = HashMap::<Pubkey, NativeContractEntrypoint>::new();
    builtins.insert(*WASM_VM_ADDR, wasm::contract);
    Self { limits, builtins }
  }

  pub fn limits(&self) -> &Limits {
    &self.limits
  }

  /// Makes sure that the bytecode compiles as a WASM module.
  pub fn validate_bytecode(&self, bytecode: &[u8]) -> Result<(), ContractError> {
    let store = wasmer::Store::default();
    wasmer::Module::validate(&store, bytecode)
      .map_err(|e| ContractError::Other(format!("invalid wasm bytecode: {e}")))
  }

  /// Runs a transaction against a state. Any failure in the contract
  /// or in applying its outputs fails the entire transaction and none
  /// of its changes are returned.
  pub fn execute(
    &self,
    transaction: &Transaction,
    state: &impl State,
  ) -> Result<Executed, ContractError> {
    if transaction.accounts.len() > self.limits.max_input_accounts {
      return Err(ContractError::TooManyInputAccounts);
    }

    // don't proceed unless all tx signatures are valid.
    transaction.verify_signatures()?;

    // the payer nonce is incremented with every transaction it pays
    // for, which prevents the same transaction being replayed.
    let payer = state.get(&transaction.payer).unwrap_or_default();
    if transaction.nonce != payer.nonce {
      return Err(ContractError::InvalidTransactionNonce);
    }

    let entrypoint = self
      .builtins
      .get(&transaction.contract)
      .ok_or(ContractError::ContractDoesNotExist(transaction.contract))?;

    let env = Environment {
      address: transaction.contract,
      accounts: transaction
        .accounts
        .iter()
        .map(|a| {
          (a.address, AccountView {
            account: state.get(&a.address),
            writable: a.writable,
            signer: a.signer && transaction.is_signed_by(&a.address),
          })
        })
        .collect(),
    };

    let outputs = entrypoint(&env, &transaction.params, self)?;

    let mut executed = Executed::default();
    for output in outputs {
      self.apply(&env, output, &mut executed)?;
    }

    executed.changes.insert(
      transaction.payer,
      Some(Account {
        nonce: payer.nonce + 1,
        ..payer
      }),
    );

    debug!(
      "transaction {} executed with {} changes",
      transaction.hash().to_b58(),
      executed.changes.len()
    );

    Ok(executed)
  }

  fn apply(
    &self,
    env: &Environment,
    output: Output,
    executed: &mut Executed,
  ) -> Result<(), ContractError> {
    // the current view of an account, including changes
    // made by previous outputs of the same transaction.
    let current = |addr: &Pubkey,
                   executed: &Executed|
     -> Result<Option<Account>, ContractError> {
      let (_, view) = env
        .accounts
        .iter()
        .find(|(a, _)| a == addr)
        .ok_or(ContractError::InvalidInputAccounts)?;
      if !view.writable {
        return Err(ContractError::AccountNotWritable);
      }
      Ok(match executed.changes.get(addr) {
        Some(changed) => changed.clone(),
        None => view.account.clone(),
      })
    };

    match output {
      Output::LogEntry(key, value) => {
        executed.logs.push((key, value));
      }
      Output::CreateOwnedAccount(addr, data) => {
        if current(&addr, executed)?.is_some() {
          return Err(ContractError::AccountAlreadyExists);
        }
        executed.changes.insert(
          addr,
          Some(Account {
            nonce: 0,
            executable: false,
            owner: Some(env.address),
            data,
          }),
        );
      }
      Output::WriteAccountData(addr, data) => {
        let account = current(&addr, executed)?
          .ok_or(ContractError::AccountDoesNotExist)?;
        if account.owner != Some(env.address) {
          return Err(ContractError::InvalidAccountOwner);
        }
        executed
          .changes
          .insert(addr, Some(Account { data, ..account }));
      }
      Output::DeleteOwnedAccount(addr) => {
        let account = current(&addr, executed)?
          .ok_or(ContractError::AccountDoesNotExist)?;
        if account.owner != Some(env.address) {
          return Err(ContractError::InvalidAccountOwner);
        }
        executed.changes.insert(addr, None);
      }
      Output::CreateExecutableAccount(addr, bytecode) => {
        if current(&addr, executed)?.is_some() {
          return Err(ContractError::AccountAlreadyExists);
        }
        if bytecode.len() > self.limits.max_contract_size {
          return Err(ContractError::AccountTooLarge);
        }
        executed.changes.insert(
          addr,
          Some(Account {
            nonce: 0,
            executable: true,
            owner: Some(env.address),
            data: Some(bytecode),
          }),
        );
      }
    }
    Ok(())
  }
}
