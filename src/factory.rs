//! Contract factory
//!
//! A factory binds a compiled contract artifact to a signer and a
//! network provider, and deploys new instances of that contract.

use {
  crate::{
    artifacts::{Artifact, ArtifactError},
    deployer::{
      bytecode_address,
      contract_address,
      ContractSeed,
      Instruction,
      MAX_BYTECODE_SIZE,
      MAX_SLOT_SIZE,
      WASM_VM_ADDR,
    },
    primitives::{Keypair, Pubkey, ToBase58String},
    provider::{Provider, ProviderError},
    transaction::{AccountRef, Transaction, TransactionHash},
    vm::Limits,
  },
  borsh::BorshSerialize,
  rand::RngCore,
  std::{path::Path, sync::Arc, time::Duration},
  thiserror::Error,
  tokio::time::{sleep, Instant},
  tracing::{debug, info},
};

#[derive(Debug, Error)]
pub enum DeployError {
  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error(transparent)]
  Provider(#[from] ProviderError),

  #[error("Contract bytecode of {size} bytes exceeds the limit of {limit}")]
  BytecodeTooLarge { size: usize, limit: usize },

  #[error("Contract already deployed at {0}")]
  AddressTaken(Pubkey),

  #[error("Contract {address} was not deployed within {timeout:?}")]
  Timeout { address: Pubkey, timeout: Duration },

  #[error("Failed encoding deployment instruction: {0}")]
  Encoding(#[from] std::io::Error),
}

/// Parameters of a single deployment.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
  /// Determines the contract address, random when not set.
  pub seed: Option<ContractSeed>,

  /// Constructor params passed to the contract once it is installed.
  pub init: Option<Vec<u8>>,
}

/// Deploys instances of one contract artifact.
pub struct ContractFactory {
  artifact: Artifact,
  signer: Keypair,
  provider: Arc<dyn Provider>,
  limits: Limits,
}

impl ContractFactory {
  pub fn new(
    artifact: Artifact,
    signer: Keypair,
    provider: Arc<dyn Provider>,
  ) -> Self {
    Self {
      artifact,
      signer,
      provider,
      limits: Limits::default(),
    }
  }

  /// Loads the artifact of the named contract and creates its factory.
  pub fn from_artifacts(
    dir: &Path,
    name: &str,
    signer: Keypair,
    provider: Arc<dyn Provider>,
  ) -> Result<Self, DeployError> {
    Ok(Self::new(Artifact::load(dir, name)?, signer, provider))
  }

  pub fn with_limits(mut self, limits: Limits) -> Self {
    self.limits = limits;
    self
  }

  /// The deployer account, it pays for and authorizes the deployment.
  pub fn signer(&self) -> Pubkey {
    self.signer.public()
  }

  /// Builds all transactions that deploy the contract with the given
  /// seed, starting at a given payer nonce. The allocation comes first,
  /// then one upload per bytecode slot, then the install.
  pub fn deployment_transactions(
    &self,
    seed: &ContractSeed,
    nonce: u64,
    init: Option<Vec<u8>>,
  ) -> Result<Vec<Transaction>, DeployError> {
    let bytecode = &self.artifact.bytecode;
    let contract = contract_address(seed);
    let buffer = bytecode_address(seed);
    let authority = self.signer.public();
    let too_large = || DeployError::BytecodeTooLarge {
      size: bytecode.len(),
      limit: MAX_BYTECODE_SIZE,
    };

    let mut instructions = vec![(
      Instruction::Allocate {
        seed: *seed,
        checksum: self.artifact.checksum(),
        authority,
        size: u32::try_from(bytecode.len()).map_err(|_| too_large())?,
      },
      vec![AccountRef::readonly(contract), AccountRef::writable(buffer)],
    )];

    for (index, bytes) in bytecode.chunks(MAX_SLOT_SIZE).enumerate() {
      instructions.push((
        Instruction::Upload {
          seed: *seed,
          index: u16::try_from(index).map_err(|_| too_large())?,
          bytes: bytes.to_vec(),
        },
        vec![
          AccountRef::readonly(contract),
          AccountRef::writable(buffer),
          AccountRef::signer(authority),
        ],
      ));
    }

    instructions.push((
      Instruction::Install { seed: *seed, init },
      vec![
        AccountRef::writable(contract),
        AccountRef::writable(buffer),
        AccountRef::signer(authority),
      ],
    ));

    instructions
      .into_iter()
      .zip(nonce..)
      .map(|((ix, accounts), nonce)| -> Result<_, DeployError> {
        Ok(Transaction::new(
          *WASM_VM_ADDR,
          nonce,
          &self.signer,
          accounts,
          ix.try_to_vec()?,
          &[],
        ))
      })
      .collect()
  }

  /// Deploys a new instance of the contract.
  ///
  /// Returns once every deployment transaction was accepted by the
  /// network. Use [`Contract::wait_for_deployment`] to wait until the
  /// contract is executable on chain.
  pub async fn deploy(
    &self,
    options: DeployOptions,
  ) -> Result<Contract, DeployError> {
    let size = self.artifact.bytecode.len();
    if size == 0 {
      return Err(
        ArtifactError::EmptyBytecode(self.artifact.contract_name.clone()).into(),
      );
    }

    // slot indices are u16, so configured limits are capped
    let limit = self.limits.max_contract_size.min(MAX_BYTECODE_SIZE);
    if size > limit {
      return Err(DeployError::BytecodeTooLarge { size, limit });
    }

    let seed = options.seed.unwrap_or_else(|| {
      let mut seed = [0u8; 32];
      rand::thread_rng().fill_bytes(&mut seed);
      seed
    });

    let target = contract_address(&seed);
    if self.provider.get_account(&target).await?.is_some() {
      return Err(DeployError::AddressTaken(target));
    }

    let nonce = self
      .provider
      .get_account(&self.signer.public())
      .await?
      .map(|acc| acc.nonce)
      .unwrap_or(0);

    info!(
      "deploying {} ({} bytes) to {} at {target}",
      self.artifact.contract_name,
      size,
      self.provider.name()
    );

    let transactions = self.deployment_transactions(&seed, nonce, options.init)?;
    let count = transactions.len();

    let mut hashes = Vec::with_capacity(count);
    for (i, tx) in transactions.iter().enumerate() {
      let hash = self.provider.send_transaction(tx).await?;
      debug!("[{}/{count}] transaction {} accepted", i + 1, hash.to_b58());
      hashes.push(hash);
    }

    Ok(Contract {
      target,
      seed,
      transactions: hashes,
      provider: Arc::clone(&self.provider),
    })
  }
}

/// A handle to a deployed contract instance.
pub struct Contract {
  /// The address of the deployed contract.
  pub target: Pubkey,

  /// The seed that produced the contract address.
  pub seed: ContractSeed,

  /// Hashes of the deployment transactions, in submission order.
  pub transactions: Vec<TransactionHash>,

  provider: Arc<dyn Provider>,
}

impl Contract {
  /// The address of the deployed contract.
  pub fn address(&self) -> Pubkey {
    self.target
  }

  /// Waits until the contract account is executable on chain.
  pub async fn wait_for_deployment(
    &self,
    poll_interval: Duration,
    timeout: Duration,
  ) -> Result<(), DeployError> {
    let deadline = Instant::now() + timeout;
    loop {
      match self.provider.get_account(&self.target).await? {
        Some(account) if account.executable => {
          info!("contract {} is executable", self.target);
          return Ok(());
        }
        _ => debug!("contract {} not deployed yet", self.target),
      }

      if Instant::now() + poll_interval > deadline {
        return Err(DeployError::Timeout {
          address: self.target,
          timeout,
        });
      }
      sleep(poll_interval).await;
    }
  }
}

impl std::fmt::Debug for Contract {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Contract")
      .field("target", &self.target)
      .field("seed", &self.seed.to_b58())
      .field(
        "transactions",
        &self
          .transactions
          .iter()
          .map(|h| h.to_b58())
          .collect::<Vec<_>>(),
      )
      .field("provider", &self.provider.name())
      .finish()
  }
}
