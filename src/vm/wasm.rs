//! Wasm VM Contract
//!
//! This builtin contract implements WASM smart contract deployment
//! on the local network: a bytecode buffer is allocated, filled slot
//! by slot, and installed as an executable contract account.

use {
  super::{
    contract::{self, AccountView, ContractError, Environment, Output},
    Machine,
  },
  crate::{
    deployer::{
      bytecode_address,
      contract_address,
      BytecodeAccount,
      BytecodeChecksum,
      ContractSeed,
      Instruction,
      MAX_BYTECODE_SIZE,
      MAX_SLOT_SIZE,
    },
    primitives::{sha3, Pubkey, ToBase58String},
    transaction::SignatureError,
  },
  borsh::{BorshDeserialize, BorshSerialize},
};

/// This builtin contract allows external users of the blockchain to upload
/// and deploy new contracts WASM bytecode.
pub fn contract(
  env: &Environment,
  params: &[u8],
  vm: &Machine,
) -> contract::Result {
  let instruction = Instruction::try_from_slice(params)
    .map_err(|_| ContractError::InvalidInputParameters)?;

  match instruction {
    Instruction::Allocate {
      seed,
      checksum,
      authority,
      size,
    } => process_allocate(env, seed, checksum, authority, size, vm),
    Instruction::Upload { seed, index, bytes } => {
      process_upload(env, seed, index, bytes)
    }
    Instruction::Install { seed, init } => process_install(env, seed, init, vm),
  }
}

/// Accounts expected by this instruction:
///   0. [-r--] Contract destination address [Wasm.derive(seed)]
///   1. [-rw-] Contract bytecode storage address
///       [Wasm.derive(seed, b"bytecode")]
fn process_allocate(
  env: &Environment,
  seed: ContractSeed,
  checksum: BytecodeChecksum,
  authority: Pubkey,
  size: u32,
  vm: &Machine,
) -> contract::Result {
  if env.accounts.len() != 2 {
    return Err(ContractError::InvalidInputAccounts);
  }

  if size == 0 {
    return Err(ContractError::InvalidInputParameters);
  }

  // ensure that the contract is under the max contract limit
  // and that all of its slots can be indexed by uploads.
  let size_limit = vm.limits().max_contract_size.min(MAX_BYTECODE_SIZE);
  if size as usize > size_limit {
    return Err(ContractError::AccountTooLarge);
  }

  let (c_addr, c_acc) = contract_account(&seed, env)?;

  // make sure that this contract address is not already taken, if it is
  // then a different seed value will need to be used.
  if !c_acc.is_empty() {
    return Err(ContractError::AccountAlreadyExists);
  }

  let (b_addr, b_acc) = bytecode_account(&seed, env)?;

  if !b_acc.is_empty() {
    return Err(ContractError::AccountAlreadyExists);
  }

  if !b_acc.writable {
    return Err(ContractError::AccountNotWritable);
  }

  // The authority account will need to sign upload and install transactions,
  // so it must be on the ed25519 curve and cannot be a derived address.
  if !authority.has_private_key() {
    return Err(ContractError::InvalidInputParameters);
  }

  let contents = BytecodeAccount::new(authority, size, checksum);

  Ok(vec![
    Output::LogEntry("action".to_owned(), "allocate".to_owned()),
    Output::LogEntry("contract".to_owned(), c_addr.to_string()),
    Output::LogEntry("size".to_owned(), size.to_string()),
    Output::LogEntry("checksum".to_owned(), checksum.to_b58()),
    Output::LogEntry("authority".to_owned(), authority.to_string()),
    // at this stage only create the bytecode account
    Output::CreateOwnedAccount(*b_addr, Some(serialize(&contents)?)),
  ])
}

/// Accounts expected by this instruction:
///   0. [-r--] Contract destination address [Wasm.derive(seed)]
///   1. [-rw-] Contract bytecode storage address
///       [Wasm.derive(seed, b"bytecode")]
///   2. [---s] Signature of the authority account specified during
///       [`Allocate`]
fn process_upload(
  env: &Environment,
  seed: ContractSeed,
  index: u16,
  bytes: Vec<u8>,
) -> contract::Result {
  if env.accounts.len() != 3 {
    return Err(ContractError::InvalidInputAccounts);
  }

  if bytes.is_empty() || bytes.len() > MAX_SLOT_SIZE {
    return Err(ContractError::InvalidInputParameters);
  }

  let (c_addr, c_acc) = contract_account(&seed, env)?;

  if !c_acc.is_empty() {
    return Err(ContractError::AccountAlreadyExists);
  }

  let (b_addr, b_acc) = bytecode_account(&seed, env)?;

  if !b_acc.writable {
    return Err(ContractError::AccountNotWritable);
  }

  let mut content = read_bytecode_account(env, b_acc)?;
  verify_authority(env, &content)?;

  let index = index as usize;
  let range = content
    .slot_range(index)
    .ok_or(ContractError::InvalidInputParameters)?;

  if content.mask[index] {
    return Err(ContractError::Other(format!(
      "slot {} is already uploaded",
      index
    )));
  }

  // all slots except the last one are full
  if range.len() != bytes.len() {
    return Err(ContractError::InvalidInputParameters);
  }

  content.mask[index] = true;
  content.bytecode[range].copy_from_slice(&bytes);

  Ok(vec![
    Output::LogEntry("action".to_owned(), "upload".to_owned()),
    Output::LogEntry("contract".to_owned(), c_addr.to_string()),
    Output::LogEntry("slot".to_owned(), index.to_string()),
    Output::WriteAccountData(*b_addr, Some(serialize(&content)?)),
  ])
}

/// Accounts expected by this instruction:
///   0. [-rw-] Contract destination address [Wasm.derive(seed)]
///   1. [-rw-] Contract bytecode storage address
///       [Wasm.derive(seed, b"bytecode")]
///   2. [---s] Signature of the authority account specified during
///       [`Allocate`]
///   3..N Optional accounts passed to the init instruction
fn process_install(
  env: &Environment,
  seed: ContractSeed,
  init: Option<Vec<u8>>,
  vm: &Machine,
) -> contract::Result {
  if env.accounts.len() < 3 {
    return Err(ContractError::InvalidInputAccounts);
  }

  let (c_addr, c_acc) = contract_account(&seed, env)?;

  if !c_acc.writable {
    return Err(ContractError::AccountNotWritable);
  }

  if !c_acc.is_empty() {
    return Err(ContractError::AccountAlreadyExists);
  }

  let (b_addr, b_acc) = bytecode_account(&seed, env)?;

  if !b_acc.writable {
    return Err(ContractError::AccountNotWritable);
  }

  let content = read_bytecode_account(env, b_acc)?;
  verify_authority(env, &content)?;

  if !content.is_complete() {
    return Err(ContractError::Other(
      "Not all bytecode slots are uploaded".to_owned(),
    ));
  }

  if sha3(&content.bytecode) != content.checksum {
    return Err(ContractError::Other(
      "Uploaded bytecode does not match its checksum".to_owned(),
    ));
  }

  vm.validate_bytecode(&content.bytecode)?;

  let mut output = vec![
    Output::LogEntry("action".to_owned(), "install".to_owned()),
    Output::LogEntry("contract".to_owned(), c_addr.to_string()),
    Output::DeleteOwnedAccount(*b_addr),
    Output::CreateExecutableAccount(*c_addr, content.bytecode),
  ];

  // the local network has no contract runtime, constructor
  // params are recorded in the transaction logs only.
  if let Some(params) = init {
    output.push(Output::LogEntry("init".to_owned(), params.to_b58()));
  }

  Ok(output)
}

fn serialize(content: &BytecodeAccount) -> Result<Vec<u8>, ContractError> {
  content
    .try_to_vec()
    .map_err(|e| ContractError::Other(e.to_string()))
}

/// Reads the bytecode buffer and makes sure it is owned by this contract.
fn read_bytecode_account(
  env: &Environment,
  b_acc: &AccountView,
) -> Result<BytecodeAccount, ContractError> {
  let account = b_acc
    .account
    .as_ref()
    .ok_or(ContractError::AccountDoesNotExist)?;

  if account.owner != Some(env.address) {
    return Err(ContractError::InvalidAccountOwner);
  }

  match account.data {
    Some(ref data) => BytecodeAccount::try_from_slice(data.as_slice())
      .map_err(|_| ContractError::InvalidInputAccounts),
    None => Err(ContractError::AccountDoesNotExist),
  }
}

/// Upload and install are only accepted when signed by the
/// authority that allocated the bytecode buffer.
fn verify_authority(
  env: &Environment,
  content: &BytecodeAccount,
) -> Result<(), ContractError> {
  let (a_addr, a_acc) = &env.accounts[2];

  if content.authority != *a_addr {
    return Err(ContractError::InvalidInputAccounts);
  }

  if !a_acc.signer {
    return Err(ContractError::SignatureError(
      SignatureError::MissingSigners,
    ));
  }

  Ok(())
}

fn contract_account<'e>(
  seed: &ContractSeed,
  env: &'e Environment,
) -> Result<(&'e Pubkey, &'e AccountView), ContractError> {
  match env.accounts.first() {
    Some((addr, acc)) if *addr == contract_address(seed) => Ok((addr, acc)),
    _ => Err(ContractError::InvalidInputAccounts),
  }
}

fn bytecode_account<'e>(
  seed: &ContractSeed,
  env: &'e Environment,
) -> Result<(&'e Pubkey, &'e AccountView), ContractError> {
  match env.accounts.get(1) {
    Some((addr, acc)) if *addr == bytecode_address(seed) => Ok((addr, acc)),
    _ => Err(ContractError::InvalidInputAccounts),
  }
}
