//! WASM contract deployment protocol
//!
//! Contracts are deployed through the builtin `WasmVM` contract in three
//! phases. First a bytecode buffer account is allocated, then the bytecode
//! is uploaded into it in slots of [`MAX_SLOT_SIZE`] bytes, and finally the
//! buffer is installed as an executable contract account. Both the buffer
//! and the contract addresses are derived from a seed chosen by the
//! deployer, so the contract address is known upfront.

use {
  crate::primitives::Pubkey,
  borsh::{BorshDeserialize, BorshSerialize},
  once_cell::sync::Lazy,
};

pub type ContractSeed = [u8; 32];
pub type BytecodeChecksum = [u8; 32];

/// 2kb max per uploaded slot
pub const MAX_SLOT_SIZE: usize = 2048;

/// Largest bytecode addressable by u16 slot indices, 128 MiB.
pub const MAX_BYTECODE_SIZE: usize = MAX_SLOT_SIZE * (u16::MAX as usize + 1);

/// Address of the builtin contract that installs WASM contracts.
pub static WASM_VM_ADDR: Lazy<Pubkey> = Lazy::new(|| {
  "WasmVM1xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"
    .parse()
    .expect("valid builtin address")
});

/// Address at which a contract deployed with the given seed will live.
pub fn contract_address(seed: &ContractSeed) -> Pubkey {
  WASM_VM_ADDR.derive(&[seed])
}

/// Address of the temporary account that holds the bytecode while it
/// is being uploaded.
pub fn bytecode_address(seed: &ContractSeed) -> Pubkey {
  WASM_VM_ADDR.derive(&[seed, b"bytecode"])
}

/// Number of upload slots needed for a bytecode of a given size.
pub fn slot_count(size: usize) -> usize {
  (size + MAX_SLOT_SIZE - 1) / MAX_SLOT_SIZE
}

/// This is the instruction param to the wasm deployment contract
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Instruction {
  /// Allocates the bytecode buffer of a new WASM contract.
  ///
  /// Accounts expected by this instruction:
  ///   0. [-r--] Contract destination address [Wasm.derive(seed)]
  ///   1. [-rw-] Contract bytecode storage address
  ///       [Wasm.derive(seed, b"bytecode")]
  Allocate {
    /// A seed value used to generate the contract address.
    /// The contract will be deployed at Wasm.derive(seed).
    seed: ContractSeed,

    /// Sha3 of the final WASM bytecode.
    checksum: BytecodeChecksum,

    /// The account that is allowed to upload pieces of the contract code
    authority: Pubkey,

    /// WASM bytecode size.
    size: u32,
  },

  /// Uploads a piece of the wasm bytecode and stores it in the bytecode
  /// buffer. Each slot is 2kb, only the last one may be shorter.
  ///
  /// Accounts expected by this instruction:
  ///   0. [-r--] Contract destination address [Wasm.derive(seed)]
  ///   1. [-rw-] Contract bytecode storage address
  ///       [Wasm.derive(seed, b"bytecode")]
  ///   2. [---s] Signature of the authority account specified during
  ///       [`Allocate`]
  Upload {
    seed: ContractSeed,

    /// Index of the slot, stored at [2kb * index, 2kb * index + len]
    index: u16,

    bytes: Vec<u8>,
  },

  /// Once all the contract bytecode is uploaded, this instruction
  /// creates an executable contract out of it and optionally invokes
  /// the contract constructor with the `init` params.
  ///
  /// Accounts expected by this instruction:
  ///   0. [-rw-] Contract destination address [Wasm.derive(seed)]
  ///   1. [-rw-] Contract bytecode storage address
  ///       [Wasm.derive(seed, b"bytecode")]
  ///   2. [---s] Signature of the authority account specified during
  ///       [`Allocate`]
  ///   3..N Optional accounts passed to the init instruction
  Install {
    seed: ContractSeed,
    init: Option<Vec<u8>>,
  },
}

/// An account that stores the wasm bytecode while it is being
/// uploaded before it is installed. Owned by the `WasmVM` contract.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct BytecodeAccount {
  /// The account that is authorized to upload bytecode, and it must
  /// be the signer of all upload and install transactions.
  pub authority: Pubkey,

  /// The size of the final wasm contract bytecode.
  pub size: u32,

  /// Sha3 of the final bytecode contents after its uploaded.
  pub checksum: BytecodeChecksum,

  /// Which 2kb slots of the bytecode were already uploaded.
  pub mask: Vec<bool>,

  /// The bytecode buffer, zero-filled until uploaded.
  pub bytecode: Vec<u8>,
}

impl BytecodeAccount {
  pub fn new(authority: Pubkey, size: u32, checksum: BytecodeChecksum) -> Self {
    Self {
      authority,
      size,
      checksum,
      mask: vec![false; slot_count(size as usize)],
      bytecode: vec![0; size as usize],
    }
  }

  /// Byte range of a slot within the bytecode buffer.
  pub fn slot_range(&self, index: usize) -> Option<std::ops::Range<usize>> {
    if index >= self.mask.len() {
      return None;
    }
    let start = index * MAX_SLOT_SIZE;
    let end = usize::min(start + MAX_SLOT_SIZE, self.size as usize);
    Some(start..end)
  }

  pub fn is_complete(&self) -> bool {
    self.mask.iter().all(|s| *s)
  }
}
