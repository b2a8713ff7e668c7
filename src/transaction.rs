use {
  crate::primitives::{b58, sha3, Keypair, Pubkey, ToBase58String},
  ed25519_dalek::{Signature, Signer, Verifier},
  serde::{Deserialize, Serialize},
  thiserror::Error,
};

pub type TransactionHash = [u8; 32];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("Transaction is missing signatures of required accounts")]
  MissingSigners,

  #[error("Signature of {0} does not verify against the transaction")]
  InvalidSignature(Pubkey),

  #[error("{0} is not a valid ed25519 public key")]
  InvalidSigner(Pubkey),
}

/// This is a parameter on the transaction that indicates that
/// a contract is going to touch this account. Only accounts
/// speciefied in the accounts list in a transaction can be
/// accessed by smart contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
  pub address: Pubkey,
  pub writable: bool,
  pub signer: bool,
}

impl AccountRef {
  pub fn readonly(address: Pubkey) -> Self {
    Self {
      address,
      writable: false,
      signer: false,
    }
  }

  pub fn writable(address: Pubkey) -> Self {
    Self {
      address,
      writable: true,
      signer: false,
    }
  }

  pub fn signer(address: Pubkey) -> Self {
    Self {
      address,
      writable: false,
      signer: true,
    }
  }
}

/// Represents a single invocation of a contract on chain.
///
/// The payer signs every transaction it pays for and its nonce
/// must match the current nonce of the payer account. Accounts
/// marked as signers must also have a signature attached.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub contract: Pubkey,
  pub nonce: u64,
  pub payer: Pubkey,
  pub accounts: Vec<AccountRef>,
  #[serde(with = "b58::serde")]
  pub params: Vec<u8>,
  #[serde(with = "b58::serde::signatures")]
  pub signatures: Vec<(Pubkey, Signature)>,
}

impl Transaction {
  pub fn new(
    contract: Pubkey,
    nonce: u64,
    payer: &Keypair,
    accounts: Vec<AccountRef>,
    params: Vec<u8>,
    signers: &[&Keypair],
  ) -> Self {
    let mut tx = Self {
      contract,
      nonce,
      payer: payer.public(),
      accounts,
      params,
      signatures: vec![],
    };

    let message = tx.message();
    tx.signatures.push((payer.public(), payer.sign(&message)));
    for signer in signers {
      if signer.public() != payer.public() {
        tx.signatures.push((signer.public(), signer.sign(&message)));
      }
    }

    tx
  }

  /// The bytes covered by all signatures of this transaction.
  fn message(&self) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(
      32 + 8 + 32 + self.accounts.len() * 34 + self.params.len(),
    );

    buffer.extend_from_slice(&self.contract);
    buffer.extend_from_slice(&self.nonce.to_le_bytes());
    buffer.extend_from_slice(&self.payer);
    for accref in &self.accounts {
      buffer.extend_from_slice(&accref.address);
      buffer.push(accref.writable as u8);
      buffer.push(accref.signer as u8);
    }
    buffer.extend_from_slice(&self.params);
    buffer
  }

  /// Sha3 of the signed message followed by all signatures.
  pub fn hash(&self) -> TransactionHash {
    let mut buffer = self.message();
    for (_, signature) in &self.signatures {
      buffer.extend_from_slice(&signature.to_bytes());
    }
    sha3(&buffer)
  }

  /// Verifies that all attached signatures are valid and that the
  /// payer and every account marked as a signer have signed the tx.
  pub fn verify_signatures(&self) -> Result<(), SignatureError> {
    let message = self.message();
    for (signer, signature) in &self.signatures {
      let pubkey = ed25519_dalek::PublicKey::from_bytes(signer)
        .map_err(|_| SignatureError::InvalidSigner(*signer))?;
      pubkey
        .verify(&message, signature)
        .map_err(|_| SignatureError::InvalidSignature(*signer))?;
    }

    let signed = |key: &Pubkey| self.signatures.iter().any(|(s, _)| s == key);
    if !signed(&self.payer) {
      return Err(SignatureError::MissingSigners);
    }

    if self
      .accounts
      .iter()
      .filter(|a| a.signer)
      .any(|a| !signed(&a.address))
    {
      return Err(SignatureError::MissingSigners);
    }

    Ok(())
  }

  /// Checks if a given account was signed by its private key.
  pub fn is_signed_by(&self, account: &Pubkey) -> bool {
    self.signatures.iter().any(|(s, _)| s == account)
  }
}

impl std::fmt::Debug for Transaction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transaction")
      .field("contract", &self.contract)
      .field("nonce", &self.nonce)
      .field("payer", &self.payer)
      .field("accounts", &self.accounts)
      .field("params", &self.params.to_b58())
      .field(
        "signatures",
        &self
          .signatures
          .iter()
          .map(|(p, s)| (p, s.to_b58()))
          .collect::<Vec<_>>(),
      )
      .finish()
  }
}
