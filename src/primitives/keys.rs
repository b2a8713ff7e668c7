use {
  super::{b58::ToBase58String, digest::sha3},
  borsh::{BorshDeserialize, BorshSerialize},
  curve25519_dalek::edwards::CompressedEdwardsY,
  ed25519_dalek::{PublicKey, SecretKey},
  rand::RngCore,
  serde::{Deserialize, Deserializer, Serialize, Serializer},
  std::{
    fmt::{Debug, Display, Formatter},
    ops::Deref,
    str::FromStr,
  },
  thiserror::Error,
};

/// Address of an account on chain.
///
/// Wallet addresses are ed25519 public keys and have a private key
/// that can sign transactions. Contract and other program owned
/// accounts live at derived addresses that are off the curve, so
/// nobody can sign on their behalf.
#[derive(
  Copy,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  BorshSerialize,
  BorshDeserialize,
)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
  /// Derives an off-curve address from this address and a list of seeds.
  ///
  /// The digest is `sha3(self || seeds... || bump)`, with `bump` as a
  /// little endian u32 starting at zero and incremented until the digest
  /// is not a valid curve point. The address of a contract is known
  /// before it is deployed, as it only depends on the seed.
  pub fn derive(&self, seeds: &[&[u8]]) -> Self {
    let mut input = self.0.to_vec();
    seeds.iter().for_each(|seed| input.extend_from_slice(seed));
    let prefix = input.len();

    let mut bump = 0u32;
    loop {
      input.truncate(prefix);
      input.extend_from_slice(&bump.to_le_bytes());
      let key = Pubkey(sha3(&input));
      if !key.has_private_key() {
        return key;
      }
      bump += 1;
    }
  }

  /// True when the address is a point on the ed25519 curve, that is
  /// when it can have a matching private key.
  pub fn has_private_key(&self) -> bool {
    CompressedEdwardsY::from_slice(&self.0)
      .decompress()
      .is_some()
  }

  pub fn to_bytes(&self) -> [u8; 32] {
    self.0
  }
}

impl Deref for Pubkey {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<[u8]> for Pubkey {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl From<PublicKey> for Pubkey {
  fn from(p: PublicKey) -> Self {
    Self(p.to_bytes())
  }
}

impl Display for Pubkey {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0.to_b58())
  }
}

impl Debug for Pubkey {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Pubkey({self})")
  }
}

impl FromStr for Pubkey {
  type Err = bs58::decode::Error;

  /// Parses the base58 form, which must decode to exactly 32 bytes.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut bytes = [0u8; 32];
    match bs58::decode(s).into(&mut bytes)? {
      32 => Ok(Self(bytes)),
      _ => Err(bs58::decode::Error::BufferTooSmall),
    }
  }
}

/// Represents a wallet account on the ed25519 curve that can
/// be controlled by an external wallet. This is the account that
/// pays for and authorizes contract deployments.
pub struct Keypair(ed25519_dalek::Keypair);

impl Keypair {
  /// Generates a new random keypair.
  pub fn generate() -> Self {
    let mut randbytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut randbytes);
    // any 32 bytes make a valid ed25519 secret
    Self::try_from(&randbytes[..]).expect("32 bytes is a valid secret key")
  }

  pub fn public(&self) -> Pubkey {
    self.0.public.into()
  }

  pub fn secret(&self) -> &SecretKey {
    &self.0.secret
  }
}

impl Clone for Keypair {
  fn clone(&self) -> Self {
    Self(ed25519_dalek::Keypair {
      secret: SecretKey::from_bytes(self.0.secret.as_bytes())
        .expect("secret of an existing keypair"),
      public: self.0.public,
    })
  }
}

impl Deref for Keypair {
  type Target = ed25519_dalek::Keypair;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl std::fmt::Debug for Keypair {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Keypair").field(&self.public()).finish()
  }
}

#[derive(Debug, Error)]
pub enum KeypairError {
  #[error("Failed parsing base58 string: {0:?}")]
  Base58ParseError(bs58::decode::Error),

  #[error("Expected a 32 bytes secret key, got {0} bytes")]
  InvalidLength(usize),

  #[error("{0}")]
  Ed25519Error(#[from] ed25519_dalek::ed25519::Error),
}

impl TryFrom<&[u8]> for Keypair {
  type Error = KeypairError;

  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    let secret = SecretKey::from_bytes(value)?;
    let public: PublicKey = (&secret).into();
    Ok(Self(ed25519_dalek::Keypair { secret, public }))
  }
}

impl FromStr for Keypair {
  type Err = KeypairError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let bytes = bs58::decode(value)
      .into_vec()
      .map_err(KeypairError::Base58ParseError)?;
    if bytes.len() != 32 {
      return Err(KeypairError::InvalidLength(bytes.len()));
    }
    Self::try_from(bytes.as_slice())
  }
}

/// Pubkeys are written as base58 strings, and read back either
/// from that form or from a plain array of 32 bytes.
impl Serialize for Pubkey {
  fn serialize<S: Serializer>(
    &self,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Pubkey {
  fn deserialize<D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
      Base58(String),
      Bytes([u8; 32]),
    }

    match Repr::deserialize(deserializer)? {
      Repr::Bytes(bytes) => Ok(Pubkey(bytes)),
      Repr::Base58(b58) => b58.parse().map_err(|e| {
        serde::de::Error::custom(format!("invalid pubkey {b58}: {e:?}"))
      }),
    }
  }
}
