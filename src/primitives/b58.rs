pub trait ToBase58String {
  fn to_b58(&self) -> String;
}

impl ToBase58String for ed25519_dalek::Signature {
  fn to_b58(&self) -> String {
    bs58::encode(self.to_bytes()).into_string()
  }
}

impl ToBase58String for [u8] {
  fn to_b58(&self) -> String {
    bs58::encode(self).into_string()
  }
}

impl ToBase58String for [u8; 32] {
  fn to_b58(&self) -> String {
    bs58::encode(self).into_string()
  }
}

impl ToBase58String for Vec<u8> {
  fn to_b58(&self) -> String {
    bs58::encode(self).into_string()
  }
}

/// Serde adapters that encode binary fields as base58 strings,
/// which is the wire format of the node JSON API.
pub mod serde {
  use {
    crate::primitives::Pubkey,
    ed25519_dalek::Signature,
    serde::{Deserialize, Deserializer, Serialize, Serializer},
  };

  pub fn serialize<S: Serializer>(
    v: &impl AsRef<[u8]>,
    s: S,
  ) -> Result<S::Ok, S::Error> {
    let b58 = bs58::encode(v).into_string();
    String::serialize(&b58, s)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Vec<u8>, D::Error> {
    let b58 = String::deserialize(d)?;
    bs58::decode(b58.as_bytes())
      .into_vec()
      .map_err(serde::de::Error::custom)
  }

  pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(
      v: &Option<Vec<u8>>,
      s: S,
    ) -> Result<S::Ok, S::Error> {
      let b58 = v.as_ref().map(|v| bs58::encode(v).into_string());
      Option::<String>::serialize(&b58, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      d: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
      match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(b58) => bs58::decode(b58.as_bytes())
          .into_vec()
          .map(Some)
          .map_err(serde::de::Error::custom),
      }
    }
  }

  pub mod signature {
    use super::*;

    pub fn serialize<S: Serializer>(
      v: &Signature,
      s: S,
    ) -> Result<S::Ok, S::Error> {
      let b58 = bs58::encode(v.to_bytes()).into_string();
      String::serialize(&b58, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      d: D,
    ) -> Result<Signature, D::Error> {
      let b58 = String::deserialize(d)?;
      let bytes = bs58::decode(b58.as_bytes())
        .into_vec()
        .map_err(serde::de::Error::custom)?;
      Signature::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
  }

  /// Transaction signatures as a list of `[signer, signature]` pairs.
  pub mod signatures {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapper(Pubkey, #[serde(with = "super::signature")] Signature);

    pub fn serialize<S: Serializer>(
      v: &[(Pubkey, Signature)],
      s: S,
    ) -> Result<S::Ok, S::Error> {
      let sigs: Vec<_> = v.iter().map(|(p, s)| Wrapper(*p, *s)).collect();
      Vec::serialize(&sigs, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      d: D,
    ) -> Result<Vec<(Pubkey, Signature)>, D::Error> {
      Ok(
        Vec::deserialize(d)?
          .into_iter()
          .map(|Wrapper(p, s)| (p, s))
          .collect(),
      )
    }
  }
}
