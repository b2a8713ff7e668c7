use {
  super::Pubkey,
  serde::{Deserialize, Serialize},
};

/// The view of an on-chain account as seen by the deployer.
///
/// Contract accounts are `executable` and hold the contract bytecode
/// in `data`. Wallet accounts carry the `nonce` that every transaction
/// paid by them has to match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  #[serde(default)]
  pub nonce: u64,

  #[serde(default)]
  pub executable: bool,

  #[serde(default)]
  pub owner: Option<Pubkey>,

  #[serde(default, with = "super::b58::serde::optional")]
  pub data: Option<Vec<u8>>,
}

impl Account {
  #[cfg(test)]
  pub fn test_new(value: u8) -> Self {
    Self {
      nonce: 0,
      executable: false,
      owner: None,
      data: Some(vec![value]),
    }
  }
}

#[cfg(test)]
mod test {
  use super::Account;

  #[test]
  fn account_from_node_json() {
    let account: Account = serde_json::from_str(
      r#"{
        "address": "GBQEQGo5zQYCFdewiWuZ5FT9pi6D4muTAvyYzqR4ty4U",
        "nonce": 3,
        "owner": null,
        "data": "2"
      }"#,
    )
    .unwrap();

    assert_eq!(account.nonce, 3);
    assert!(!account.executable);
    assert_eq!(account.data, Some(vec![1]));
  }

  #[test]
  fn account_roundtrips_through_json() {
    let account = Account::test_new(7);
    let json = serde_json::to_string(&account).unwrap();
    assert_eq!(serde_json::from_str::<Account>(&json).unwrap(), account);
  }
}
