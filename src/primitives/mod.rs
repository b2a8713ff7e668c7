mod account;
pub mod b58;
mod digest;
mod keys;

pub use account::Account;
pub use b58::ToBase58String;
pub use digest::sha3;
pub use keys::{Keypair, KeypairError, Pubkey};
