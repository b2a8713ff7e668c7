pub mod artifacts;
pub mod config;
pub mod deployer;
pub mod factory;
pub mod primitives;
pub mod provider;
pub mod transaction;
pub mod vm;

#[cfg(test)]
pub mod test;
