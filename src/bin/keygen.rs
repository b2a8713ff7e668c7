use tracking_deploy::primitives::{Keypair, ToBase58String};

fn main() -> anyhow::Result<()> {
  let count: u32 = std::env::args()
    .nth(1)
    .unwrap_or_else(|| "1".to_owned())
    .parse()?;

  for _ in 0..count {
    let keypair = Keypair::generate();
    println!("pubkey: {}", keypair.public());
    println!("secret: {}", keypair.secret().as_bytes().to_b58());
    println!();
  }

  Ok(())
}
