use {
  assert_cmd::Command,
  predicates::prelude::*,
  std::path::Path,
  tempfile::TempDir,
  tracking_deploy::{artifacts::Artifact, deployer::contract_address},
};

/// Smallest valid wasm module, just the header.
const WASM_MODULE: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

fn workspace() -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  let artifacts = dir.path().join("artifacts");
  std::fs::create_dir(&artifacts).unwrap();

  let artifact = Artifact::new("Tracking", WASM_MODULE.to_vec());
  std::fs::write(
    artifacts.join("Tracking.json"),
    serde_json::to_string(&artifact).unwrap(),
  )
  .unwrap();
  dir
}

fn deploy(dir: &Path) -> Command {
  let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deploy"));
  cmd.current_dir(dir);
  cmd
}

#[test]
fn deploys_tracking_to_local_network() {
  let dir = workspace();
  let assert = deploy(dir.path()).arg("--wait").assert().success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  let lines: Vec<_> = stdout.lines().collect();
  assert_eq!(lines.len(), 2, "{stdout}");

  let target = lines[0]
    .strip_prefix("Tracking deployed to ")
    .and_then(|l| l.strip_suffix(", using target"))
    .unwrap();
  let address = lines[1]
    .strip_prefix("Tracking deployed to ")
    .and_then(|l| l.strip_suffix(", using address method"))
    .unwrap();

  assert!(!target.is_empty());
  assert_eq!(target, address);
}

#[test]
fn seed_determines_contract_address() {
  let dir = workspace();
  let address = contract_address(&[0; 32]);

  deploy(dir.path())
    .args(["--network", "local", "--seed", "11111111111111111111111111111111"])
    .assert()
    .success()
    .stdout(predicate::str::diff(format!(
      "Tracking deployed to {address}, using target\nTracking deployed to \
       {address}, using address method\n"
    )));
}

#[test]
fn missing_artifact_fails() {
  let dir = workspace();
  deploy(dir.path())
    .args(["--contract", "Registry"])
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("'Registry' not found"));
}

#[test]
fn unknown_network_fails() {
  let dir = workspace();
  deploy(dir.path())
    .args(["--network", "mainnet"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("Network 'mainnet' is not configured"));
}

#[test]
fn unreachable_node_fails() {
  let dir = workspace();
  std::fs::write(
    dir.path().join("deploy.json"),
    r#"{
      "defaultNetwork": "devnet",
      "networks": {
        "devnet": {
          "url": "http://127.0.0.1:9",
          "keypair": "9Rt2PJombdzAEjdgiybg4woayTwKVD89uYYc1vFy7Hoa",
          "timeout": "2s"
        }
      }
    }"#,
  )
  .unwrap();

  deploy(dir.path())
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("Request to devnet failed"));
}

#[test]
fn keygen_prints_keypairs() {
  Command::new(assert_cmd::cargo::cargo_bin!("keygen"))
    .arg("2")
    .assert()
    .success()
    .stdout(
      predicate::str::contains("pubkey: ")
        .count(2)
        .and(predicate::str::contains("secret: ").count(2)),
    );
}
