//! Compiled contract artifacts
//!
//! Artifacts are looked up by contract name in an artifacts directory,
//! either as a JSON artifact `<Name>.json` carrying the bytecode and the
//! contract interface, or as a bare compiled module `<Name>.wasm`.

use {
  crate::primitives::{b58, sha3},
  serde::{Deserialize, Serialize},
  std::path::{Path, PathBuf},
  thiserror::Error,
  tracing::debug,
};

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("Artifact for contract '{name}' not found in {}", dir.display())]
  NotFound { name: String, dir: PathBuf },

  #[error("Failed reading artifact {}: {source}", path.display())]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("Malformed artifact {}: {source}", path.display())]
  Malformed {
    path: PathBuf,
    source: serde_json::Error,
  },

  #[error("Artifact {} describes contract '{found}', expected '{expected}'", path.display())]
  NameMismatch {
    path: PathBuf,
    expected: String,
    found: String,
  },

  #[error("Artifact of contract '{0}' has empty bytecode")]
  EmptyBytecode(String),
}

/// A compiled contract: its WASM bytecode and its interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
  pub contract_name: String,

  #[serde(with = "b58::serde")]
  pub bytecode: Vec<u8>,

  /// Contract interface description, opaque to the deployer.
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub abi: serde_json::Value,
}

impl Artifact {
  pub fn new(name: impl Into<String>, bytecode: Vec<u8>) -> Self {
    Self {
      contract_name: name.into(),
      bytecode,
      abi: serde_json::Value::Null,
    }
  }

  /// Loads the artifact of a contract by its name.
  pub fn load(dir: &Path, name: &str) -> Result<Self, ArtifactError> {
    let json = dir.join(format!("{name}.json"));
    let wasm = dir.join(format!("{name}.wasm"));

    let artifact = if json.is_file() {
      debug!("loading artifact {}", json.display());
      let contents = read(&json)?;
      let artifact: Artifact =
        serde_json::from_slice(&contents).map_err(|source| {
          ArtifactError::Malformed {
            path: json.clone(),
            source,
          }
        })?;

      if artifact.contract_name != name {
        return Err(ArtifactError::NameMismatch {
          path: json,
          expected: name.to_owned(),
          found: artifact.contract_name,
        });
      }
      artifact
    } else if wasm.is_file() {
      debug!("loading bytecode {}", wasm.display());
      Artifact::new(name, read(&wasm)?)
    } else {
      return Err(ArtifactError::NotFound {
        name: name.to_owned(),
        dir: dir.to_owned(),
      });
    };

    if artifact.bytecode.is_empty() {
      return Err(ArtifactError::EmptyBytecode(name.to_owned()));
    }

    Ok(artifact)
  }

  /// Sha3 of the bytecode, verified by the chain after upload.
  pub fn checksum(&self) -> [u8; 32] {
    sha3(&self.bytecode)
  }
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
  std::fs::read(path).map_err(|source| ArtifactError::Io {
    path: path.to_owned(),
    source,
  })
}

#[cfg(test)]
mod test {
  use {
    super::{Artifact, ArtifactError},
    crate::test::utils::{wasm_module, write_artifact},
  };

  #[test]
  fn load_json_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "Tracking", &wasm_module(64));

    let artifact = Artifact::load(dir.path(), "Tracking").unwrap();
    assert_eq!(artifact.contract_name, "Tracking");
    assert_eq!(artifact.bytecode, wasm_module(64));
    assert!(artifact.abi.is_null());
  }

  #[test]
  fn load_json_artifact_with_abi() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join("Tracking.json"),
      r#"{
        "contractName": "Tracking",
        "bytecode": "1111",
        "abi": [{ "name": "track", "inputs": [] }]
      }"#,
    )
    .unwrap();

    // four leading zero bytes
    let artifact = Artifact::load(dir.path(), "Tracking").unwrap();
    assert_eq!(artifact.bytecode, vec![0, 0, 0, 0]);
    assert_eq!(artifact.abi[0]["name"], "track");
  }

  #[test]
  fn load_bare_wasm() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Tracking.wasm"), wasm_module(32)).unwrap();

    let artifact = Artifact::load(dir.path(), "Tracking").unwrap();
    assert_eq!(artifact.contract_name, "Tracking");
    assert_eq!(artifact.checksum(), crate::primitives::sha3(&wasm_module(32)));
  }

  #[test]
  fn missing_and_mismatched_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      Artifact::load(dir.path(), "Tracking"),
      Err(ArtifactError::NotFound { .. })
    ));

    write_artifact(dir.path(), "Other", &wasm_module(32));
    std::fs::rename(
      dir.path().join("Other.json"),
      dir.path().join("Tracking.json"),
    )
    .unwrap();
    assert!(matches!(
      Artifact::load(dir.path(), "Tracking"),
      Err(ArtifactError::NameMismatch { .. })
    ));
  }

  #[test]
  fn malformed_and_empty_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Tracking.json"), "{ not json").unwrap();
    assert!(matches!(
      Artifact::load(dir.path(), "Tracking"),
      Err(ArtifactError::Malformed { .. })
    ));

    std::fs::write(dir.path().join("Empty.wasm"), b"").unwrap();
    assert!(matches!(
      Artifact::load(dir.path(), "Empty"),
      Err(ArtifactError::EmptyBytecode(_))
    ));
  }
}
