use {
  super::{Commitment, Provider, ProviderError},
  crate::{
    primitives::{Account, Pubkey, ToBase58String},
    transaction::{Transaction, TransactionHash},
  },
  async_trait::async_trait,
  reqwest::{Client, StatusCode, Url},
  serde_json::Value,
  std::time::Duration,
  tracing::{debug, trace, warn},
};

/// Talks to the JSON API of a remote node.
///
/// Endpoints used:
///  - POST /transaction
///  - GET  /account/:address?commitment=confirmed
pub struct HttpProvider {
  name: String,
  url: Url,
  client: Client,
  commitment: Commitment,
}

impl HttpProvider {
  pub fn new(
    name: impl Into<String>,
    url: &str,
    commitment: Commitment,
    timeout: Duration,
  ) -> Result<Self, ProviderError> {
    // without the trailing slash the last path segment
    // would be replaced when joining endpoint paths.
    let normalized = match url.ends_with('/') {
      true => url.to_owned(),
      false => format!("{url}/"),
    };
    let url = Url::parse(&normalized)
      .map_err(|_| ProviderError::InvalidUrl(url.to_owned()))?;

    let name = name.into();
    let client = Client::builder().timeout(timeout).build().map_err(|source| {
      ProviderError::Transport {
        network: name.clone(),
        source,
      }
    })?;

    Ok(Self {
      name,
      url,
      client,
      commitment,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
    self
      .url
      .join(path)
      .map_err(|_| ProviderError::InvalidUrl(format!("{}{path}", self.url)))
  }

  fn transport(&self, source: reqwest::Error) -> ProviderError {
    ProviderError::Transport {
      network: self.name.clone(),
      source,
    }
  }

  fn invalid(&self, reason: impl Into<String>) -> ProviderError {
    ProviderError::InvalidResponse {
      network: self.name.clone(),
      reason: reason.into(),
    }
  }

  /// Reads the response body as JSON, an empty or non-JSON
  /// body is returned as a JSON string.
  async fn body(
    &self,
    response: reqwest::Response,
  ) -> Result<Value, ProviderError> {
    let text = response.text().await.map_err(|e| self.transport(e))?;
    trace!("{} response: {text}", self.name);
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
  }
}

/// Error message reported by the node in a failed response.
fn error_reason(status: StatusCode, body: &Value) -> String {
  match body.get("error") {
    Some(Value::String(reason)) => reason.clone(),
    Some(other) => other.to_string(),
    None => match body {
      Value::String(text) if !text.is_empty() => format!("{status}: {text}"),
      _ => status.to_string(),
    },
  }
}

#[async_trait]
impl Provider for HttpProvider {
  fn name(&self) -> &str {
    &self.name
  }

  async fn send_transaction(
    &self,
    transaction: &Transaction,
  ) -> Result<TransactionHash, ProviderError> {
    let local_hash = transaction.hash();
    debug!(
      "sending transaction {} to {}",
      local_hash.to_b58(),
      self.name
    );

    let response = self
      .client
      .post(self.endpoint("transaction")?)
      .json(transaction)
      .send()
      .await
      .map_err(|e| self.transport(e))?;

    let status = response.status();
    let body = self.body(response).await?;

    if !status.is_success() {
      return Err(ProviderError::Rejected {
        network: self.name.clone(),
        reason: error_reason(status, &body),
      });
    }

    let hash = body
      .get("transaction")
      .and_then(Value::as_str)
      .ok_or_else(|| self.invalid("missing transaction hash"))?;

    let mut bytes = [0u8; 32];
    match bs58::decode(hash).into(&mut bytes) {
      Ok(32) => {}
      _ => return Err(self.invalid(format!("malformed transaction hash {hash}"))),
    }

    if bytes != local_hash {
      warn!(
        "{} reported transaction hash {hash}, expected {}",
        self.name,
        local_hash.to_b58()
      );
    }

    Ok(bytes)
  }

  async fn get_account(
    &self,
    address: &Pubkey,
  ) -> Result<Option<Account>, ProviderError> {
    let response = self
      .client
      .get(self.endpoint(&format!("account/{address}"))?)
      .query(&[("commitment", self.commitment.as_str())])
      .send()
      .await
      .map_err(|e| self.transport(e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }

    let body = self.body(response).await?;
    if !status.is_success() {
      return Err(self.invalid(error_reason(status, &body)));
    }

    let account = body
      .get("account")
      .cloned()
      .ok_or_else(|| self.invalid("missing account object"))?;

    serde_json::from_value(account)
      .map(Some)
      .map_err(|e| self.invalid(e.to_string()))
  }
}

#[cfg(test)]
mod test {
  use {
    super::HttpProvider,
    crate::{
      primitives::Keypair,
      provider::{Commitment, LocalNetwork, Provider, ProviderError},
      test::utils::spawn_node,
      transaction::Transaction,
    },
    std::{sync::Arc, time::Duration},
  };

  fn provider(url: &str) -> HttpProvider {
    HttpProvider::new(
      "devnet",
      url,
      Commitment::Confirmed,
      Duration::from_secs(5),
    )
    .unwrap()
  }

  #[test]
  fn rejects_invalid_urls() {
    assert!(matches!(
      HttpProvider::new(
        "devnet",
        "not a url",
        Commitment::Confirmed,
        Duration::from_secs(1)
      ),
      Err(ProviderError::InvalidUrl(_))
    ));
  }

  #[tokio::test]
  async fn missing_account_is_none() {
    let url = spawn_node(Arc::new(LocalNetwork::default())).await.url;
    let provider = provider(&url);

    let account = provider
      .get_account(&Keypair::generate().public())
      .await
      .unwrap();
    assert!(account.is_none());
  }

  #[tokio::test]
  async fn rejected_transaction_reports_node_error() {
    let node = Arc::new(LocalNetwork::default());
    let url = spawn_node(node.clone()).await.url;
    let provider = provider(&url);

    let payer = Keypair::generate();
    let tx = Transaction::new(
      *crate::deployer::WASM_VM_ADDR,
      7, // wrong nonce
      &payer,
      vec![],
      vec![],
      &[],
    );

    match provider.send_transaction(&tx).await {
      Err(ProviderError::Rejected { network, reason }) => {
        assert_eq!(network, "devnet");
        assert!(reason.contains("nonce"), "{reason}");
      }
      other => panic!("unexpected result {other:?}"),
    }
  }

  #[tokio::test]
  async fn unreachable_node_is_a_transport_error() {
    // nothing listens on the discard port
    let provider = provider("http://127.0.0.1:9");
    let result = provider.get_account(&Keypair::generate().public()).await;
    assert!(matches!(result, Err(ProviderError::Transport { .. })));
  }

  #[tokio::test]
  async fn url_path_prefix_is_preserved() {
    let url = spawn_node(Arc::new(LocalNetwork::default())).await.url;
    let provider = provider(&format!("{url}/"));
    assert_eq!(
      provider.endpoint("transaction").unwrap().as_str(),
      format!("{url}/transaction")
    );

    let nested = self::provider("http://node.local/api/v1");
    assert_eq!(
      nested.endpoint("transaction").unwrap().as_str(),
      "http://node.local/api/v1/transaction"
    );
  }

  #[tokio::test]
  async fn account_reads_carry_commitment() {
    let node = spawn_node(Arc::new(LocalNetwork::default())).await;
    let provider = HttpProvider::new(
      "devnet",
      &node.url,
      Commitment::Finalized,
      Duration::from_secs(5),
    )
    .unwrap();

    provider
      .get_account(&Keypair::generate().public())
      .await
      .unwrap();

    let queries = node.account_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
      queries[0].get("commitment").map(String::as_str),
      Some("finalized")
    );
  }

  #[tokio::test]
  async fn slow_node_times_out() {
    let node = spawn_node(Arc::new(LocalNetwork::default())).await;
    let provider = HttpProvider::new(
      "devnet",
      &format!("{}/slow", node.url),
      Commitment::Confirmed,
      Duration::from_millis(100),
    )
    .unwrap();

    let result = provider.get_account(&Keypair::generate().public()).await;
    match result {
      Err(ProviderError::Transport { network, source }) => {
        assert_eq!(network, "devnet");
        assert!(source.is_timeout(), "{source}");
      }
      other => panic!("unexpected result {other:?}"),
    }
  }
}
