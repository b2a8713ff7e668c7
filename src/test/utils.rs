use {
  crate::{
    artifacts::Artifact,
    primitives::{Keypair, Pubkey, ToBase58String},
    provider::{LocalNetwork, Provider, ProviderError},
    transaction::Transaction,
  },
  axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json,
    Router,
  },
  serde_json::{json, Value},
  std::{
    collections::HashMap,
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
  },
};

type Queries = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// A running mock node.
pub struct MockNode {
  /// Base url of the node API.
  pub url: String,
  queries: Queries,
}

impl MockNode {
  /// Query strings of every account read served so far, in order.
  pub fn account_queries(&self) -> Vec<HashMap<String, String>> {
    self.queries.lock().unwrap().clone()
  }
}

/// The development keypair that funds deployments on the local network.
///
///   secret: BbMQkQYZspmkytduTWvXEtc4mMURjsekJDvty2WtKeSb
///   pubkey: FVen3X669xLzsi6N2V91DoiyzHzg1uAgqiT8jZ9nS96Z
pub fn keypair_default() -> Keypair {
  crate::provider::dev_keypair()
}

/// A valid wasm module padded with a custom section to a given size.
pub fn wasm_module(size: usize) -> Vec<u8> {
  let mut code = vec![0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
  // section id and two bytes of length precede the payload
  let payload = size - code.len() - 3;
  code.push(0x00); // custom section id
  code.extend_from_slice(&[
    0x80 | (payload & 0x7f) as u8,
    ((payload >> 7) & 0x7f) as u8,
  ]);
  code.push(0x00); // empty custom section name
  code.resize(size, 0xab);
  code
}

/// Writes a compiled contract artifact into an artifacts directory.
pub fn write_artifact(dir: &std::path::Path, name: &str, bytecode: &[u8]) {
  let artifact = Artifact::new(name, bytecode.to_vec());
  std::fs::write(
    dir.join(format!("{name}.json")),
    serde_json::to_string_pretty(&artifact).unwrap(),
  )
  .unwrap();
}

/// Serves the node JSON API on a random local port, backed by
/// an in-process network.
///
/// Routes under `/slow` answer account reads after two seconds
/// with a 404, for exercising client timeouts.
pub async fn spawn_node(network: Arc<LocalNetwork>) -> MockNode {
  async fn submit(
    Extension(network): Extension<Arc<LocalNetwork>>,
    Json(transaction): Json<Transaction>,
  ) -> (StatusCode, Json<Value>) {
    match network.send_transaction(&transaction).await {
      Ok(hash) => (
        StatusCode::CREATED,
        Json(json!({ "transaction": hash.to_b58() })),
      ),
      Err(ProviderError::Rejected { reason, .. }) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })))
      }
      Err(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      ),
    }
  }

  async fn account(
    Path(address): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Extension(network): Extension<Arc<LocalNetwork>>,
    Extension(queries): Extension<Queries>,
  ) -> (StatusCode, Json<Value>) {
    queries.lock().unwrap().push(query);

    let address: Pubkey = match address.parse() {
      Ok(address) => address,
      Err(_) => {
        return (
          StatusCode::BAD_REQUEST,
          Json(json!({ "error": "invalid_parameter" })),
        )
      }
    };

    match network.get_account(&address).await {
      Ok(Some(account)) => (
        StatusCode::OK,
        Json(json!({
          "account": {
            "address": address,
            "nonce": account.nonce,
            "executable": account.executable,
            "owner": account.owner,
            "data": account.data.map(|d| d.to_b58())
          },
          "commitment": "confirmed"
        })),
      ),
      _ => (
        StatusCode::NOT_FOUND,
        Json(json!({ "account": address, "error": "not_found" })),
      ),
    }
  }

  async fn slow_account(Path(_address): Path<String>) -> StatusCode {
    tokio::time::sleep(Duration::from_secs(2)).await;
    StatusCode::NOT_FOUND
  }

  let queries = Queries::default();
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();

  let svc = Router::new()
    .route("/transaction", post(submit))
    .route("/account/:account", get(account))
    .route("/slow/account/:account", get(slow_account))
    .layer(Extension(network))
    .layer(Extension(queries.clone()));

  tokio::spawn(async move {
    axum::Server::from_tcp(listener)
      .unwrap()
      .serve(svc.into_make_service())
      .await
      .unwrap();
  });

  MockNode {
    url: format!("http://{addr}"),
    queries,
  }
}
