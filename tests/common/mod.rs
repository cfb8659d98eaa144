//! Shared fixtures for integration tests: a scriptable mock sensor
//! endpoint, a mock JSON tree store speaking the same dialect as the real
//! one, and a helper that boots a full hub against them. Everything binds
//! ephemeral ports so tests can run in parallel.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use enviro_hub::config::{HubConfig, LogMode, SourceKind};
use enviro_hub::{HubServer, Shutdown};

/// A sensor endpoint whose payload and failure mode tests flip at runtime.
pub struct MockSensor {
    payload: Mutex<Value>,
    fail: AtomicBool,
    hits: AtomicU64,
}

impl MockSensor {
    #[allow(dead_code)]
    pub fn set_payload(&self, payload: Value) {
        *self.payload.lock().unwrap() = payload;
    }

    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock sensor on an ephemeral port. Returns the reading URL and
/// the handle used to script responses.
#[allow(dead_code)]
pub async fn start_mock_sensor(initial: Value) -> (String, Arc<MockSensor>) {
    let sensor = Arc::new(MockSensor {
        payload: Mutex::new(initial),
        fail: AtomicBool::new(false),
        hits: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/reading", get(sensor_reading))
        .with_state(sensor.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/reading"), sensor)
}

async fn sensor_reading(State(sensor): State<Arc<MockSensor>>) -> Response {
    sensor.hits.fetch_add(1, Ordering::SeqCst);
    if sensor.fail.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let payload = sensor.payload.lock().unwrap().clone();
    Json(payload).into_response()
}

/// In-memory stand-in for the remote JSON tree store. Supports plain node
/// reads, `?shallow=true` key listings, `?order_by=&limit_to_last=` bounded
/// reads, POST appends with generated child keys, and subtree deletes.
pub struct MockStore {
    collections: Mutex<BTreeMap<String, Vec<(String, Value)>>>,
    scalars: Mutex<BTreeMap<String, Value>>,
    counter: AtomicU64,
    /// When set, bounded reads answer `null`, like a store whose ordered
    /// queries return nothing before indexes warm up.
    empty_bounded_reads: AtomicBool,
}

impl MockStore {
    /// Append a record under `path`, returning the generated child key.
    #[allow(dead_code)]
    pub fn push(&self, path: &str, record: Value) -> String {
        let key = format!("rec{:06}", self.counter.fetch_add(1, Ordering::SeqCst));
        self.collections
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push((key.clone(), record));
        key
    }

    /// Set the plain value at `path` (a latest-reading node, say).
    #[allow(dead_code)]
    pub fn set(&self, path: &str, value: Value) {
        self.scalars
            .lock()
            .unwrap()
            .insert(path.to_string(), value);
    }

    #[allow(dead_code)]
    pub fn records(&self, path: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(path)
            .map(|entries| entries.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn set_empty_bounded_reads(&self, empty: bool) {
        self.empty_bounded_reads.store(empty, Ordering::SeqCst);
    }

    fn node(&self, path: &str) -> Value {
        if let Some(value) = self.scalars.lock().unwrap().get(path) {
            return value.clone();
        }
        if let Some(entries) = self.collections.lock().unwrap().get(path) {
            let map: serde_json::Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return Value::Object(map);
        }
        Value::Null
    }

    fn shallow(&self, path: &str) -> Value {
        let prefix = format!("{path}/");
        let mut children: Vec<String> = Vec::new();

        for key in self.collections.lock().unwrap().keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let segment = rest.split('/').next().unwrap_or(rest);
                children.push(segment.to_string());
            }
        }
        for key in self.scalars.lock().unwrap().keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let segment = rest.split('/').next().unwrap_or(rest);
                children.push(segment.to_string());
            }
        }
        if let Some(entries) = self.collections.lock().unwrap().get(path) {
            children.extend(entries.iter().map(|(k, _)| k.clone()));
        }

        children.sort_unstable();
        children.dedup();
        if children.is_empty() {
            return Value::Null;
        }
        Value::Object(children.into_iter().map(|c| (c, json!(true))).collect())
    }

    fn bounded(&self, path: &str, last_n: usize) -> Value {
        if self.empty_bounded_reads.load(Ordering::SeqCst) {
            return Value::Null;
        }
        let collections = self.collections.lock().unwrap();
        let Some(entries) = collections.get(path) else {
            return Value::Null;
        };

        let mut ordered: Vec<(String, Value)> = entries.clone();
        ordered.sort_by_key(|(_, record)| {
            record
                .get("timestamp")
                .map(|t| t.to_string())
                .unwrap_or_default()
        });
        let skip = ordered.len().saturating_sub(last_n);
        Value::Object(ordered.into_iter().skip(skip).collect())
    }

    fn remove(&self, path: &str) {
        let prefix = format!("{path}/");
        self.collections
            .lock()
            .unwrap()
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        self.scalars
            .lock()
            .unwrap()
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }
}

/// Start a mock store on an ephemeral port. Returns the base URL and the
/// handle used to seed and inspect it.
#[allow(dead_code)]
pub async fn start_mock_store() -> (String, Arc<MockStore>) {
    let store = Arc::new(MockStore {
        collections: Mutex::new(BTreeMap::new()),
        scalars: Mutex::new(BTreeMap::new()),
        counter: AtomicU64::new(1),
        empty_bounded_reads: AtomicBool::new(false),
    });

    let app = Router::new()
        .route(
            "/{*path}",
            get(store_get).post(store_post).delete(store_delete),
        )
        .with_state(store.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/"), store)
}

async fn store_get(
    State(store): State<Arc<MockStore>>,
    Path(path): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if params.get("shallow").map(String::as_str) == Some("true") {
        return Json(store.shallow(&path));
    }
    if let Some(n) = params.get("limit_to_last") {
        let last_n = n.parse().unwrap_or(0);
        return Json(store.bounded(&path, last_n));
    }
    Json(store.node(&path))
}

async fn store_post(
    State(store): State<Arc<MockStore>>,
    Path(path): Path<String>,
    Json(record): Json<Value>,
) -> Json<Value> {
    let key = store.push(&path, record);
    Json(json!({ "name": key }))
}

async fn store_delete(
    State(store): State<Arc<MockStore>>,
    Path(path): Path<String>,
) -> Json<Value> {
    store.remove(&path);
    Json(Value::Null)
}

/// A hub booted for one test.
pub struct TestHub {
    pub base: String,
    pub shutdown: Arc<Shutdown>,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestHub {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Trigger shutdown and wait for the server task to drain.
    #[allow(dead_code)]
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Boot a full hub (poller, log, API) from the given config on an
/// ephemeral port, and wait for the first poll cycle to land.
#[allow(dead_code)]
pub async fn spawn_hub(config: HubConfig) -> TestHub {
    let server = HubServer::new(&config).expect("hub should build from test config");
    let shutdown = Arc::new(Shutdown::new());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { server.run(listener, &server_shutdown).await });

    tokio::time::sleep(Duration::from_millis(200)).await;

    TestHub {
        base: format!("http://{addr}"),
        shutdown,
        handle,
    }
}

/// Config polling a mock sensor over HTTP into the in-memory log, with an
/// interval long enough that only manual refreshes drive cycles after the
/// initial one.
#[allow(dead_code)]
pub fn http_hub_config(sensor_url: &str) -> HubConfig {
    let mut config = HubConfig::default();
    config.source.kind = SourceKind::Http;
    config.source.url = Some(sensor_url.to_string());
    config.source.timeout_secs = 2;
    config.poll.interval_secs = 3600;
    config.poll.verify_delay_ms = 10;
    config
}

/// Config polling a mock sensor into a durable store-backed log.
#[allow(dead_code)]
pub fn store_hub_config(sensor_url: &str, store_base: &str) -> HubConfig {
    let mut config = http_hub_config(sensor_url);
    config.log.mode = LogMode::Store;
    config.store.base_url = store_base.to_string();
    config.store.request_timeout_secs = 2;
    config.poll.verify_attempts = 2;
    config
}

/// An HTTP client that ignores environment proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// POST /api/refresh and give the resulting cycle time to complete.
#[allow(dead_code)]
pub async fn refresh_and_wait(hub: &TestHub, http: &reqwest::Client) {
    let response = http.post(hub.url("/api/refresh")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(200)).await;
}
