//! End-to-end flows through the public adapter API
//!
//! The backend is replaced by an in-process transport; storage is a real
//! on-disk cache directory so state survives across adapter instances.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use cloudsaver::cache::{ExpiringStore, FileMedium};
use cloudsaver::data::{CloudType, Role, ShareInfoParams};
use cloudsaver::db::LocalDatabase;
use cloudsaver::remote::{Query, Transport};
use cloudsaver::{AdapterError, ApiAdapter, Mode, RemoteUnavailablePolicy, Result};

/// Answers every request with a fixed body, or fails when the backend is "down"
struct ScriptedBackend {
    body: Mutex<Option<Value>>,
    paths: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn up(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(Some(body)),
            paths: Mutex::new(Vec::new()),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(None),
            paths: Mutex::new(Vec::new()),
        })
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    fn answer(&self, path: &str) -> Result<Value> {
        self.paths.lock().unwrap().push(path.to_string());
        self.body
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AdapterError::RemoteUnavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl Transport for ScriptedBackend {
    async fn get(&self, path: &str, _query: &Query) -> Result<Value> {
        self.answer(path)
    }

    async fn post(&self, path: &str, _body: &Value) -> Result<Value> {
        self.answer(path)
    }
}

fn adapter_in(
    dir: &std::path::Path,
    backend: Arc<ScriptedBackend>,
    policy: RemoteUnavailablePolicy,
) -> ApiAdapter {
    let medium = FileMedium::with_dir(dir.to_path_buf());
    let db = LocalDatabase::new(ExpiringStore::new(Arc::new(medium)));
    ApiAdapter::new(db, backend, policy)
}

fn search_body() -> Value {
    json!({
        "code": 0,
        "message": "ok",
        "data": [{
            "id": "ch1",
            "channelInfo": {"name": "Movies", "channelLogo": "", "channelId": "ch1"},
            "displayList": true,
            "list": [{"id": "42", "title": "Dune 2021 4K", "cloudLinks": ["https://pan.quark.cn/s/abc"],
                      "cloudType": "quark", "channel": "Movies", "pubDate": "2024-01-01",
                      "isSupportSave": true}]
        }]
    })
}

#[tokio::test]
async fn test_register_login_and_default_settings() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Propagate,
    );

    let alice = adapter.register("alice", "pw1", "9527").await.unwrap();
    assert_eq!(alice.data.unwrap().role, Role::Normal);

    let bob = adapter.register("bob", "pw2", "230713").await.unwrap();
    assert_eq!(bob.data.unwrap().role, Role::Admin);

    let settings = adapter.get_settings().await.unwrap().data.unwrap();
    assert_eq!(settings.user_settings.cloud115_cookie, "");
    assert_eq!(settings.user_settings.quark_cookie, "");

    let login = adapter.login("alice", "pw1").await.unwrap();
    assert!(login.is_success());
    assert!(login.data.unwrap().token.starts_with("token_"));

    let err = adapter.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, AdapterError::Auth(_)));
}

#[tokio::test]
async fn test_accounts_and_session_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let adapter = adapter_in(
            dir.path(),
            ScriptedBackend::down(),
            RemoteUnavailablePolicy::Propagate,
        );
        adapter.register("alice", "pw1", "9527").await.unwrap();
        adapter.login("alice", "pw1").await.unwrap();
    }

    let adapter = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Propagate,
    );
    let session = adapter.current_user().expect("session persisted on disk");
    assert_eq!(session.username, "alice");

    let err = adapter.register("alice", "other", "9527").await.unwrap_err();
    assert!(matches!(err, AdapterError::Validation(_)));
}

#[tokio::test]
async fn test_search_is_cached_on_disk_and_recorded_in_history() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::up(search_body());

    {
        let adapter = adapter_in(
            dir.path(),
            backend.clone(),
            RemoteUnavailablePolicy::Propagate,
        );
        adapter.register("alice", "pw1", "9527").await.unwrap();
        adapter.login("alice", "pw1").await.unwrap();

        let first = adapter.search("dune", None, None).await.unwrap();
        assert_eq!(first.data.unwrap()[0].list[0].title, "Dune 2021 4K");
    }

    // A fresh adapter on the same directory, with the backend gone
    let adapter = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Propagate,
    );
    let again = adapter.search("dune", None, None).await.unwrap();
    assert_eq!(again.data.unwrap()[0].list[0].id, "42");
    assert_eq!(backend.paths(), vec!["/api/search".to_string()]);

    let history = adapter.search_history().await.unwrap().data.unwrap();
    assert_eq!(history, vec!["dune".to_string()]);
}

#[tokio::test]
async fn test_favorites_round_trip_for_signed_in_user() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = adapter_in(
        dir.path(),
        ScriptedBackend::up(search_body()),
        RemoteUnavailablePolicy::Propagate,
    );
    adapter.register("alice", "pw1", "9527").await.unwrap();

    // Signed out: favorites need a session
    let err = adapter.favorites().await.unwrap_err();
    assert!(matches!(err, AdapterError::Auth(_)));

    adapter.login("alice", "pw1").await.unwrap();
    let groups = adapter.search("dune", None, None).await.unwrap().data.unwrap();
    let resource = groups[0].list[0].clone();

    assert_eq!(adapter.add_favorite(&resource).await.unwrap().data, Some(true));
    assert_eq!(adapter.add_favorite(&resource).await.unwrap().data, Some(false));

    let favorites = adapter.favorites().await.unwrap().data.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].resource.title, "Dune 2021 4K");

    assert_eq!(
        adapter.remove_favorite("42").await.unwrap().data,
        Some(true)
    );
    assert!(adapter.favorites().await.unwrap().data.unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_down_under_each_policy() {
    let dir = tempfile::tempdir().unwrap();

    let strict = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Propagate,
    );
    let err = strict.sponsors().await.unwrap_err();
    assert!(err.is_remote_unavailable());

    let lenient = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Placeholder,
    );
    let params = ShareInfoParams {
        share_code: "abc".to_string(),
        receive_code: Some("x1y2".to_string()),
    };
    let envelope = lenient
        .cloud(CloudType::Quark)
        .share_info(&params)
        .await
        .unwrap();
    assert_eq!(envelope.message, cloudsaver::placeholder::MESSAGE);
    let info = envelope.data.expect("placeholder share details");
    assert!(!info.list.is_empty());
    assert_eq!(info.pwd_id, "abc");

    // Placeholder answers never land in the cache
    let strict_again = adapter_in(
        dir.path(),
        ScriptedBackend::down(),
        RemoteUnavailablePolicy::Propagate,
    );
    assert!(strict_again
        .cloud(CloudType::Quark)
        .share_info(&params)
        .await
        .is_err());
}

#[tokio::test]
async fn test_probe_switches_mode() {
    let dir = tempfile::tempdir().unwrap();

    let healthy = adapter_in(
        dir.path(),
        ScriptedBackend::up(json!({"code": 0, "message": "ok"})),
        RemoteUnavailablePolicy::Propagate,
    );
    assert_eq!(healthy.probe().await, Mode::Online);

    let backend = ScriptedBackend::down();
    let unhealthy = adapter_in(
        dir.path(),
        backend.clone(),
        RemoteUnavailablePolicy::Placeholder,
    );
    assert_eq!(unhealthy.probe().await, Mode::Offline);
    assert_eq!(unhealthy.mode(), Mode::Offline);

    // Offline: served from placeholder data without touching the backend
    let sponsors = unhealthy.sponsors().await.unwrap();
    assert!(sponsors.is_success());
    assert_eq!(backend.paths(), vec!["/api/health".to_string()]);
}

#[tokio::test]
async fn test_long_cjk_keyword_is_cached_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::up(search_body());
    let adapter = adapter_in(
        dir.path(),
        backend.clone(),
        RemoteUnavailablePolicy::Propagate,
    );
    let keyword = "流浪地球".repeat(8);

    adapter.search(&keyword, None, None).await.unwrap();
    let again = adapter.search(&keyword, None, None).await.unwrap();

    assert_eq!(again.data.unwrap()[0].list[0].id, "42");
    assert_eq!(backend.paths().len(), 1);
}
