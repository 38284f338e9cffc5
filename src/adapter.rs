//! The API adapter
//!
//! Every backend operation goes through [`ApiAdapter`]: check the local cache,
//! call the backend once on a miss, decode the `{code, data, message}`
//! envelope, and write successful results back. Accounts, sessions and
//! settings are served from the [`LocalDatabase`] without a backend call.
//!
//! When the backend cannot be used the configured
//! [`RemoteUnavailablePolicy`] decides whether the caller sees the error or
//! a placeholder payload.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::{CloudDriveApi, DoubanApi, ResourceApi, SettingApi, UserApi};
use crate::auth;
use crate::cache::{ExpiringStore, FileMedium, MemoryMedium, StorageMedium};
use crate::config::{AdapterConfig, RemoteUnavailablePolicy, PROBE_TIMEOUT};
use crate::data::{
    ChannelGroup, CloudType, Envelope, Favorite, Folder, HotListItem, HotListParams, LoginData,
    RegisterData, ResourceRecord, Role, SaveFileParams, SaveSettingsRequest, Session,
    SettingsData, ShareInfo, ShareInfoParams, Sponsor, UserSettings,
};
use crate::db::LocalDatabase;
use crate::error::{AdapterError, Result};
use crate::placeholder;
use crate::remote::{decode_envelope, endpoints, query_pairs, HttpTransport, Query, Transport};

/// TTL for cached folder listings
pub const FOLDERS_TTL_MINUTES: i64 = 30;

/// TTL for cached share details
pub const SHARE_INFO_TTL_MINUTES: i64 = 60;

/// TTL for the cached sponsor list
pub const SPONSORS_TTL_MINUTES: i64 = 60;

/// TTL for cached Douban hot lists
pub const DOUBAN_TTL_MINUTES: i64 = 60;

const CACHE_HIT_MESSAGE: &str = "served from cache";

/// Whether remote operations currently reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Online,
    Offline,
}

/// One backend request
enum Request<'a> {
    Get { path: &'a str, query: Query },
    Post { path: &'a str, body: Value },
}

/// Where a remote result is cached
struct CacheSlot {
    key: String,
    ttl: Duration,
}

impl CacheSlot {
    fn minutes(key: String, minutes: i64) -> Self {
        Self {
            key,
            ttl: Duration::minutes(minutes),
        }
    }
}

pub struct ApiAdapter {
    db: LocalDatabase,
    transport: Arc<dyn Transport>,
    policy: RemoteUnavailablePolicy,
    online: AtomicBool,
}

impl ApiAdapter {
    /// Creates the adapter and sweeps stale search results
    pub fn new(
        db: LocalDatabase,
        transport: Arc<dyn Transport>,
        policy: RemoteUnavailablePolicy,
    ) -> Self {
        match db.cleanup() {
            Ok(removed) => tracing::debug!(removed, "startup cache sweep"),
            Err(e) => tracing::warn!(error = %e, "startup cache sweep failed"),
        }
        Self {
            db,
            transport,
            policy,
            online: AtomicBool::new(true),
        }
    }

    /// Builds the file-backed store and HTTP transport described by `config`
    ///
    /// Falls back to an in-memory store when no cache directory can be
    /// determined.
    pub fn from_config(config: &AdapterConfig) -> Result<Self> {
        let medium: Arc<dyn StorageMedium> = match config.cache_dir.clone() {
            Some(dir) => Arc::new(FileMedium::with_dir(dir)),
            None => match FileMedium::new() {
                Some(medium) => Arc::new(medium),
                None => {
                    tracing::warn!("no cache directory available, using in-memory storage");
                    Arc::new(MemoryMedium::new())
                }
            },
        };

        let transport = match config.request_timeout {
            Some(timeout) => HttpTransport::with_timeout(config.base_url.clone(), timeout)?,
            None => HttpTransport::new(config.base_url.clone()),
        };

        Ok(Self::new(
            LocalDatabase::new(ExpiringStore::new(medium)),
            Arc::new(transport),
            config.on_unavailable,
        ))
    }

    pub fn database(&self) -> &LocalDatabase {
        &self.db
    }

    pub fn policy(&self) -> RemoteUnavailablePolicy {
        self.policy
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi::new(self)
    }

    pub fn setting(&self) -> SettingApi<'_> {
        SettingApi::new(self)
    }

    pub fn resource(&self) -> ResourceApi<'_> {
        ResourceApi::new(self)
    }

    pub fn douban(&self) -> DoubanApi<'_> {
        DoubanApi::new(self)
    }

    pub fn cloud(&self, cloud: CloudType) -> CloudDriveApi<'_> {
        CloudDriveApi::new(self, cloud)
    }

    /// Verifies credentials against the local account table and opens a session
    pub async fn login(&self, username: &str, password: &str) -> Result<Envelope<LoginData>> {
        let user = self
            .db
            .find_user(username)
            .filter(|u| auth::verify_password(&u.salt, password, &u.password_hash))
            .ok_or_else(|| AdapterError::Auth("wrong username or password".to_string()))?;

        let token = auth::issue_token(self.db.store().now().timestamp_millis());
        self.db.set_session(&Session {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            role: user.role,
            token: token.clone(),
        })?;

        tracing::info!(username, "logged in");
        Ok(Envelope::ok(LoginData { token }, "login succeeded"))
    }

    /// Creates an account whose role is picked by the registration code
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        register_code: &str,
    ) -> Result<Envelope<RegisterData>> {
        let settings = self.db.global_settings()?;
        let code: u32 = register_code
            .trim()
            .parse()
            .map_err(|_| AdapterError::Validation("invalid registration code".to_string()))?;

        let role = if code == settings.admin_user_code {
            Role::Admin
        } else if code == settings.common_user_code {
            Role::Normal
        } else {
            return Err(AdapterError::Validation(
                "invalid registration code".to_string(),
            ));
        };

        let user = self.db.create_user(username, password, role)?;
        Ok(Envelope::ok(
            RegisterData {
                username: user.username,
                role: user.role,
            },
            "registration succeeded",
        ))
    }

    pub async fn logout(&self) -> Result<Envelope<()>> {
        self.db.clear_session()?;
        Ok(Envelope::ok_empty("logged out"))
    }

    pub fn current_user(&self) -> Option<Session> {
        self.db.session()
    }

    fn require_session(&self) -> Result<Session> {
        self.current_user()
            .ok_or_else(|| AdapterError::Auth("not logged in".to_string()))
    }

    /// Global settings plus the signed-in user's settings, or defaults
    pub async fn get_settings(&self) -> Result<Envelope<SettingsData>> {
        let global_setting = self.db.global_settings()?;
        let user_settings = match self.current_user() {
            Some(session) => self.db.user_settings(&session.user_id)?,
            None => UserSettings::default(),
        };
        Ok(Envelope::ok(
            SettingsData {
                global_setting,
                user_settings,
            },
            "settings loaded",
        ))
    }

    /// Saves whichever halves of `request` are present
    ///
    /// User settings saved without a session go to a temporary slot.
    pub async fn save_settings(&self, request: &SaveSettingsRequest) -> Result<Envelope<()>> {
        if let Some(global) = &request.global_setting {
            self.db.save_global_settings(global)?;
        }
        if let Some(user_settings) = &request.user_settings {
            match self.current_user() {
                Some(session) => self.db.save_user_settings(&session.user_id, user_settings)?,
                None => self.db.save_temp_user_settings(user_settings)?,
            }
        }
        Ok(Envelope::ok_empty("settings saved"))
    }

    /// Searches the backend, serving unpaginated repeats from the cache
    ///
    /// A request carrying `channel_id` or `last_message_id` always goes to
    /// the backend and is never cached.
    pub async fn search(
        &self,
        keyword: &str,
        channel_id: Option<&str>,
        last_message_id: Option<&str>,
    ) -> Result<Envelope<Vec<ChannelGroup>>> {
        let channel_id = channel_id.filter(|s| !s.is_empty());
        let last_message_id = last_message_id.filter(|s| !s.is_empty());
        let paginated = channel_id.is_some() || last_message_id.is_some();

        if !paginated {
            if let Some(groups) = self.db.cached_resources(keyword) {
                tracing::debug!(keyword, "search cache hit");
                self.record_history(keyword);
                return Ok(Envelope::ok(groups, CACHE_HIT_MESSAGE));
            }
        }

        let mut query = Query::new();
        if !keyword.is_empty() {
            query.push(("keyword".to_string(), keyword.to_string()));
        }
        if let Some(id) = channel_id {
            query.push(("channelId".to_string(), id.to_string()));
        }
        if let Some(id) = last_message_id {
            query.push(("lastMessageId".to_string(), id.to_string()));
        }

        let request = Request::Get {
            path: endpoints::SEARCH,
            query,
        };
        let envelope = match self.fetch::<Vec<ChannelGroup>>(request).await {
            Ok(envelope) => envelope,
            Err(e) => return self.fallback(e, || placeholder::search(keyword)),
        };

        if envelope.is_success() {
            if let (false, Some(groups)) = (paginated, envelope.data.as_ref()) {
                if let Err(e) = self.db.cache_resources(keyword, groups) {
                    tracing::warn!(keyword, error = %e, "failed to cache search results");
                }
            }
            self.record_history(keyword);
        }
        Ok(envelope)
    }

    fn record_history(&self, keyword: &str) {
        if keyword.is_empty() {
            return;
        }
        if let Some(session) = self.current_user() {
            if let Err(e) = self.db.add_search_history(&session.user_id, keyword) {
                tracing::warn!(keyword, error = %e, "failed to record search history");
            }
        }
    }

    pub async fn search_history(&self) -> Result<Envelope<Vec<String>>> {
        let session = self.require_session()?;
        Ok(Envelope::ok(
            self.db.search_history(&session.user_id),
            "history loaded",
        ))
    }

    pub async fn clear_search_history(&self) -> Result<Envelope<()>> {
        let session = self.require_session()?;
        self.db.clear_search_history(&session.user_id)?;
        Ok(Envelope::ok_empty("history cleared"))
    }

    pub async fn add_favorite(&self, resource: &ResourceRecord) -> Result<Envelope<bool>> {
        let session = self.require_session()?;
        let added = self.db.add_favorite(&session.user_id, resource)?;
        let message = if added {
            "favorite added"
        } else {
            "already a favorite"
        };
        Ok(Envelope::ok(added, message))
    }

    pub async fn remove_favorite(&self, resource_id: &str) -> Result<Envelope<bool>> {
        let session = self.require_session()?;
        let removed = self.db.remove_favorite(&session.user_id, resource_id)?;
        Ok(Envelope::ok(removed, "favorite removed"))
    }

    pub async fn favorites(&self) -> Result<Envelope<Vec<Favorite>>> {
        let session = self.require_session()?;
        Ok(Envelope::ok(
            self.db.favorites(&session.user_id),
            "favorites loaded",
        ))
    }

    pub async fn douban_hot_list(
        &self,
        params: &HotListParams,
    ) -> Result<Envelope<Vec<HotListItem>>> {
        let query = query_pairs(params)?;
        let slot = CacheSlot::minutes(
            format!("douban_hot_list_{}", query_key(&query)),
            DOUBAN_TTL_MINUTES,
        );
        let request = Request::Get {
            path: endpoints::DOUBAN_HOT,
            query,
        };
        self.cached_fetch(Some(slot), request, placeholder::hot_list)
            .await
    }

    pub async fn cloud_share_info(
        &self,
        cloud: CloudType,
        params: &ShareInfoParams,
    ) -> Result<Envelope<ShareInfo>> {
        let path = endpoints::share_info(cloud);
        let slot = CacheSlot::minutes(
            format!("cloud_share_info_{}_{}", cloud, params.share_code),
            SHARE_INFO_TTL_MINUTES,
        );
        let request = Request::Get {
            path: &path,
            query: query_pairs(params)?,
        };
        self.cached_fetch(Some(slot), request, || placeholder::share_info(params))
            .await
    }

    pub async fn cloud_folders(
        &self,
        cloud: CloudType,
        parent_cid: &str,
    ) -> Result<Envelope<Vec<Folder>>> {
        let path = endpoints::folders(cloud);
        let slot = CacheSlot::minutes(
            format!("cloud_folders_{}_{}", cloud, parent_cid),
            FOLDERS_TTL_MINUTES,
        );
        let request = Request::Get {
            path: &path,
            query: vec![("parentCid".to_string(), parent_cid.to_string())],
        };
        self.cached_fetch(Some(slot), request, placeholder::folders)
            .await
    }

    /// Saves shared files into a drive folder; never cached
    pub async fn save_cloud_file(
        &self,
        cloud: CloudType,
        params: &SaveFileParams,
    ) -> Result<Envelope<Value>> {
        let path = endpoints::save(cloud);
        let request = Request::Post {
            path: &path,
            body: serde_json::to_value(params)?,
        };
        match self.fetch::<Value>(request).await {
            Ok(envelope) => Ok(envelope),
            Err(e) if self.masks(&e) => {
                tracing::warn!(error = %e, %cloud, "save unavailable, reporting placeholder success");
                Ok(Envelope::ok_empty(placeholder::SAVE_MESSAGE))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn sponsors(&self) -> Result<Envelope<Vec<Sponsor>>> {
        let slot = CacheSlot::minutes("sponsors".to_string(), SPONSORS_TTL_MINUTES);
        let request = Request::Get {
            path: endpoints::SPONSORS,
            query: Query::new(),
        };
        self.cached_fetch(Some(slot), request, placeholder::sponsors)
            .await
    }

    /// Checks whether the backend answers within three seconds
    ///
    /// While offline, remote operations skip the network and go straight to
    /// the unavailable policy.
    pub async fn probe(&self) -> Mode {
        let result =
            tokio::time::timeout(PROBE_TIMEOUT, self.transport.get(endpoints::HEALTH, &Query::new()))
                .await;
        let online = matches!(result, Ok(Ok(_)));
        self.online.store(online, Ordering::Relaxed);
        let mode = self.mode();
        tracing::info!(?mode, "availability probe");
        mode
    }

    pub fn mode(&self) -> Mode {
        if self.online.load(Ordering::Relaxed) {
            Mode::Online
        } else {
            Mode::Offline
        }
    }

    /// Runs the stale search-result sweep on demand
    pub fn cleanup(&self) -> Result<usize> {
        self.db.cleanup()
    }

    async fn fetch<T: DeserializeOwned>(&self, request: Request<'_>) -> Result<Envelope<T>> {
        if self.mode() == Mode::Offline {
            return Err(AdapterError::RemoteUnavailable(
                "backend marked offline".to_string(),
            ));
        }
        let body = match request {
            Request::Get { path, query } => self.transport.get(path, &query).await?,
            Request::Post { path, body } => self.transport.post(path, &body).await?,
        };
        decode_envelope(body)
    }

    /// Looks up `slot`, otherwise fetches and caches a successful result
    async fn cached_fetch<T, F>(
        &self,
        slot: Option<CacheSlot>,
        request: Request<'_>,
        make_placeholder: F,
    ) -> Result<Envelope<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let store = self.db.store();
        if let Some(slot) = &slot {
            if let Some(data) = store.get::<T>(&slot.key) {
                tracing::debug!(key = %slot.key, "cache hit");
                return Ok(Envelope::ok(data, CACHE_HIT_MESSAGE));
            }
        }

        let envelope = match self.fetch::<T>(request).await {
            Ok(envelope) => envelope,
            Err(e) => return self.fallback(e, make_placeholder),
        };

        if let (Some(slot), true, Some(data)) = (&slot, envelope.is_success(), &envelope.data) {
            if let Err(e) = store.set(&slot.key, data, slot.ttl) {
                tracing::warn!(key = %slot.key, error = %e, "failed to cache response");
            }
        }
        Ok(envelope)
    }

    fn masks(&self, err: &AdapterError) -> bool {
        self.policy == RemoteUnavailablePolicy::Placeholder && err.is_remote_unavailable()
    }

    /// Applies the unavailable policy to a failed remote call
    fn fallback<T>(
        &self,
        err: AdapterError,
        make_placeholder: impl FnOnce() -> T,
    ) -> Result<Envelope<T>> {
        if self.masks(&err) {
            tracing::warn!(error = %err, "backend unavailable, returning placeholder data");
            return Ok(Envelope::ok(make_placeholder(), placeholder::MESSAGE));
        }
        Err(err)
    }
}

/// Stable cache-key fragment for a query
fn query_key(query: &Query) -> String {
    let mut parts: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    parts.sort();
    parts.join("&")
}
