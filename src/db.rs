//! Local database of users, settings, cached searches, history and favorites
//!
//! Everything lives in one [`ExpiringStore`] under fixed key names. Records
//! that must outlive the cache window (accounts, settings, history,
//! favorites) are persisted without a TTL.

use chrono::Duration;
use uuid::Uuid;

use crate::auth;
use crate::cache::ExpiringStore;
use crate::data::{
    ChannelGroup, Favorite, GlobalSettings, ResourceRecord, Role, Session, User, UserSettings,
};
use crate::error::{AdapterError, Result};

/// How long a cached search result is served
pub const SEARCH_CACHE_TTL_MINUTES: i64 = 30;

/// Age after which the startup sweep drops cached search results
pub const RESOURCE_SWEEP_AGE_MINUTES: i64 = 60;

/// Lifetime of the signed-in session record
pub const SESSION_TTL_HOURS: i64 = 6;

/// Maximum number of remembered search keywords per user
pub const SEARCH_HISTORY_LIMIT: usize = 20;

/// Storage key names
pub mod keys {
    pub const USERS: &str = "users";
    pub const GLOBAL_SETTINGS: &str = "global_settings";
    pub const CURRENT_USER: &str = "current_user";
    pub const TEMP_USER_SETTINGS: &str = "temp_user_settings";
    pub const RESOURCE_CACHE_PREFIX: &str = "resource_cache_";

    pub fn user_settings(user_id: &str) -> String {
        format!("user_settings_{}", user_id)
    }

    pub fn resource_cache(keyword: &str) -> String {
        format!("{}{}", RESOURCE_CACHE_PREFIX, keyword)
    }

    pub fn search_history(user_id: &str) -> String {
        format!("search_history_{}", user_id)
    }

    pub fn favorites(user_id: &str) -> String {
        format!("favorites_{}", user_id)
    }
}

#[derive(Debug, Clone)]
pub struct LocalDatabase {
    store: ExpiringStore,
}

impl LocalDatabase {
    /// Creates a database over `store`; nothing is written until first use
    pub fn new(store: ExpiringStore) -> Self {
        Self { store }
    }

    /// The underlying store, for domain caches kept outside this module
    pub fn store(&self) -> &ExpiringStore {
        &self.store
    }

    /// All registered accounts, empty when none exist or the table is unreadable
    pub fn users(&self) -> Vec<User> {
        self.store.get(keys::USERS).unwrap_or_default()
    }

    /// Looks up an account by exact username
    pub fn find_user(&self, username: &str) -> Option<User> {
        self.users().into_iter().find(|u| u.username == username)
    }

    /// Registers a new account, rejecting taken usernames
    ///
    /// # Arguments
    /// * `username` - Must not already be registered
    /// * `password` - Stored only as a salted digest
    /// * `role` - Role decided by the registration code
    ///
    /// # Returns
    /// * `Ok(User)` with a fresh user id and salt
    /// * `Err(AdapterError::Validation)` if the username is taken
    /// * `Err` if the account table cannot be written
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let mut users = self.users();
        if users.iter().any(|u| u.username == username) {
            return Err(AdapterError::Validation(format!(
                "username '{}' already exists",
                username
            )));
        }

        let salt = auth::generate_salt();
        let user = User {
            user_id: Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            password_hash: auth::hash_password(&salt, password),
            salt,
            role,
            created_at: self.store.now(),
        };

        users.push(user.clone());
        self.store.persist(keys::USERS, &users)?;
        tracing::info!(username, ?role, "user registered");
        Ok(user)
    }

    /// Global settings, written with defaults on first read
    pub fn global_settings(&self) -> Result<GlobalSettings> {
        if let Some(settings) = self.store.get(keys::GLOBAL_SETTINGS) {
            return Ok(settings);
        }
        let defaults = GlobalSettings::default();
        self.store.persist(keys::GLOBAL_SETTINGS, &defaults)?;
        Ok(defaults)
    }

    /// Replaces the global settings
    pub fn save_global_settings(&self, settings: &GlobalSettings) -> Result<()> {
        self.store.persist(keys::GLOBAL_SETTINGS, settings)
    }

    /// Settings for `user_id`, written with defaults on first read
    pub fn user_settings(&self, user_id: &str) -> Result<UserSettings> {
        let key = keys::user_settings(user_id);
        if let Some(settings) = self.store.get(&key) {
            return Ok(settings);
        }
        let defaults = UserSettings::default();
        self.store.persist(&key, &defaults)?;
        Ok(defaults)
    }

    /// Replaces the settings stored for `user_id`
    pub fn save_user_settings(&self, user_id: &str, settings: &UserSettings) -> Result<()> {
        self.store.persist(&keys::user_settings(user_id), settings)
    }

    /// Holds user settings saved while nobody is signed in
    pub fn save_temp_user_settings(&self, settings: &UserSettings) -> Result<()> {
        self.store.persist(keys::TEMP_USER_SETTINGS, settings)
    }

    /// Settings saved by [`save_temp_user_settings`](Self::save_temp_user_settings), if any
    pub fn temp_user_settings(&self) -> Option<UserSettings> {
        self.store.get(keys::TEMP_USER_SETTINGS)
    }

    /// Caches search results for `keyword` for 30 minutes
    ///
    /// # Arguments
    /// * `keyword` - The search keyword; any text, including long CJK titles
    /// * `groups` - Results as returned by the backend
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the entry cannot be serialized or written
    pub fn cache_resources(&self, keyword: &str, groups: &[ChannelGroup]) -> Result<()> {
        self.store.set(
            &keys::resource_cache(keyword),
            &groups,
            Duration::minutes(SEARCH_CACHE_TTL_MINUTES),
        )
    }

    /// Cached results for `keyword`, or `None` when missing or expired
    pub fn cached_resources(&self, keyword: &str) -> Option<Vec<ChannelGroup>> {
        self.store.get(&keys::resource_cache(keyword))
    }

    /// Puts `keyword` at the front of the user's history
    ///
    /// An existing occurrence moves to the front; the oldest entries beyond
    /// the limit are dropped.
    pub fn add_search_history(&self, user_id: &str, keyword: &str) -> Result<()> {
        let mut history = self.search_history(user_id);
        history.retain(|k| k != keyword);
        history.insert(0, keyword.to_string());
        history.truncate(SEARCH_HISTORY_LIMIT);
        self.store.persist(&keys::search_history(user_id), &history)
    }

    /// Most recent first
    pub fn search_history(&self, user_id: &str) -> Vec<String> {
        self.store
            .get(&keys::search_history(user_id))
            .unwrap_or_default()
    }

    /// Forgets every keyword searched by `user_id`
    pub fn clear_search_history(&self, user_id: &str) -> Result<()> {
        self.store.remove(&keys::search_history(user_id))
    }

    /// Returns false if a resource with the same id was already saved
    pub fn add_favorite(&self, user_id: &str, resource: &ResourceRecord) -> Result<bool> {
        let mut favorites = self.favorites(user_id);
        if favorites.iter().any(|f| f.resource.id == resource.id) {
            return Ok(false);
        }
        favorites.push(Favorite {
            resource: resource.clone(),
            added_at: self.store.now(),
        });
        self.store.persist(&keys::favorites(user_id), &favorites)?;
        Ok(true)
    }

    /// Returns false if nothing with that id was saved
    pub fn remove_favorite(&self, user_id: &str, resource_id: &str) -> Result<bool> {
        let mut favorites = self.favorites(user_id);
        let before = favorites.len();
        favorites.retain(|f| f.resource.id != resource_id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.store.persist(&keys::favorites(user_id), &favorites)?;
        Ok(true)
    }

    /// Saved favorites in the order they were added
    pub fn favorites(&self, user_id: &str) -> Vec<Favorite> {
        self.store.get(&keys::favorites(user_id)).unwrap_or_default()
    }

    /// The signed-in user, or `None` when signed out or the session expired
    pub fn session(&self) -> Option<Session> {
        self.store.get(keys::CURRENT_USER)
    }

    /// Records `session` as the signed-in user for six hours
    ///
    /// A later call replaces the previous session.
    pub fn set_session(&self, session: &Session) -> Result<()> {
        self.store.set(
            keys::CURRENT_USER,
            session,
            Duration::hours(SESSION_TTL_HOURS),
        )
    }

    /// Signs out; clearing an absent session is not an error
    pub fn clear_session(&self) -> Result<()> {
        self.store.remove(keys::CURRENT_USER)
    }

    /// Drops cached search results older than the sweep age
    ///
    /// # Returns
    /// * `Ok(n)` with the number of entries removed
    /// * `Err` if the medium cannot be listed or an entry cannot be removed
    pub fn cleanup(&self) -> Result<usize> {
        self.store.sweep(
            keys::RESOURCE_CACHE_PREFIX,
            Duration::minutes(RESOURCE_SWEEP_AGE_MINUTES),
        )
    }
}
