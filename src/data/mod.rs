//! Data types exchanged with the backend and kept in local storage
//!
//! Field names follow the backend's JSON (camelCase for most payloads,
//! snake_case for the Douban list), so these types decode responses as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response wrapper used by every backend call
///
/// `code == 0` means success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 0,
            data: Some(data),
            message: message.into(),
        }
    }

    /// A success envelope with no payload
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            data: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Account role, decided by the registration code used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    Normal,
    Admin,
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        match role {
            Role::Normal => 0,
            Role::Admin => 1,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Normal),
            1 => Ok(Role::Admin),
            other => Err(format!("unknown role {}", other)),
        }
    }
}

/// A locally registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// Hex SHA-256 of `salt || password`
    pub password_hash: String,
    pub salt: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The signed-in user, kept until logout or TTL expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterData {
    pub username: String,
    pub role: Role,
}

/// Process-wide settings, shared by every user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(rename = "httpProxyHost")]
    pub http_proxy_host: String,
    #[serde(rename = "httpProxyPort")]
    pub http_proxy_port: u16,
    #[serde(rename = "isProxyEnabled")]
    pub is_proxy_enabled: bool,
    #[serde(rename = "AdminUserCode")]
    pub admin_user_code: u32,
    #[serde(rename = "CommonUserCode")]
    pub common_user_code: u32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            http_proxy_host: "127.0.0.1".to_string(),
            http_proxy_port: 7890,
            is_proxy_enabled: false,
            admin_user_code: 230713,
            common_user_code: 9527,
        }
    }
}

/// Per-user cloud drive credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(rename = "cloud115Cookie")]
    pub cloud115_cookie: String,
    pub quark_cookie: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsData {
    pub global_setting: GlobalSettings,
    pub user_settings: UserSettings,
}

/// Input to a settings save; either half may be omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_setting: Option<GlobalSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_settings: Option<UserSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub name: String,
    #[serde(default)]
    pub channel_logo: String,
    pub channel_id: String,
}

/// A single shared resource found by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cloud_links: Vec<String>,
    #[serde(default)]
    pub cloud_type: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub is_support_save: bool,
}

/// Search results from one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    pub id: String,
    pub channel_info: ChannelInfo,
    #[serde(default)]
    pub display_list: bool,
    #[serde(default)]
    pub list: Vec<ResourceRecord>,
}

/// A favorited resource and when it was saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(flatten)]
    pub resource: ResourceRecord,
    pub added_at: DateTime<Utc>,
}

/// Query for the Douban hot list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotListParams {
    /// `movie` or `tv`
    #[serde(rename = "type")]
    pub kind: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
}

impl Default for HotListParams {
    fn default() -> Self {
        Self {
            kind: "movie".to_string(),
            tag: "热门".to_string(),
            page_limit: None,
            page_start: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotListItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub rate: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub cover_x: u32,
    #[serde(default)]
    pub cover_y: u32,
    #[serde(default)]
    pub episodes_info: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub playable: bool,
    #[serde(default)]
    pub url: String,
}

/// Supported cloud drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudType {
    Cloud115,
    Quark,
}

impl CloudType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudType::Cloud115 => "cloud115",
            CloudType::Quark => "quark",
        }
    }
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloud115" | "115" => Ok(CloudType::Cloud115),
            "quark" => Ok(CloudType::Quark),
            other => Err(format!("unknown cloud type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInfoParams {
    pub share_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareFile {
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: String,
    #[serde(default)]
    pub file_id_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInfo {
    #[serde(default)]
    pub list: Vec<ShareFile>,
    #[serde(default)]
    pub pwd_id: String,
    #[serde(default)]
    pub stoken: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub cid: String,
    pub name: String,
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

/// Request body for saving shared files into a drive folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileParams {
    pub share_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_code: Option<String>,
    pub file_ids: Vec<String>,
    pub folder_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: String,
}
