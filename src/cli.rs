//! Command-line interface
//!
//! Parses arguments with clap, turns them into an [`AdapterConfig`], and runs
//! one command against the adapter. Every command prints its envelope as
//! JSON.

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapter::ApiAdapter;
use crate::config::{AdapterConfig, RemoteUnavailablePolicy, DEFAULT_BASE_URL};
use crate::data::{
    CloudType, Envelope, HotListParams, ResourceRecord, SaveFileParams, SaveSettingsRequest,
    SettingsData, ShareInfoParams,
};
use crate::error::Result;

/// CloudSaver client - search shared cloud drive resources and manage saves
#[derive(Parser, Debug)]
#[command(name = "cloudsaver")]
#[command(about = "Cloud drive resource search client with a local cache")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "CLOUDSAVER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory for cached data (defaults to the platform cache directory)
    #[arg(long, env = "CLOUDSAVER_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// What to return when the backend cannot be reached
    #[arg(
        long,
        value_enum,
        env = "CLOUDSAVER_ON_UNAVAILABLE",
        default_value_t = RemoteUnavailablePolicy::Propagate
    )]
    pub on_unavailable: RemoteUnavailablePolicy,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a local account
    Register {
        username: String,
        password: String,
        /// Registration code deciding the account role
        code: String,
    },
    /// Sign in and start a session
    Login { username: String, password: String },
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Search shared resources
    Search {
        keyword: String,
        #[arg(long)]
        channel_id: Option<String>,
        #[arg(long)]
        last_message_id: Option<String>,
    },
    /// Show or clear the search history
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Manage favorite resources
    #[command(subcommand)]
    Favorite(FavoriteCommand),
    /// Read or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Douban hot list
    Douban {
        /// movie or tv
        #[arg(long, default_value = "movie")]
        kind: String,
        #[arg(long, default_value = "热门")]
        tag: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        start: Option<u32>,
    },
    /// Details of a shared link
    ShareInfo {
        cloud: CloudType,
        share_code: String,
        #[arg(long)]
        receive_code: Option<String>,
    },
    /// List folders in a cloud drive
    Folders {
        cloud: CloudType,
        #[arg(long)]
        parent_cid: Option<String>,
    },
    /// Save shared files into a cloud drive folder
    Save {
        cloud: CloudType,
        share_code: String,
        #[arg(required = true)]
        file_ids: Vec<String>,
        #[arg(long)]
        receive_code: Option<String>,
        #[arg(long, default_value = "0")]
        folder_id: String,
    },
    /// List sponsors
    Sponsors,
    /// Check whether the backend is reachable
    Probe,
    /// Remove stale cached search results
    Cleanup,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum FavoriteCommand {
    Add {
        id: String,
        title: String,
        #[arg(long = "link")]
        links: Vec<String>,
        #[arg(long, default_value = "")]
        cloud_type: String,
    },
    Remove {
        id: String,
    },
    List,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SettingsCommand {
    Get,
    Set(SettingsPatch),
}

/// Settings fields to change; unset fields keep their current value
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    #[arg(long)]
    pub cloud115_cookie: Option<String>,
    #[arg(long)]
    pub quark_cookie: Option<String>,
    #[arg(long)]
    pub proxy_host: Option<String>,
    #[arg(long)]
    pub proxy_port: Option<u16>,
    #[arg(long)]
    pub proxy_enabled: Option<bool>,
}

impl SettingsPatch {
    fn touches_global(&self) -> bool {
        self.proxy_host.is_some() || self.proxy_port.is_some() || self.proxy_enabled.is_some()
    }

    fn touches_user(&self) -> bool {
        self.cloud115_cookie.is_some() || self.quark_cookie.is_some()
    }

    /// Builds a save request that changes only the fields given
    pub fn apply(&self, current: SettingsData) -> SaveSettingsRequest {
        let SettingsData {
            mut global_setting,
            mut user_settings,
        } = current;

        if let Some(host) = &self.proxy_host {
            global_setting.http_proxy_host = host.clone();
        }
        if let Some(port) = self.proxy_port {
            global_setting.http_proxy_port = port;
        }
        if let Some(enabled) = self.proxy_enabled {
            global_setting.is_proxy_enabled = enabled;
        }
        if let Some(cookie) = &self.cloud115_cookie {
            user_settings.cloud115_cookie = cookie.clone();
        }
        if let Some(cookie) = &self.quark_cookie {
            user_settings.quark_cookie = cookie.clone();
        }

        SaveSettingsRequest {
            global_setting: self.touches_global().then_some(global_setting),
            user_settings: self.touches_user().then_some(user_settings),
        }
    }
}

impl Cli {
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            base_url: self.base_url.clone(),
            on_unavailable: self.on_unavailable,
            cache_dir: self.cache_dir.clone(),
            request_timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Runs one command and returns what should be printed
pub async fn run(adapter: &ApiAdapter, command: Command) -> Result<Value> {
    match command {
        Command::Register {
            username,
            password,
            code,
        } => to_json(adapter.user().register(&username, &password, &code).await?),
        Command::Login { username, password } => {
            to_json(adapter.user().login(&username, &password).await?)
        }
        Command::Logout => to_json(adapter.user().logout().await?),
        Command::Whoami => to_json(match adapter.current_user() {
            Some(session) => Envelope::ok(session, "signed in"),
            None => Envelope::ok_empty("not logged in"),
        }),
        Command::Search {
            keyword,
            channel_id,
            last_message_id,
        } => to_json(
            adapter
                .resource()
                .search(&keyword, channel_id.as_deref(), last_message_id.as_deref())
                .await?,
        ),
        Command::History { clear: true } => to_json(adapter.clear_search_history().await?),
        Command::History { clear: false } => to_json(adapter.search_history().await?),
        Command::Favorite(FavoriteCommand::Add {
            id,
            title,
            links,
            cloud_type,
        }) => {
            let resource = ResourceRecord {
                id,
                title,
                cloud_links: links,
                cloud_type,
                channel: String::new(),
                pub_date: String::new(),
                is_support_save: false,
            };
            to_json(adapter.add_favorite(&resource).await?)
        }
        Command::Favorite(FavoriteCommand::Remove { id }) => {
            to_json(adapter.remove_favorite(&id).await?)
        }
        Command::Favorite(FavoriteCommand::List) => to_json(adapter.favorites().await?),
        Command::Settings(SettingsCommand::Get) => to_json(adapter.setting().get_setting().await?),
        Command::Settings(SettingsCommand::Set(patch)) => {
            let current = adapter
                .setting()
                .get_setting()
                .await?
                .data
                .unwrap_or_else(|| SettingsData {
                    global_setting: Default::default(),
                    user_settings: Default::default(),
                });
            let request = patch.apply(current);
            to_json(adapter.setting().save_setting(&request).await?)
        }
        Command::Douban {
            kind,
            tag,
            limit,
            start,
        } => {
            let params = HotListParams {
                kind,
                tag,
                page_limit: limit,
                page_start: start,
            };
            to_json(adapter.douban().hot_list(&params).await?)
        }
        Command::ShareInfo {
            cloud,
            share_code,
            receive_code,
        } => {
            let params = ShareInfoParams {
                share_code,
                receive_code,
            };
            to_json(adapter.cloud(cloud).share_info(&params).await?)
        }
        Command::Folders { cloud, parent_cid } => to_json(
            adapter
                .cloud(cloud)
                .folder_list(parent_cid.as_deref())
                .await?,
        ),
        Command::Save {
            cloud,
            share_code,
            file_ids,
            receive_code,
            folder_id,
        } => {
            let params = SaveFileParams {
                share_code,
                receive_code,
                file_ids,
                folder_id,
            };
            to_json(adapter.cloud(cloud).save_file(&params).await?)
        }
        Command::Sponsors => to_json(adapter.user().sponsors().await?),
        Command::Probe => to_json(Envelope::ok(adapter.probe().await, "probe finished")),
        Command::Cleanup => to_json(Envelope::ok(adapter.cleanup()?, "stale entries removed")),
    }
}
