//! Per-feature clients
//!
//! Each client borrows the [`ApiAdapter`](crate::adapter::ApiAdapter) and
//! exposes the calls one feature area needs under its own names.

mod cloud;
mod douban;
mod resource;
mod setting;
mod user;

pub use cloud::CloudDriveApi;
pub use douban::DoubanApi;
pub use resource::ResourceApi;
pub use setting::SettingApi;
pub use user::UserApi;
