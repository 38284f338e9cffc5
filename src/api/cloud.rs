//! Cloud drive client, one instance per drive

use serde_json::Value;

use crate::adapter::ApiAdapter;
use crate::data::{CloudType, Envelope, Folder, SaveFileParams, ShareInfo, ShareInfoParams};
use crate::error::Result;

/// Folder listed when no parent is given
pub const ROOT_FOLDER: &str = "0";

pub struct CloudDriveApi<'a> {
    adapter: &'a ApiAdapter,
    cloud: CloudType,
}

impl<'a> CloudDriveApi<'a> {
    pub fn new(adapter: &'a ApiAdapter, cloud: CloudType) -> Self {
        Self { adapter, cloud }
    }

    pub fn cloud(&self) -> CloudType {
        self.cloud
    }

    pub async fn share_info(&self, params: &ShareInfoParams) -> Result<Envelope<ShareInfo>> {
        self.adapter.cloud_share_info(self.cloud, params).await
    }

    pub async fn folder_list(&self, parent_cid: Option<&str>) -> Result<Envelope<Vec<Folder>>> {
        self.adapter
            .cloud_folders(self.cloud, parent_cid.unwrap_or(ROOT_FOLDER))
            .await
    }

    pub async fn save_file(&self, params: &SaveFileParams) -> Result<Envelope<Value>> {
        self.adapter.save_cloud_file(self.cloud, params).await
    }
}
