use crate::adapter::ApiAdapter;
use crate::data::{Envelope, SaveSettingsRequest, SettingsData};
use crate::error::Result;

pub struct SettingApi<'a> {
    adapter: &'a ApiAdapter,
}

impl<'a> SettingApi<'a> {
    pub fn new(adapter: &'a ApiAdapter) -> Self {
        Self { adapter }
    }

    pub async fn get_setting(&self) -> Result<Envelope<SettingsData>> {
        self.adapter.get_settings().await
    }

    pub async fn save_setting(&self, request: &SaveSettingsRequest) -> Result<Envelope<()>> {
        self.adapter.save_settings(request).await
    }
}
