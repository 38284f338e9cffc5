use crate::adapter::ApiAdapter;
use crate::data::{ChannelGroup, Envelope};
use crate::error::Result;

pub struct ResourceApi<'a> {
    adapter: &'a ApiAdapter,
}

impl<'a> ResourceApi<'a> {
    pub fn new(adapter: &'a ApiAdapter) -> Self {
        Self { adapter }
    }

    pub async fn search(
        &self,
        keyword: &str,
        channel_id: Option<&str>,
        last_message_id: Option<&str>,
    ) -> Result<Envelope<Vec<ChannelGroup>>> {
        self.adapter
            .search(keyword, channel_id, last_message_id)
            .await
    }
}
