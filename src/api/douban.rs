use crate::adapter::ApiAdapter;
use crate::data::{Envelope, HotListItem, HotListParams};
use crate::error::Result;

pub struct DoubanApi<'a> {
    adapter: &'a ApiAdapter,
}

impl<'a> DoubanApi<'a> {
    pub fn new(adapter: &'a ApiAdapter) -> Self {
        Self { adapter }
    }

    pub async fn hot_list(&self, params: &HotListParams) -> Result<Envelope<Vec<HotListItem>>> {
        self.adapter.douban_hot_list(params).await
    }
}
