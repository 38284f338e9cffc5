use crate::adapter::ApiAdapter;
use crate::data::{Envelope, LoginData, RegisterData, Sponsor};
use crate::error::Result;

pub struct UserApi<'a> {
    adapter: &'a ApiAdapter,
}

impl<'a> UserApi<'a> {
    pub fn new(adapter: &'a ApiAdapter) -> Self {
        Self { adapter }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Envelope<LoginData>> {
        self.adapter.login(username, password).await
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        register_code: &str,
    ) -> Result<Envelope<RegisterData>> {
        self.adapter
            .register(username, password, register_code)
            .await
    }

    pub async fn logout(&self) -> Result<Envelope<()>> {
        self.adapter.logout().await
    }

    pub async fn sponsors(&self) -> Result<Envelope<Vec<Sponsor>>> {
        self.adapter.sponsors().await
    }
}
