use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Supplies the opaque access token of the signed-in rider.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn access_token(&self) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| anyhow!("no active session; set an auth token and sign in again"))
    }
}
