//! Bearer credential collaborator
//!
//! Token acquisition is outside the pipeline; clients ask a provider for the
//! current token before every call.

use async_trait::async_trait;

use super::UpstreamError;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, UpstreamError>;
}

/// Token read once from configuration
#[derive(Clone)]
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn bearer_token(&self) -> Result<String, UpstreamError> {
        if self.token.is_empty() {
            return Err(UpstreamError::Transport("no API token configured".into()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential() {
        let cred = StaticCredential::new("tok");
        assert_eq!(cred.bearer_token().await.unwrap(), "tok");
        assert!(!format!("{cred:?}").contains("tok\""));

        let empty = StaticCredential::new("");
        assert!(empty.bearer_token().await.is_err());
    }
}
