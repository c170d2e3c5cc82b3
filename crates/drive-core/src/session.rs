//! サービスアカウントのセッション
//!
//! トークンの発行・署名・キャッシュは yup-oauth2 に任せ、
//! ここでは同期 API として呼び出せるようにするだけ。

use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::ServiceAccountAuthenticator;

use crate::credentials::ServiceAccountKey;
use crate::{Error, Result};

/// デフォルトのスコープ（Drive の読み書き）
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// リクエストに付与するアクセストークンの供給元
pub trait TokenSource {
    fn access_token(&self) -> Result<String>;
}

/// 認証済みセッション
pub struct Session {
    client_email: String,
    scopes: Vec<String>,
    runtime: Runtime,
    authenticator: DefaultAuthenticator,
}

impl Session {
    /// 認証情報を検証してオーセンティケータを構築（トークン取得はまだ行わない）
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>) -> Result<Self> {
        let scopes = if scopes.is_empty() {
            vec![DEFAULT_SCOPE.to_string()]
        } else {
            scopes
        };

        let client_email = key.client_email.clone();
        let provider_key: yup_oauth2::ServiceAccountKey =
            serde_json::from_value(serde_json::to_value(&key)?)
                .map_err(|e| Error::Auth(format!("Invalid service account key: {}", e)))?;

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let authenticator = runtime
            .block_on(ServiceAccountAuthenticator::builder(provider_key).build())
            .map_err(|e| Error::Auth(format!("Failed to build service account session: {}", e)))?;

        Ok(Self {
            client_email,
            scopes,
            runtime,
            authenticator,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl TokenSource for Session {
    /// 有効なアクセストークンを取得（期限切れの場合はライブラリ側で再取得）
    fn access_token(&self) -> Result<String> {
        debug!("Requesting access token for {}", self.client_email);

        let token = self
            .runtime
            .block_on(self.authenticator.token(self.scopes.as_slice()))
            .map_err(|e| Error::Auth(format!("Failed to obtain access token: {}", e)))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| Error::Auth("Token response did not contain an access token".into()))
    }
}
