use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_SCOPE;
use crate::{Error, Result};

/// 認証情報 JSON を格納する環境変数名
pub const DEFAULT_CREDENTIALS_ENV: &str = "SECRET_SERVICE_ACCOUNT";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_UPLOAD_MIME_TYPE: &str = "text/csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// クライアント構築用の設定
///
/// 環境変数の読み込みは呼び出し側で行い、その結果をここに渡す。
#[derive(Clone)]
pub struct ClientConfig {
    /// サービスアカウントの JSON ドキュメント
    pub credentials_json: String,
    /// 空ならデフォルトスコープを使用
    pub scopes: Vec<String>,
    pub page_size: u32,
    pub upload_mime_type: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(credentials_json: impl Into<String>) -> Self {
        Self {
            credentials_json: credentials_json.into(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            page_size: DEFAULT_PAGE_SIZE,
            upload_mime_type: DEFAULT_UPLOAD_MIME_TYPE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// 環境変数から認証情報を読み込んで作成
    pub fn from_env(var_name: &str) -> Result<Self> {
        let json = env::var(var_name)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} environment variable is not set", var_name))
            })?;
        Ok(Self::new(json))
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<()> {
        if self.credentials_json.trim().is_empty() {
            return Err(Error::Config("Service account JSON is required".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.scopes.iter().any(|scope| scope.trim().is_empty()) {
            return Err(Error::Config("Scopes must not contain empty entries".into()));
        }
        if self.upload_mime_type.trim().is_empty() {
            return Err(Error::Config("upload_mime_type must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("credentials_json", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("page_size", &self.page_size)
            .field("upload_mime_type", &self.upload_mime_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// 設定ファイル (`~/.drive/config.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub drive: Option<DriveConfig>,
}

/// Drive 設定
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DriveConfig {
    /// 認証情報を読む環境変数名（デフォルト: SECRET_SERVICE_ACCOUNT）
    pub credentials_env: Option<String>,
    /// 認証情報 JSON ファイル（環境変数が無い場合に使用）
    pub credentials_file: Option<PathBuf>,
    pub scopes: Option<Vec<String>>,
    pub page_size: Option<u32>,
    pub upload_mime_type: Option<String>,
    pub timeout_secs: Option<u64>,
    /// 親フォルダ未指定時に使うフォルダ ID
    pub default_parent: Option<String>,
}

impl Config {
    /// 設定ファイルのパスを取得
    pub fn config_path() -> Result<PathBuf> {
        let home = env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".into()))?;
        Ok(PathBuf::from(home).join(".drive").join("config.toml"))
    }

    /// 設定を読み込み
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// 設定を保存
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// デフォルト値を書き出した設定（`config init` 用）
    pub fn with_defaults() -> Self {
        Self {
            drive: Some(DriveConfig {
                credentials_env: Some(DEFAULT_CREDENTIALS_ENV.to_string()),
                credentials_file: None,
                scopes: Some(vec![DEFAULT_SCOPE.to_string()]),
                page_size: Some(DEFAULT_PAGE_SIZE),
                upload_mime_type: Some(DEFAULT_UPLOAD_MIME_TYPE.to_string()),
                timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
                default_parent: None,
            }),
        }
    }

    /// 認証情報を読む環境変数名
    pub fn credentials_env(&self) -> String {
        self.drive
            .as_ref()
            .and_then(|d| d.credentials_env.clone())
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_ENV.to_string())
    }

    pub fn default_parent(&self) -> Option<&str> {
        self.drive.as_ref().and_then(|d| d.default_parent.as_deref())
    }

    /// 認証情報 JSON を取得（環境変数優先）
    pub fn load_credentials(&self) -> Result<String> {
        let var_name = self.credentials_env();
        self.resolve_credentials(&var_name, env::var(&var_name).ok())
    }

    fn resolve_credentials(&self, var_name: &str, env_value: Option<String>) -> Result<String> {
        if let Some(json) = env_value.filter(|value| !value.trim().is_empty()) {
            return Ok(json);
        }

        let file = self.drive.as_ref().and_then(|d| d.credentials_file.as_ref());
        match file {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!(
                    "Failed to read credentials file {}: {}",
                    path.display(),
                    e
                ))
            }),
            None => Err(Error::Config(format!(
                "{} not found in environment or config",
                var_name
            ))),
        }
    }

    /// ClientConfig を作成
    pub fn client_config(&self) -> Result<ClientConfig> {
        let credentials_json = self.load_credentials()?;
        Ok(self.apply(ClientConfig::new(credentials_json)))
    }

    fn apply(&self, mut client: ClientConfig) -> ClientConfig {
        if let Some(drive) = &self.drive {
            if let Some(scopes) = &drive.scopes {
                client.scopes = scopes.clone();
            }
            if let Some(page_size) = drive.page_size {
                client.page_size = page_size;
            }
            if let Some(mime) = &drive.upload_mime_type {
                client.upload_mime_type = mime.clone();
            }
            if let Some(secs) = drive.timeout_secs {
                client.timeout = Duration::from_secs(secs);
            }
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            drive: Some(DriveConfig {
                credentials_env: Some("MY_SA".to_string()),
                page_size: Some(50),
                default_parent: Some("folder-1".to_string()),
                ..Default::default()
            }),
        };

        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("MY_SA"));
        assert!(toml.contains("folder-1"));

        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.drive, config.drive);
        assert_eq!(parsed.credentials_env(), "MY_SA");
        assert_eq!(parsed.default_parent(), Some("folder-1"));
    }

    #[test]
    fn test_credentials_env_default() {
        let config = Config::default();
        assert_eq!(config.credentials_env(), DEFAULT_CREDENTIALS_ENV);
        assert!(config.default_parent().is_none());
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_credentials(DEFAULT_CREDENTIALS_ENV, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config.resolve_credentials(DEFAULT_CREDENTIALS_ENV, Some("  ".to_string())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_takes_precedence_over_file() -> Result<()> {
        let temp = TempDir::new()?;
        let key_path = temp.path().join("sa.json");
        fs::write(&key_path, "{\"from\":\"file\"}")?;

        let config = Config {
            drive: Some(DriveConfig {
                credentials_file: Some(key_path),
                ..Default::default()
            }),
        };

        let from_env =
            config.resolve_credentials(DEFAULT_CREDENTIALS_ENV, Some("{\"from\":\"env\"}".into()))?;
        assert_eq!(from_env, "{\"from\":\"env\"}");

        let from_file = config.resolve_credentials(DEFAULT_CREDENTIALS_ENV, None)?;
        assert_eq!(from_file, "{\"from\":\"file\"}");
        Ok(())
    }

    #[test]
    fn test_from_env_unset_is_config_error() {
        let result = ClientConfig::from_env("DRIVE_CORE_TEST_UNSET_CREDENTIALS");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let config = Config {
            drive: Some(DriveConfig {
                scopes: Some(vec!["https://www.googleapis.com/auth/drive.file".to_string()]),
                page_size: Some(10),
                upload_mime_type: Some("application/json".to_string()),
                timeout_secs: Some(5),
                ..Default::default()
            }),
        };

        let client = config.apply(ClientConfig::new("{}"));
        assert_eq!(client.scopes, ["https://www.googleapis.com/auth/drive.file"]);
        assert_eq!(client.page_size, 10);
        assert_eq!(client.upload_mime_type, "application/json");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("{}").validate().is_ok());
        assert!(matches!(
            ClientConfig::new("").validate(),
            Err(Error::Config(_))
        ));

        let mut client = ClientConfig::new("{}");
        client.page_size = MAX_PAGE_SIZE + 1;
        assert!(matches!(client.validate(), Err(Error::Config(_))));

        let mut client = ClientConfig::new("{}");
        client.scopes = vec![" ".to_string()];
        assert!(matches!(client.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let debug = format!("{:?}", ClientConfig::new("secret-json"));
        assert!(!debug.contains("secret-json"));
    }
}
