use reqwest::blocking::{Client, Request, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::credentials::ServiceAccountKey;
use crate::models::{FileList, ListRequest, Media, NewEntry, RemoteEntry};
use crate::session::{Session, TokenSource};
use crate::storage::DriveBackend;
use crate::{Error, Result};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, parents)";

/// Google Drive v3 API の HTTP クライアント
pub struct HttpDrive<T = Session> {
    http: Client,
    tokens: T,
    files_url: String,
    upload_url: String,
}

impl HttpDrive<Session> {
    /// 設定からセッションを構築（ここでは通信しない）
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let key = ServiceAccountKey::from_json(&config.credentials_json)?;
        let session = Session::new(key, config.scopes.clone())?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_token_source(http, session))
    }

    pub fn session(&self) -> &Session {
        &self.tokens
    }
}

impl<T: TokenSource> HttpDrive<T> {
    pub fn with_token_source(http: Client, tokens: T) -> Self {
        Self {
            http,
            tokens,
            files_url: FILES_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
        }
    }

    /// API のエンドポイントを差し替える
    pub fn endpoints(mut self, files_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        self.files_url = files_url.into();
        self.upload_url = upload_url.into();
        self
    }

    fn create_request(&self, entry: &NewEntry, media: Option<&Media>) -> Result<Request> {
        let token = self.tokens.access_token()?;

        let builder = match media {
            Some(media) => {
                let boundary = Uuid::new_v4().simple().to_string();
                let metadata = serde_json::to_vec(entry)?;
                debug!(
                    "Multipart upload of {} bytes as {}",
                    media.body.len(),
                    media.mime_type
                );
                self.http
                    .post(&self.upload_url)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/related; boundary={}", boundary),
                    )
                    .body(multipart_related(&metadata, media, &boundary))
            }
            None => self
                .http
                .post(&self.files_url)
                .query(&[("fields", "id")])
                .json(entry),
        };

        Ok(builder.bearer_auth(token).build()?)
    }

    fn list_request(&self, request: &ListRequest) -> Result<Request> {
        let token = self.tokens.access_token()?;

        let mut params = vec![
            ("q", request.query()),
            ("pageSize", request.page_size.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(page_token) = &request.page_token {
            params.push(("pageToken", page_token.clone()));
        }

        Ok(self
            .http
            .get(&self.files_url)
            .query(&params)
            .bearer_auth(token)
            .build()?)
    }

    fn delete_request(&self, file_id: &str) -> Result<Request> {
        let url = entry_url(&self.files_url, file_id)?;
        let token = self.tokens.access_token()?;
        Ok(self.http.delete(url).bearer_auth(token).build()?)
    }

    fn send(&self, request: Request) -> Result<Response> {
        let response = self.http.execute(request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                status,
                message: api_error_message(&body),
            });
        }

        Ok(response)
    }
}

impl<T: TokenSource> DriveBackend for HttpDrive<T> {
    fn create(&self, entry: &NewEntry, media: Option<&Media>) -> Result<RemoteEntry> {
        let request = self.create_request(entry, media)?;
        Ok(self.send(request)?.json()?)
    }

    fn list(&self, request: &ListRequest) -> Result<FileList> {
        let request = self.list_request(request)?;
        Ok(self.send(request)?.json()?)
    }

    fn delete(&self, file_id: &str) -> Result<()> {
        let request = self.delete_request(file_id)?;
        self.send(request)?;
        Ok(())
    }
}

/// `files/{id}` の URL を構築（ID は 1 つのパスセグメントとしてエンコード）
fn entry_url(files_url: &str, file_id: &str) -> Result<Url> {
    if matches!(file_id, "" | "." | "..") {
        return Err(Error::InvalidId(file_id.to_string()));
    }

    let mut url = Url::parse(files_url)
        .map_err(|e| Error::Config(format!("Invalid API URL {}: {}", files_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("Invalid API URL {}", files_url)))?
        .push(file_id);
    Ok(url)
}

/// `multipart/related` 形式のリクエストボディを構築
fn multipart_related(metadata: &[u8], media: &Media, boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.body.len() + 256);

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media.mime_type).as_bytes());
    body.extend_from_slice(&media.body);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// エラーレスポンスからメッセージを取り出す
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
