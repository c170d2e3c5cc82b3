use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{error, info, warn};

use crate::config::{ClientConfig, DEFAULT_PAGE_SIZE, DEFAULT_UPLOAD_MIME_TYPE, MAX_PAGE_SIZE};
use crate::drive::HttpDrive;
use crate::models::{DeleteStatus, ListRequest, Media, NewEntry, RemoteEntry};
use crate::storage::DriveBackend;
use crate::{utils, Error, Result};

/// Drive 操作のファサード
///
/// 各操作はリモートへのリクエスト 1 回で完結し、リトライは行わない。
pub struct DriveManager<B = HttpDrive> {
    backend: B,
    page_size: u32,
    upload_mime_type: String,
}

impl DriveManager<HttpDrive> {
    /// サービスアカウントの認証情報からクライアントを作成
    pub fn new(config: ClientConfig) -> Result<Self> {
        info!("Initializing drive client...");
        let backend = HttpDrive::new(&config)?;
        info!(
            "Drive client initialized for {}",
            backend.session().client_email()
        );

        Ok(Self::with_backend(backend)
            .page_size(config.page_size)
            .upload_mime_type(config.upload_mime_type))
    }
}

impl<B: DriveBackend> DriveManager<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            page_size: DEFAULT_PAGE_SIZE,
            upload_mime_type: DEFAULT_UPLOAD_MIME_TYPE.to_string(),
        }
    }

    /// 1 ページの件数（1〜1000 に丸める）
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn upload_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.upload_mime_type = mime_type.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// フォルダを作成して ID を返す
    ///
    /// 同名フォルダの重複チェックは行わない。
    pub fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String> {
        info!("Creating folder '{}'...", name);

        let created = self.backend.create(&NewEntry::folder(name, parent_id), None)?;

        info!("Folder '{}' created with ID: {}", name, created.id);
        Ok(created.id)
    }

    /// ローカルファイルをアップロードして ID を返す
    pub fn upload_file(&self, local_path: impl AsRef<Path>, parent_id: Option<&str>) -> Result<String> {
        let local_path = local_path.as_ref();
        info!("Uploading file '{}'...", local_path.display());

        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidPath(local_path.display().to_string()))?;

        let body = fs::read(local_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(local_path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        info!(
            "Preparing upload of '{}' ({}, {})",
            name,
            utils::format_size(body.len() as u64),
            self.upload_mime_type
        );
        let media = Media {
            mime_type: self.upload_mime_type.clone(),
            body,
        };

        let uploaded = self
            .backend
            .create(&NewEntry::file(name.as_str(), parent_id), Some(&media))?;

        info!("File '{}' uploaded with ID: {}", name, uploaded.id);
        Ok(uploaded.id)
    }

    /// ゴミ箱以外のエントリを 1 ページ分取得
    pub fn list_files(&self, parent_id: Option<&str>) -> Result<Vec<RemoteEntry>> {
        info!("Listing files...");

        let page = self
            .backend
            .list(&ListRequest::new(parent_id, self.page_size))?;

        log_entries(&page.files);
        Ok(page.files)
    }

    /// 継続トークンをたどって全ページを取得
    pub fn list_all_files(&self, parent_id: Option<&str>) -> Result<Vec<RemoteEntry>> {
        info!("Listing all files...");

        let first = ListRequest::new(parent_id, self.page_size);
        let mut request = first.clone();
        let mut files = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self.backend.list(&request)?;
            pages += 1;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => {
                    request = first.with_page_token(token)
                }
                Some(token) => {
                    warn!("Page token '{}' repeated, stopping pagination", token);
                    break;
                }
                None => break,
            }
        }

        info!("Fetched {} page(s)", pages);
        log_entries(&files);
        Ok(files)
    }

    /// ファイルまたはフォルダを削除
    ///
    /// 失敗してもエラーは返さず、ログに記録して `DeleteStatus::Failed` を返す。
    pub fn delete_file(&self, file_id: &str) -> DeleteStatus {
        info!("Deleting file/folder with ID: {}...", file_id);

        match self.backend.delete(file_id) {
            Ok(()) => {
                info!("Successfully deleted file/folder with ID: {}", file_id);
                DeleteStatus::Deleted
            }
            Err(e) => {
                error!(
                    "Failed to delete file/folder with ID: {}. Error: {}",
                    file_id, e
                );
                DeleteStatus::Failed(e.to_string())
            }
        }
    }
}

fn log_entries(files: &[RemoteEntry]) {
    if files.is_empty() {
        info!("No files found.");
        return;
    }

    info!("Files retrieved:");
    for file in files {
        info!(
            "  - Name: {}, ID: {}, Type: {}",
            file.name, file.id, file.mime_type
        );
    }
}
