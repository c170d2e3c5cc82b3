use serde::{Deserialize, Serialize};

/// フォルダを表す MIME タイプ
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// リモートのファイルまたはフォルダ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    /// サーバーが割り当てた ID
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// 親フォルダの ID（この API の使い方では 0 または 1 件）
    #[serde(default)]
    pub parents: Vec<String>,
}

impl RemoteEntry {
    /// フォルダかどうか
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// 作成リクエストのメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub parents: Vec<String>,
}

impl NewEntry {
    /// フォルダ作成用のメタデータ
    pub fn folder(name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: parents_of(parent_id),
        }
    }

    /// ファイル作成用のメタデータ（MIME タイプはメディア側で指定）
    pub fn file(name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            parents: parents_of(parent_id),
        }
    }
}

fn parents_of(parent_id: Option<&str>) -> Vec<String> {
    parent_id.map(|id| vec![id.to_string()]).unwrap_or_default()
}

/// アップロードするメディア本体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub mime_type: String,
    pub body: Vec<u8>,
}

/// 一覧取得リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub parent_id: Option<String>,
    pub page_size: u32,
    pub page_token: Option<String>,
}

impl ListRequest {
    pub fn new(parent_id: Option<&str>, page_size: u32) -> Self {
        Self {
            parent_id: parent_id.map(str::to_string),
            page_size,
            page_token: None,
        }
    }

    /// 次ページ用のリクエストを作成
    pub fn with_page_token(&self, token: impl Into<String>) -> Self {
        Self {
            page_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Drive の検索クエリ (`q`) を構築
    pub fn query(&self) -> String {
        match &self.parent_id {
            Some(parent) => format!("'{}' in parents and trashed=false", escape_query(parent)),
            None => "trashed=false".to_string(),
        }
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// 一覧取得の 1 ページ分の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<RemoteEntry>,
    pub next_page_token: Option<String>,
}

/// 削除操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    Failed(String),
}

impl DeleteStatus {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteStatus::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_without_parent() {
        let request = ListRequest::new(None, 100);
        assert_eq!(request.query(), "trashed=false");
    }

    #[test]
    fn test_query_with_parent() {
        let request = ListRequest::new(Some("abc123"), 100);
        assert_eq!(request.query(), "'abc123' in parents and trashed=false");
    }

    #[test]
    fn test_query_escapes_quotes() {
        let request = ListRequest::new(Some("it's\\odd"), 100);
        assert_eq!(
            request.query(),
            "'it\\'s\\\\odd' in parents and trashed=false"
        );
    }

    #[test]
    fn test_folder_metadata_serialization() {
        let root = serde_json::to_value(NewEntry::folder("X", None)).unwrap();
        assert_eq!(root["mimeType"], FOLDER_MIME_TYPE);
        assert_eq!(root["parents"], serde_json::json!([]));

        let file = serde_json::to_value(NewEntry::file("data.csv", Some("P"))).unwrap();
        assert!(file.get("mimeType").is_none());
        assert_eq!(file["parents"], serde_json::json!(["P"]));
    }

    #[test]
    fn test_file_list_defaults() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());

        let list: FileList = serde_json::from_str(
            r#"{"nextPageToken":"t1","files":[{"id":"1","name":"a","mimeType":"application/vnd.google-apps.folder"}]}"#,
        )
        .unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("t1"));
        assert!(list.files[0].is_folder());
        assert!(list.files[0].parents.is_empty());
    }
}
