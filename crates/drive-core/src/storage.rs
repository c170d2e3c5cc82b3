use crate::models::{FileList, ListRequest, Media, NewEntry, RemoteEntry};
use crate::Result;

/// リモートストレージ API の共通インターフェース
///
/// 各メソッドはリモートへのリクエスト 1 回に対応する。
pub trait DriveBackend {
    /// エントリを作成（`media` があればファイル本体も送信）
    fn create(&self, entry: &NewEntry, media: Option<&Media>) -> Result<RemoteEntry>;

    /// 1 ページ分のエントリ一覧を取得
    fn list(&self, request: &ListRequest) -> Result<FileList>;

    /// エントリを削除
    fn delete(&self, file_id: &str) -> Result<()>;
}
