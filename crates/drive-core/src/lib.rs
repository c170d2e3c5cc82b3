//! Google Drive のファイル API を薄くラップするクライアント
//!
//! サービスアカウントで認証し、フォルダ作成・アップロード・一覧取得・削除を提供する。
//!
//! ```no_run
//! use drive_core::{ClientConfig, DriveManager};
//!
//! # fn example() -> drive_core::Result<()> {
//! let config = ClientConfig::from_env("SECRET_SERVICE_ACCOUNT")?;
//! let drive = DriveManager::new(config)?;
//!
//! let folder_id = drive.create_folder("reports", None)?;
//! drive.upload_file("report.csv", Some(folder_id.as_str()))?;
//! for entry in drive.list_files(Some(folder_id.as_str()))? {
//!     println!("{} ({})", entry.name, entry.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod drive;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod utils;

pub use client::DriveManager;
pub use config::{ClientConfig, Config};
pub use error::{Error, Result};
pub use models::{DeleteStatus, RemoteEntry};
pub use storage::DriveBackend;
