use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::*;
use drive_core::{Config, DeleteStatus, DriveManager, RemoteEntry};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "drive")]
#[command(author, version, about = "Google Drive ファイル操作ツール", long_about = None)]
struct Cli {
    /// ログを警告以上のみに絞る
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// フォルダを作成
    Mkdir {
        /// フォルダ名
        name: String,

        /// 親フォルダ ID（省略時は設定の default_parent）
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// ファイルをアップロード
    Upload {
        /// アップロードするローカルファイル
        path: PathBuf,

        /// 親フォルダ ID（省略時は設定の default_parent）
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// ファイル一覧を表示
    Ls {
        /// フォルダ ID（省略時は設定の default_parent）
        #[arg(short, long)]
        parent: Option<String>,

        /// すべてのページを取得
        #[arg(short, long)]
        all: bool,
    },

    /// ファイルまたはフォルダを削除
    Rm {
        /// 削除するエントリの ID
        id: String,

        /// インタラクティブモード（削除前に確認）
        #[arg(short, long)]
        interactive: bool,
    },

    /// 設定ファイルの管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// シェル補完スクリプトを出力
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 現在の設定を表示
    Show,
    /// デフォルト設定ファイルを作成
    Init,
    /// 設定ファイルのパスを表示
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Mkdir { name, parent } => mkdir(&name, parent)?,
        Commands::Upload { path, parent } => upload(&path, parent)?,
        Commands::Ls { parent, all } => ls(parent, all)?,
        Commands::Rm { id, interactive } => rm(&id, interactive)?,
        Commands::Config { action } => config(action)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "drive", &mut io::stdout());
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// 設定と環境変数からクライアントを作成
fn connect() -> Result<(Config, DriveManager)> {
    let config = Config::load()?;
    let client_config = config
        .client_config()
        .context("認証情報を読み込めませんでした")?;
    let manager = DriveManager::new(client_config)?;
    Ok((config, manager))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

fn resolve_parent(parent: Option<String>, config: &Config) -> Option<String> {
    parent.or_else(|| config.default_parent().map(str::to_string))
}

fn mkdir(name: &str, parent: Option<String>) -> Result<()> {
    let (config, drive) = connect()?;
    let parent = resolve_parent(parent, &config);

    let spinner = spinner(&format!("フォルダ '{}' を作成中...", name));
    let id = drive.create_folder(name, parent.as_deref())?;
    spinner.finish_and_clear();

    println!(
        "{} フォルダ '{}' を作成しました (ID: {})",
        "✅".green(),
        name.bright_blue(),
        id.yellow().bold()
    );
    Ok(())
}

fn upload(path: &PathBuf, parent: Option<String>) -> Result<()> {
    let (config, drive) = connect()?;
    let parent = resolve_parent(parent, &config);

    let spinner = spinner(&format!("{} をアップロード中...", path.display()));
    let result = drive.upload_file(path, parent.as_deref());
    spinner.finish_and_clear();

    let id = result?;
    println!(
        "{} {} をアップロードしました (ID: {})",
        "✅".green(),
        path.display().to_string().bright_blue(),
        id.yellow().bold()
    );
    Ok(())
}

fn ls(parent: Option<String>, all: bool) -> Result<()> {
    let (config, drive) = connect()?;
    let parent = resolve_parent(parent, &config);

    let spinner = spinner("ファイル一覧を取得中...");
    let result = if all {
        drive.list_all_files(parent.as_deref())
    } else {
        drive.list_files(parent.as_deref())
    };
    spinner.finish_and_clear();

    let files = result?;
    if files.is_empty() {
        println!("{}", "✨ ファイルが見つかりませんでした".green());
        return Ok(());
    }

    println!(
        "\n{} 件のエントリ\n",
        files.len().to_string().yellow().bold()
    );
    for (i, file) in files.iter().enumerate() {
        print_entry(i + 1, file);
    }

    Ok(())
}

fn print_entry(index: usize, entry: &RemoteEntry) {
    let icon = if entry.is_folder() { "📁" } else { "📄" };
    println!(
        "  {}. {} {} - {} {}",
        index.to_string().dimmed(),
        icon,
        entry.name.bright_blue(),
        entry.id.yellow(),
        format!("({})", entry.mime_type).dimmed()
    );
}

fn rm(id: &str, interactive: bool) -> Result<()> {
    rm_with_input(&mut io::stdin().lock(), id, interactive)
}

fn rm_with_input(input: &mut impl BufRead, id: &str, interactive: bool) -> Result<()> {
    // 確認を先に行い、キャンセル時は認証も通信もしない
    if interactive && !confirm_delete(input, id)? {
        println!("{}", "キャンセルされました".yellow());
        return Ok(());
    }

    let (_, drive) = connect()?;

    match drive.delete_file(id) {
        DeleteStatus::Deleted => {
            println!("{} {} を削除しました", "✅".green(), id.bright_blue());
        }
        DeleteStatus::Failed(message) => {
            println!(
                "{} {} を削除できませんでした: {}",
                "❌".red(),
                id.bright_blue(),
                message.red()
            );
        }
    }

    Ok(())
}

fn confirm_delete(input: &mut impl BufRead, id: &str) -> Result<bool> {
    print!(
        "\n{} {} を本当に削除しますか? (y/N): ",
        "⚠".yellow().bold(),
        id.bright_blue()
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn config(action: ConfigAction) -> Result<()> {
    let path = Config::config_path()?;

    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            if !path.exists() {
                println!(
                    "{} {}",
                    "ℹ".cyan(),
                    "設定ファイルがありません（デフォルト値を使用）".dimmed()
                );
                return Ok(());
            }
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            if path.exists() {
                println!(
                    "{} 設定ファイルは既に存在します: {}",
                    "ℹ".cyan(),
                    path.display()
                );
                return Ok(());
            }
            Config::with_defaults().save()?;
            println!(
                "{} 設定ファイルを作成しました: {}",
                "✅".green(),
                path.display().to_string().bright_blue()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload_with_parent() {
        let cli = Cli::try_parse_from(["drive", "upload", "data.csv", "--parent", "P"]).unwrap();
        match cli.command {
            Commands::Upload { path, parent } => {
                assert_eq!(path, PathBuf::from("data.csv"));
                assert_eq!(parent.as_deref(), Some("P"));
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_resolve_parent_prefers_argument() {
        let config: Config = toml::from_str("[drive]\ndefault_parent = \"fallback\"\n").unwrap();
        assert_eq!(
            resolve_parent(Some("explicit".to_string()), &config).as_deref(),
            Some("explicit")
        );
        assert_eq!(resolve_parent(None, &config).as_deref(), Some("fallback"));
        assert_eq!(resolve_parent(None, &Config::default()), None);
    }

    #[test]
    fn test_confirm_delete_answers() {
        assert!(confirm_delete(&mut io::Cursor::new("y\n"), "abc").unwrap());
        assert!(confirm_delete(&mut io::Cursor::new("Y\n"), "abc").unwrap());
        assert!(!confirm_delete(&mut io::Cursor::new("n\n"), "abc").unwrap());
        assert!(!confirm_delete(&mut io::Cursor::new(""), "abc").unwrap());
    }

    #[test]
    fn test_rm_declined_does_not_connect() {
        // 認証情報がなくても、キャンセル時は接続前に終了する
        let mut input = io::Cursor::new("n\n");
        assert!(rm_with_input(&mut input, "abc", true).is_ok());
    }
}
