mod commands;
mod utils;

use clap::{Parser, Subcommand};
use polyglot_dashboard::DEFAULT_DASHBOARD_PORT;

#[derive(Parser)]
#[command(name = "polyglot")]
#[command(about = "ポリグロットなモノレポのサービスを、ひとつのコマンドで。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// ローカル起動できるサービス（node / frontend）を起動して監視
    Dev {
        /// docker compose up --build で全サービスを起動
        #[arg(long)]
        docker: bool,
    },
    /// 管理ダッシュボードを起動
    Admin {
        /// 待ち受けポート
        #[arg(
            short,
            long,
            env = "POLYGLOT_ADMIN_PORT",
            default_value_t = DEFAULT_DASHBOARD_PORT,
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        port: u16,
        /// 自動更新の間隔（ミリ秒、1000 以上）
        #[arg(
            short,
            long,
            env = "POLYGLOT_ADMIN_REFRESH",
            default_value_t = 5000,
            value_parser = clap::value_parser!(u64).range(1000..)
        )]
        refresh: u64,
        /// ブラウザを自動で開かない
        #[arg(long)]
        no_open: bool,
    },
    /// サービス一覧と死活を表示
    Services {
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr へ（RUST_LOG 未指定時は warn）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドはワークスペース不要
    if matches!(cli.command, Commands::Version) {
        println!("polyglot {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let workspace = match polyglot_core::load_workspace() {
        Ok(workspace) => workspace,
        Err(e) => {
            utils::print_workspace_error(&e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Dev { docker } => {
            let code = commands::dev::handle(workspace, docker).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Admin {
            port,
            refresh,
            no_open,
        } => {
            commands::admin::handle(&workspace, port, refresh, !no_open).await?;
        }
        Commands::Services { json } => {
            commands::services::handle(&workspace, json).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}
