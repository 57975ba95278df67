use colored::Colorize;
use polyglot_core::WorkspaceError;

/// ワークスペース読み込みエラーを表示
pub fn print_workspace_error(error: &WorkspaceError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    if error.is_not_found() {
        eprintln!();
        eprintln!(
            "{}",
            "polyglot.json not found. Run inside a generated workspace.".yellow()
        );
        eprintln!("  POLYGLOT_WORKSPACE_ROOT=<dir> polyglot <command> でルートを指定することもできます");
    }
}

/// Ctrl+C を待つ future
///
/// コマンドごとに 1 つ作り、実行コンテキストへ渡します。
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
