//! docker compose への委譲

use crate::error::{Result, RuntimeError};
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// `docker compose up --build` を実行し、終了コードを返す
///
/// 入出力はそのまま端末へ引き継ぎます。シグナルで終了した場合は 1 を返します。
pub async fn run_compose(workspace_root: &Path) -> Result<i32> {
    println!("{}", "🛳  docker compose up --build を実行します...".blue());
    info!(workspace_root = %workspace_root.display(), "Delegating to docker compose");

    let status = Command::new("docker")
        .args(["compose", "up", "--build"])
        .current_dir(workspace_root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(RuntimeError::ComposeLaunch)?;

    Ok(status.code().unwrap_or(1))
}
