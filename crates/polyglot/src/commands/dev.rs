use crate::utils;
use colored::Colorize;
use polyglot_core::Workspace;
use polyglot_runtime::{Supervisor, SupervisorConfig, run_compose};

/// `dev` コマンド
///
/// 戻り値はプロセスの終了コード（docker compose の終了コードをそのまま返す）。
pub async fn handle(workspace: Workspace, docker: bool) -> anyhow::Result<i32> {
    if docker {
        return Ok(run_compose(workspace.root()).await?);
    }

    let supervisor = Supervisor::new(workspace, SupervisorConfig::from_env());
    let summary = supervisor.run(utils::ctrl_c()).await?;

    if summary.interrupted {
        println!("{}", "✅ 停止しました".green());
    } else if summary.started > 0 {
        println!("{}", "すべてのサービスが終了しました".dimmed());
    }

    Ok(0)
}
