use crate::utils;
use colored::Colorize;
use polyglot_core::Workspace;
use polyglot_dashboard::{DashboardConfig, DashboardServer, open_browser};
use std::time::Duration;

pub async fn handle(
    workspace: &Workspace,
    port: u16,
    refresh_ms: u64,
    open: bool,
) -> anyhow::Result<()> {
    let config = DashboardConfig {
        port,
        refresh: Duration::from_millis(refresh_ms),
        ..Default::default()
    };
    let server = DashboardServer::new(workspace, config)?;
    let url = server.url();

    println!("{}", "🚀 Admin Dashboard を起動中...".cyan());
    println!(
        "{}",
        format!("   Monitoring {} services", server.service_count()).dimmed()
    );
    println!("{}", format!("   Dashboard URL: {}", url).dimmed());
    println!(
        "{}",
        format!("   Refresh interval: {}s", refresh_ms as f64 / 1000.0).dimmed()
    );
    println!("{}", "   Ctrl+C で停止します".yellow());
    println!();

    let listener = server.bind().await?;
    println!(
        "{}",
        format!("✅ Admin Dashboard running at {}", url).green()
    );

    if open {
        open_browser(&url);
    }

    server.serve(listener, utils::ctrl_c()).await?;

    println!();
    println!("{}", "🛑 Admin Dashboard を停止しました".yellow());
    Ok(())
}
