use colored::Colorize;
use polyglot_core::Workspace;
use polyglot_runtime::{HealthProber, ProbeConfig, ServiceSnapshot, tcp_snapshot};
use serde::Serialize;
use std::time::Duration;

/// 一覧表示時の TCP 接続タイムアウト
const LIVENESS_TIMEOUT: Duration = Duration::from_millis(350);

/// `services --json` の 1 要素
#[derive(Debug, Serialize)]
struct ServiceRow<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    service_type: &'a str,
    port: u16,
    up: bool,
    path: &'a str,
}

impl<'a> From<&'a ServiceSnapshot> for ServiceRow<'a> {
    fn from(snapshot: &'a ServiceSnapshot) -> Self {
        Self {
            name: &snapshot.service.name,
            service_type: snapshot.service.service_type.as_str(),
            port: snapshot.service.port,
            up: snapshot.state.is_up(),
            path: &snapshot.service.path,
        }
    }
}

pub async fn handle(workspace: &Workspace, json: bool) -> anyhow::Result<()> {
    let prober = HealthProber::new(ProbeConfig::default().with_timeout(LIVENESS_TIMEOUT))?;
    let snapshots = tcp_snapshot(&prober, &workspace.services).await;
    let rows: Vec<ServiceRow> = snapshots.iter().map(ServiceRow::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "サービスが登録されていません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<20} {:<10} {:<7} {:<7} {}",
            "NAME", "TYPE", "PORT", "STATUS", "PATH"
        )
        .bold()
    );
    println!("{}", "─".repeat(70).dimmed());

    for row in &rows {
        let status = if row.up {
            format!("{:<7}", "up").green()
        } else {
            format!("{:<7}", "down").red()
        };
        println!(
            "{:<20} {:<10} {:<7} {} {}",
            row.name.cyan(),
            row.service_type,
            row.port,
            status,
            row.path.dimmed()
        );
    }

    Ok(())
}
