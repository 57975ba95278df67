//! ローカルプロセススーパーバイザー
//!
//! ローカル起動できるサービス（node / frontend）を子プロセスとして起動し、
//! 出力の転送、起動待機、終了監視、Ctrl+C 時の SIGINT 送信を担当します。
//! 再起動は行いません。

mod output;
mod package_manager;
mod plan;
mod process;

pub use output::{PALETTE, color_for, label};
pub use package_manager::PackageManager;
pub use plan::{LaunchPlan, LaunchScript, MANIFEST_FILENAME, SkipReason, plan_service};
pub use process::{ManagedProcess, OUTPUT_DRAIN_GRACE, ProcessExit, ProcessSignal};

use crate::error::Result;
use crate::probe::{HealthProber, ProbeConfig};
use crate::waiter::{ReadinessConfig, wait_for_ready};
use colored::Colorize;
use futures_util::future::join_all;
use polyglot_core::Workspace;
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// CI 環境を示す環境変数
pub const CI_ENV: &str = "CI";

/// スーパーバイザーの設定
#[derive(Debug, Clone, Default)]
pub struct SupervisorConfig {
    pub readiness: ReadinessConfig,
    pub probe: ProbeConfig,
    /// 起動対象がないとき中断を待たずに戻る
    pub ci: bool,
}

impl SupervisorConfig {
    /// 環境変数 CI=true を反映した設定
    pub fn from_env() -> Self {
        Self {
            ci: std::env::var(CI_ENV).is_ok_and(|v| v == "true"),
            ..Default::default()
        }
    }
}

/// 1 回の実行結果
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 起動できた子プロセス数
    pub started: usize,
    /// 起動しなかったサービスと理由
    pub skipped: Vec<(String, SkipReason)>,
    /// 起動に失敗したサービス
    pub failed: Vec<String>,
    /// 起動待機の結果（完了順）
    pub readiness: Vec<ReadinessReport>,
    /// 中断シグナルで終了したか
    pub interrupted: bool,
}

/// 1 サービスの起動待機結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub name: String,
    pub url: String,
    pub ready: bool,
}

impl ReadinessReport {
    /// `✔ health OK <name> <url>` / `⚠ health timeout <name> <url>`
    pub fn message(&self) -> String {
        let outcome = if self.ready {
            "✔ health OK"
        } else {
            "⚠ health timeout"
        };
        format!("{} {} {}", outcome, self.name, self.url)
    }

    fn print(&self) {
        if self.ready {
            println!("{}", self.message().green());
        } else {
            println!("{}", self.message().yellow());
        }
    }
}

/// Supervisor - `dev` コマンドの実行コンテキスト
pub struct Supervisor {
    workspace: Workspace,
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(workspace: Workspace, config: SupervisorConfig) -> Self {
        Self { workspace, config }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// 全サービスの起動計画を立てる（宣言順）
    pub async fn plan(&self) -> (Vec<LaunchPlan>, Vec<(String, SkipReason)>) {
        let mut plans = Vec::new();
        let mut skipped = Vec::new();

        for service in &self.workspace.services {
            match plan_service(&self.workspace, service).await {
                Ok(plan) => plans.push(plan),
                Err(reason) => skipped.push((service.name.clone(), reason)),
            }
        }

        (plans, skipped)
    }

    /// サービスを起動し、全子プロセスの終了または `shutdown` の完了まで監視する
    ///
    /// 起動可能なサービスがない場合、CI では即座に、それ以外では `shutdown` を待って戻ります。
    pub async fn run<F>(&self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        println!(
            "{}",
            format!("🚀 {} のサービスをローカル起動します...", self.workspace.name)
                .cyan()
                .bold()
        );

        let services_dir = self.workspace.services_dir();
        if !services_dir.is_dir() {
            println!(
                "{}",
                "⚠️  services/ directory not found (services/ ディレクトリがありません)".yellow()
            );
        }

        let (plans, skipped) = self.plan().await;
        for (name, reason) in &skipped {
            if reason.is_silent() {
                debug!(service = %name, reason = %reason, "Service is not run locally");
            } else {
                println!("{}", format!("Skipping {} ({})", name, reason).yellow());
            }
        }

        let mut summary = RunSummary {
            skipped,
            ..Default::default()
        };

        if plans.is_empty() {
            println!(
                "{}",
                "No auto-runnable Node/Frontend services found.".yellow()
            );
            println!(
                "  {} polyglot dev --docker で全サービスを docker compose から起動できます",
                "ヒント:".dimmed()
            );
            if !self.config.ci {
                println!("{}", "Ctrl+C で終了します".dimmed());
                shutdown.await;
                summary.interrupted = true;
            }
            return Ok(summary);
        }

        let prober = HealthProber::new(self.config.probe.clone())?;
        let mut signals = Vec::new();
        let mut exits = Vec::new();
        let mut readiness = JoinSet::new();

        for plan in &plans {
            let name = &plan.service.name;
            if plan.is_fallback() {
                println!("{} running start instead of dev", label(name));
            }

            let process = match ManagedProcess::spawn(plan) {
                Ok(process) => process,
                Err(e) => {
                    eprintln!("{} {}", "✖".red(), e);
                    summary.failed.push(name.clone());
                    continue;
                }
            };
            info!(
                service = %name,
                command = %plan.command_line(),
                port = plan.service.port,
                "Started service"
            );
            println!(
                "{} {} {}",
                label(name),
                plan.command_line().dimmed(),
                format!("(PORT={})", plan.service.port).dimmed()
            );

            let (signal, exit) = process.into_parts();
            signals.push(signal);
            exits.push(exit);

            let prober = prober.clone();
            let service = plan.service.clone();
            let config = self.config.readiness.clone();
            readiness.spawn(async move {
                let report = ReadinessReport {
                    url: prober.url_for(&service, &config.path),
                    ready: wait_for_ready(&prober, &service, &config).await,
                    name: service.name,
                };
                report.print();
                report
            });
        }

        summary.started = exits.len();
        if exits.is_empty() {
            warn!("No service could be started");
            return Ok(summary);
        }

        // 起動待機はどれも他のサービスをブロックしない
        let all_ready = async {
            let mut reports = Vec::new();
            while let Some(result) = readiness.join_next().await {
                match result {
                    Ok(report) => reports.push(report),
                    Err(e) => warn!(error = %e, "Readiness task failed"),
                }
            }
            reports
        };
        tokio::select! {
            reports = all_ready => summary.readiness = reports,
            _ = &mut shutdown => {
                interrupt_all(&signals);
                summary.interrupted = true;
                return Ok(summary);
            }
        }

        println!("{}", "Watching services. Press Ctrl+C to exit.".blue());

        tokio::select! {
            results = join_all(exits) => {
                let exited = results.iter().filter(|r| r.is_ok()).count();
                debug!(exited, "All child processes exited");
            }
            _ = &mut shutdown => {
                interrupt_all(&signals);
                summary.interrupted = true;
            }
        }

        Ok(summary)
    }
}

fn interrupt_all(signals: &[ProcessSignal]) {
    println!();
    println!("{}", "🛑 子プロセスに SIGINT を送信します...".yellow());
    for signal in signals {
        signal.interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ServiceSnapshot, ServiceStatus};
    use crate::status::snapshot;
    use crate::test_support::{closed_port, serve_status};
    use polyglot_core::{ServiceDescriptor, ServiceType};
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tokio::sync::oneshot;

    fn workspace(root: &Path, services: Vec<ServiceDescriptor>) -> Workspace {
        Workspace {
            name: "demo".to_string(),
            root: root.to_path_buf(),
            services,
        }
    }

    fn write_manifest(root: &Path, name: &str, content: &str) {
        let dir = root.join("services").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILENAME), content).unwrap();
    }

    #[tokio::test]
    async fn test_plan_keeps_declaration_order() {
        let temp = tempfile::tempdir().unwrap();
        write_manifest(temp.path(), "web", r#"{ "scripts": { "dev": "vite" } }"#);
        write_manifest(temp.path(), "api", r#"{ "scripts": { "start": "node ." } }"#);
        write_manifest(temp.path(), "broken", "not json");
        let ws = workspace(
            temp.path(),
            vec![
                ServiceDescriptor::new("web", ServiceType::Frontend, 3000),
                ServiceDescriptor::new("ml", ServiceType::Python, 3004),
                ServiceDescriptor::new("api", ServiceType::Node, 3001),
                ServiceDescriptor::new("broken", ServiceType::Node, 3002),
            ],
        );

        let (plans, skipped) = Supervisor::new(ws, SupervisorConfig::default())
            .plan()
            .await;

        let planned: Vec<_> = plans.iter().map(|p| p.service.name.as_str()).collect();
        assert_eq!(planned, ["web", "api"]);
        assert_eq!(plans[1].script, LaunchScript::Start);

        let skipped_names: Vec<_> = skipped.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(skipped_names, ["ml", "broken"]);
    }

    fn ci_config() -> SupervisorConfig {
        SupervisorConfig {
            ci: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_without_eligible_services_returns_immediately_in_ci() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("services/ml")).unwrap();
        let ws = workspace(
            temp.path(),
            vec![ServiceDescriptor::new("ml", ServiceType::Python, 3004)],
        );

        let started = Instant::now();
        let summary = Supervisor::new(ws, ci_config())
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.started, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert!(!summary.interrupted);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_without_eligible_services_waits_for_interrupt() {
        let temp = tempfile::tempdir().unwrap();
        let ws = workspace(temp.path(), vec![]);

        let summary = Supervisor::new(ws, SupervisorConfig::default())
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(summary.started, 0);
        assert!(summary.interrupted);
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_var(CI_ENV, Some("true"), || {
            assert!(SupervisorConfig::from_env().ci);
        });
        temp_env::with_var(CI_ENV, Some("1"), || {
            assert!(!SupervisorConfig::from_env().ci);
        });
        temp_env::with_var_unset(CI_ENV, || {
            assert!(!SupervisorConfig::from_env().ci);
        });
    }

    #[tokio::test]
    async fn test_run_without_services_dir() {
        let temp = tempfile::tempdir().unwrap();
        let ws = workspace(
            temp.path(),
            vec![ServiceDescriptor::new("api", ServiceType::Node, 3001)],
        );

        let summary = Supervisor::new(ws, ci_config())
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.started, 0);
        assert!(matches!(
            summary.skipped[0].1,
            SkipReason::MissingDirectory(_)
        ));
    }

    fn local_probe() -> ProbeConfig {
        ProbeConfig::default()
            .with_host("127.0.0.1")
            .with_timeout(Duration::from_millis(500))
    }

    /// `hold` 経過後にスナップショットを取り、それを中断の合図にして監視する
    async fn run_and_snapshot(
        ws: Workspace,
        config: SupervisorConfig,
        hold: Duration,
    ) -> (RunSummary, Vec<ServiceSnapshot>) {
        let prober = HealthProber::new(config.probe.clone()).unwrap();
        let services = ws.services.clone();
        let (tx, rx) = oneshot::channel();
        let shutdown = async move {
            tokio::time::sleep(hold).await;
            let _ = tx.send(snapshot(&prober, &services).await);
        };

        let summary = Supervisor::new(ws, config).run(shutdown).await.unwrap();
        (summary, rx.await.unwrap())
    }

    #[test]
    fn test_readiness_message() {
        let mut report = ReadinessReport {
            name: "api".to_string(),
            url: "http://127.0.0.1:3001/health".to_string(),
            ready: true,
        };
        assert_eq!(report.message(), "✔ health OK api http://127.0.0.1:3001/health");

        report.ready = false;
        assert_eq!(report.message(), "⚠ health timeout api http://127.0.0.1:3001/health");
    }

    /// start スクリプトのみのサービスが起動し、/health 応答後に up と判定される
    #[cfg(unix)]
    #[test]
    fn test_start_only_service_becomes_ready_and_up() {
        use crate::test_support::{fake_program, path_with};

        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        fake_program(&bin, "npm", "exec sleep 30");
        write_manifest(temp.path(), "api", r#"{ "scripts": { "start": "node ." } }"#);

        temp_env::with_var("PATH", Some(path_with(&bin)), || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let port = serve_status(200).await;
                let ws = workspace(
                    temp.path(),
                    vec![ServiceDescriptor::new("api", ServiceType::Node, port)],
                );
                let config = SupervisorConfig {
                    probe: local_probe(),
                    ..Default::default()
                };

                let (summary, snapshots) =
                    run_and_snapshot(ws, config, Duration::from_millis(1500)).await;

                assert_eq!(summary.started, 1);
                assert!(summary.failed.is_empty());
                assert!(summary.interrupted);
                assert_eq!(summary.readiness.len(), 1);
                assert!(summary.readiness[0].ready);
                assert!(summary.readiness[0].message().starts_with("✔ health OK api "));
                assert!(summary.readiness[0].url.ends_with("/health"));

                assert_eq!(snapshots[0].state.status, ServiceStatus::Up);
            });
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_readiness_timeout_is_reported() {
        use crate::test_support::{fake_program, path_with};

        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        fake_program(&bin, "npm", "exit 0");
        write_manifest(temp.path(), "web", r#"{ "scripts": { "dev": "vite" } }"#);

        temp_env::with_var("PATH", Some(path_with(&bin)), || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let ws = workspace(
                    temp.path(),
                    vec![ServiceDescriptor::new("web", ServiceType::Frontend, closed_port())],
                );
                let config = SupervisorConfig {
                    readiness: ReadinessConfig {
                        timeout: Duration::from_millis(300),
                        interval: Duration::from_millis(50),
                        ..Default::default()
                    },
                    probe: local_probe(),
                    ci: true,
                };

                let summary = Supervisor::new(ws, config)
                    .run(std::future::pending())
                    .await
                    .unwrap();

                assert_eq!(summary.started, 1);
                assert!(!summary.interrupted);
                assert_eq!(summary.readiness.len(), 1);
                assert!(!summary.readiness[0].ready);
                assert!(summary.readiness[0].message().starts_with("⚠ health timeout web "));
            });
        });
    }

    #[tokio::test]
    #[ignore = "Requires node and npm"]
    async fn test_node_service_end_to_end() {
        let temp = tempfile::tempdir().unwrap();
        let port = closed_port();
        write_manifest(
            temp.path(),
            "api",
            r#"{ "scripts": { "dev": "node server.js" } }"#,
        );
        fs::write(
            temp.path().join("services/api/server.js"),
            r#"require('http').createServer((q, s) => s.end('ok')).listen(process.env.PORT);"#,
        )
        .unwrap();
        let ws = workspace(
            temp.path(),
            vec![ServiceDescriptor::new("api", ServiceType::Node, port)],
        );
        let config = SupervisorConfig {
            readiness: ReadinessConfig {
                timeout: Duration::from_secs(20),
                ..Default::default()
            },
            probe: local_probe(),
            ci: false,
        };

        let (summary, snapshots) = run_and_snapshot(ws, config, Duration::from_secs(10)).await;

        assert_eq!(summary.started, 1);
        assert!(summary.interrupted);
        assert_eq!(summary.readiness.len(), 1);
        assert!(summary.readiness[0].message().starts_with("✔ health OK api "));
        assert_eq!(snapshots[0].state.status, ServiceStatus::Up);
    }
}
