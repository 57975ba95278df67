//! ダッシュボードサーバー

use crate::error::{DashboardError, Result};
use crate::html::DashboardPage;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::Local;
use colored::Colorize;
use polyglot_core::{ServiceDescriptor, Workspace};
use polyglot_runtime::{HealthProber, ProbeConfig, StatusTally, snapshot};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_DASHBOARD_PORT: u16 = 8080;
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(5000);
/// 更新間隔の下限
pub const MIN_REFRESH: Duration = Duration::from_millis(1000);

/// ダッシュボード設定
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    /// ページの自動更新とログ出力の間隔
    pub refresh: Duration,
    pub probe: ProbeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DASHBOARD_PORT,
            refresh: DEFAULT_REFRESH,
            probe: ProbeConfig::default(),
        }
    }
}

#[derive(Clone)]
struct AppState {
    services: Arc<Vec<ServiceDescriptor>>,
    prober: HealthProber,
    page: Arc<DashboardPage>,
    refresh: Duration,
}

/// DashboardServer - `admin` コマンドの実行コンテキスト
pub struct DashboardServer {
    state: AppState,
    config: DashboardConfig,
}

impl DashboardServer {
    pub fn new(workspace: &Workspace, config: DashboardConfig) -> Result<Self> {
        let prober = HealthProber::new(config.probe.clone())?;
        let state = AppState {
            services: Arc::new(workspace.services.clone()),
            prober,
            page: Arc::new(DashboardPage::new()?),
            refresh: config.refresh.max(MIN_REFRESH),
        };
        Ok(Self { state, config })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn service_count(&self) -> usize {
        self.state.services.len()
    }

    pub fn url(&self) -> String {
        dashboard_url(self.config.port)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/status", get(api_status))
            .fallback(dashboard)
            .with_state(self.state.clone())
    }

    /// 設定ポートで待ち受けを開始
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.config.port));
        TcpListener::bind(addr)
            .await
            .map_err(|source| DashboardError::Bind { addr, source })
    }

    /// `shutdown` が完了するまでリクエストを処理する
    ///
    /// 稼働中は更新間隔ごとに集計行を標準出力へ書き出します。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, services = self.service_count(), "Dashboard listening");
        }

        let ticker = tokio::spawn(log_tally(self.state.clone()));
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;
        ticker.abort();

        result.map_err(DashboardError::Serve)
    }
}

pub fn dashboard_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// ブラウザでダッシュボードを開く（失敗しても無視）
pub fn open_browser(url: &str) {
    if let Err(e) = open::that_detached(url) {
        debug!(url, error = %e, "Failed to open browser");
    }
}

async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots = snapshot(&state.prober, &state.services).await;
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        axum::Json(snapshots),
    )
}

async fn dashboard(State(state): State<AppState>) -> Response {
    let snapshots = snapshot(&state.prober, &state.services).await;
    match state.page.render(&snapshots, state.refresh) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render dashboard");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// 集計行の間隔（プローブが更新間隔より長引いても tick を溜め込まない）
fn tally_interval(refresh: Duration) -> Interval {
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn log_tally(state: AppState) {
    let mut interval = tally_interval(state.refresh);
    // 最初の tick は即時に完了する
    interval.tick().await;

    loop {
        interval.tick().await;
        let snapshots = snapshot(&state.prober, &state.services).await;
        let tally = StatusTally::from_snapshots(&snapshots);
        println!("{}", format_tally(&tally, &Local::now().format("%H:%M:%S").to_string()));
    }
}

/// `[HH:MM:SS] Services: N up, N down, N error`
pub fn format_tally(tally: &StatusTally, timestamp: &str) -> String {
    format!(
        "{} Services: {}, {}, {}",
        format!("[{}]", timestamp).dimmed(),
        format!("{} up", tally.up).green(),
        format!("{} down", tally.down).red(),
        format!("{} error", tally.error).yellow(),
    )
}
