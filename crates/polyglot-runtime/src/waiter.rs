//! 起動待機モジュール
//!
//! プロセス起動後、`/health` が応答するまで一定間隔でポーリングします。
//! 待機結果は他サービスの起動をブロックせず、コマンド全体も失敗させません。

use crate::probe::HealthProber;
use polyglot_core::ServiceDescriptor;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// 起動確認に使うパス
pub const HEALTH_PATH: &str = "/health";

/// 起動待機の設定
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// 待機の上限
    pub timeout: Duration,
    /// ポーリング間隔
    pub interval: Duration,
    pub path: String,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(500),
            path: HEALTH_PATH.to_string(),
        }
    }
}

/// サービスの準備完了を待機
///
/// # Returns
/// * `true` - 5xx 以外の HTTP 応答を得た
/// * `false` - `config.timeout` 内に応答が得られなかった
pub async fn wait_for_ready(
    prober: &HealthProber,
    service: &ServiceDescriptor,
    config: &ReadinessConfig,
) -> bool {
    let deadline = Instant::now() + config.timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let state = prober.probe_http(service, &config.path).await;
        if state.is_ready() {
            debug!(service = %service.name, attempt, "Service is ready");
            return true;
        }

        if Instant::now() >= deadline {
            debug!(service = %service.name, attempt, "Readiness wait timed out");
            return false;
        }
        sleep(config.interval).await;
    }
}
