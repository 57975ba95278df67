//! ステータス集約
//!
//! 全サービスを並行にプローブし、すべて完了してから 1 つのスナップショットにまとめます。

use crate::probe::HealthProber;
use crate::runtime::{ServiceRuntimeState, ServiceSnapshot, ServiceStatus};
use futures_util::future::join_all;
use polyglot_core::ServiceDescriptor;
use serde::Serialize;

/// ダッシュボードが確認するパス
pub const STATUS_PROBE_PATH: &str = "/";

/// 全サービスの HTTP スナップショットを取得
///
/// 返り値は入力と同じ順序・同じ件数。1 サービスの遅延は他をブロックしません
/// （各プローブはプローバーのタイムアウトで個別に打ち切られる）。
pub async fn snapshot(
    prober: &HealthProber,
    services: &[ServiceDescriptor],
) -> Vec<ServiceSnapshot> {
    let probes = services.iter().map(|service| async move {
        let state = prober.probe_http(service, STATUS_PROBE_PATH).await;
        ServiceSnapshot {
            service: service.clone(),
            state,
        }
    });
    join_all(probes).await
}

/// TCP 接続のみで全サービスの死活を取得
pub async fn tcp_snapshot(
    prober: &HealthProber,
    services: &[ServiceDescriptor],
) -> Vec<ServiceSnapshot> {
    let probes = services.iter().map(|service| async move {
        let state = prober.probe_tcp(service).await;
        ServiceSnapshot {
            service: service.clone(),
            state,
        }
    });
    join_all(probes).await
}

/// 状態ごとの件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub up: usize,
    pub down: usize,
    pub error: usize,
    pub unknown: usize,
}

impl StatusTally {
    pub fn from_states<'a>(states: impl IntoIterator<Item = &'a ServiceRuntimeState>) -> Self {
        let mut tally = Self::default();
        for state in states {
            match state.status {
                ServiceStatus::Up => tally.up += 1,
                ServiceStatus::Down => tally.down += 1,
                ServiceStatus::Error => tally.error += 1,
                ServiceStatus::Unknown => tally.unknown += 1,
            }
        }
        tally
    }

    pub fn from_snapshots(snapshots: &[ServiceSnapshot]) -> Self {
        Self::from_states(snapshots.iter().map(|s| &s.state))
    }

    pub fn total(&self) -> usize {
        self.up + self.down + self.error + self.unknown
    }
}
