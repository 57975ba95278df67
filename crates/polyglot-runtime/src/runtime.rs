use crate::probe::ProbeFailure;
use chrono::{DateTime, Utc};
use polyglot_core::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// サービスの稼働状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// 応答あり（HTTP 400 未満、または TCP 接続成功）
    Up,
    /// 接続できない（拒否・タイムアウト・名前解決失敗）
    Down,
    /// 応答はあるがエラーステータス（HTTP 400 以上）
    Error,
    #[default]
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1 回のプローブ結果
///
/// 毎回まるごと置き換えられ、履歴は保持しません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRuntimeState {
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

impl ServiceRuntimeState {
    /// HTTP ステータスコードから状態を決定
    pub fn from_status_code(code: u16) -> Self {
        let status = if code < 400 {
            ServiceStatus::Up
        } else {
            ServiceStatus::Error
        };
        Self {
            status,
            status_code: Some(code),
            error: None,
            last_checked: Utc::now(),
        }
    }

    /// TCP 接続のみ確認できた状態
    pub fn reachable() -> Self {
        Self {
            status: ServiceStatus::Up,
            status_code: None,
            error: None,
            last_checked: Utc::now(),
        }
    }

    pub fn down(failure: &ProbeFailure) -> Self {
        Self {
            status: ServiceStatus::Down,
            status_code: None,
            error: Some(failure.to_string()),
            last_checked: Utc::now(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: ServiceStatus::Unknown,
            status_code: None,
            error: None,
            last_checked: Utc::now(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ServiceStatus::Up
    }

    /// 起動待機の完了条件（5xx 以外の HTTP 応答）
    pub fn is_ready(&self) -> bool {
        self.status_code.is_some_and(|code| code < 500)
    }

    /// `last_checked` を除いて同じ結果か
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.status == other.status
            && self.status_code == other.status_code
            && self.error == other.error
    }
}

/// ステータス API の 1 要素（記述子 + 稼働状態）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    #[serde(flatten)]
    pub service: ServiceDescriptor,
    #[serde(flatten)]
    pub state: ServiceRuntimeState,
}
