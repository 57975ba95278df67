//! ヘルスプローブ
//!
//! 1 サービスに対する時間制限付きの疎通確認を行います。
//! 失敗はすべて `ServiceRuntimeState` に変換され、エラーとして外に出ることはありません。

use crate::error::Result;
use crate::runtime::ServiceRuntimeState;
use polyglot_core::ServiceDescriptor;
use std::error::Error as _;
use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// ダッシュボード用のデフォルトタイムアウト
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(3000);

/// HTTP プローブの接続先ホスト
pub const DEFAULT_PROBE_HOST: &str = "localhost";

/// プローブ設定
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub host: String,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROBE_HOST.to_string(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// プローブ失敗の原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    ConnectionRefused,
    Dns,
    Connect(String),
    Other(String),
}

impl ProbeFailure {
    fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Connect(err.to_string()),
        }
    }

    /// reqwest のエラーを原因ごとに分類
    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return Self::ConnectionRefused,
                    io::ErrorKind::TimedOut => return Self::Timeout,
                    _ => {}
                }
            }
            let text = cause.to_string();
            if text.contains("dns error") || text.contains("failed to lookup address") {
                return Self::Dns;
            }
            source = cause.source();
        }

        if err.is_connect() {
            Self::Connect(error_chain(err))
        } else {
            Self::Other(error_chain(err))
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::ConnectionRefused => f.write_str("connection refused"),
            Self::Dns => f.write_str("dns resolution failed"),
            Self::Connect(message) | Self::Other(message) => f.write_str(message),
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// ヘルスプローバー
///
/// HTTP クライアントを内部で共有するため、clone して並行に使えます。
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    config: ProbeConfig,
}

impl HealthProber {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// プローブ対象の URL
    pub fn url_for(&self, service: &ServiceDescriptor, path: &str) -> String {
        format!("http://{}:{}{}", self.config.host, service.port, path)
    }

    /// HTTP GET によるヘルスチェック
    ///
    /// 400 未満で up、400 以上で error、接続失敗・タイムアウトで down。
    pub async fn probe_http(&self, service: &ServiceDescriptor, path: &str) -> ServiceRuntimeState {
        let url = self.url_for(service, path);
        let request = self.client.get(&url).send();

        let state = match timeout(self.config.timeout, request).await {
            Ok(Ok(response)) => ServiceRuntimeState::from_status_code(response.status().as_u16()),
            Ok(Err(e)) => ServiceRuntimeState::down(&ProbeFailure::from_reqwest(&e)),
            Err(_) => ServiceRuntimeState::down(&ProbeFailure::Timeout),
        };

        debug!(
            service = %service.name,
            url = %url,
            status = %state.status,
            status_code = ?state.status_code,
            error = ?state.error,
            "HTTP probe finished"
        );
        state
    }

    /// TCP 接続のみによる死活確認
    pub async fn probe_tcp(&self, service: &ServiceDescriptor) -> ServiceRuntimeState {
        let connect = TcpStream::connect((Ipv4Addr::LOCALHOST, service.port));

        let state = match timeout(self.config.timeout, connect).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ServiceRuntimeState::reachable()
            }
            Ok(Err(e)) => ServiceRuntimeState::down(&ProbeFailure::from_io(&e)),
            Err(_) => ServiceRuntimeState::down(&ProbeFailure::Timeout),
        };

        debug!(
            service = %service.name,
            port = service.port,
            status = %state.status,
            "TCP probe finished"
        );
        state
    }
}
