use polyglot_runtime::RuntimeError;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(
        "ダッシュボードを {addr} で待ち受けできません: {source}\n\nヒント:\n  • 別のポートを --port で指定してください"
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("ダッシュボードサーバーが異常終了しました: {0}")]
    Serve(#[source] std::io::Error),

    #[error("ダッシュボードの描画に失敗しました: {0}")]
    Render(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
