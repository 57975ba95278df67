use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(
        "polyglot.json が見つかりません: {0}\nヒント: 生成されたワークスペースのルートで実行してください"
    )]
    ConfigNotFound(PathBuf),

    #[error("polyglot.json を解釈できません: {path}\n理由: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("IO エラー: {path}\n理由: {message}")]
    Io { path: PathBuf, message: String },

    #[error("サービス名が空です（{index} 番目のサービス）")]
    EmptyServiceName { index: usize },

    #[error("サービス名が重複しています: {0}")]
    DuplicateServiceName(String),

    #[error("ポート {port} が重複しています: '{first}' と '{second}'")]
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },

    #[error("サービス '{service}' のポート {port} は無効です（1-65535）")]
    InvalidPort { service: String, port: u16 },

    #[error("サービス '{service}' のパス '{path}' はワークスペースの外を指しています")]
    PathOutsideWorkspace { service: String, path: String },
}

impl WorkspaceError {
    /// 記述子が存在しない場合のエラーか
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
