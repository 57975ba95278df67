use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("HTTP クライアントを初期化できません: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(
        "サービス '{service}' のプロセスを起動できません: {source}\n\nヒント:\n  • {program} がインストールされ PATH に含まれているか確認してください"
    )]
    Spawn {
        service: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "docker compose を起動できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • docker compose プラグインがインストールされているか確認してください"
    )]
    ComposeLaunch(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
