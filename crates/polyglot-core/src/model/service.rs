//! サービス定義

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// サービス種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Node,
    Python,
    Go,
    Java,
    Frontend,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Go => "go",
            Self::Java => "java",
            Self::Frontend => "frontend",
        }
    }

    /// `dev` コマンドでローカル起動できる種別か
    ///
    /// package.json のスクリプトで起動できる node / frontend のみが対象。
    pub fn is_locally_runnable(&self) -> bool {
        matches!(self, Self::Node | Self::Frontend)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ServiceDescriptor - polyglot.json に記録された 1 サービス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// サービス名（services/ 配下のディレクトリ名を兼ねる）
    pub name: String,
    /// サービス種別
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// 待ち受けポート
    pub port: u16,
    /// ワークスペースルートからの相対パス
    pub path: String,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, service_type: ServiceType, port: u16) -> Self {
        let name = name.into();
        let path = default_service_path(&name);
        Self {
            name,
            service_type,
            port,
            path,
        }
    }

    pub fn relative_path(&self) -> &Path {
        Path::new(&self.path)
    }
}

/// 規約上のサービスパス（services/<name>）
pub fn default_service_path(name: &str) -> String {
    format!("services/{}", name)
}
