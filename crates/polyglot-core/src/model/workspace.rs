//! ワークスペース定義

use super::service::ServiceDescriptor;
use std::path::{Path, PathBuf};

/// サービスディレクトリのルート名
pub const SERVICES_DIR: &str = "services";

/// Workspace - ロード済みの polyglot ワークスペース
///
/// プロセス開始時に一度だけロードされ、実行中は変更されません。
#[derive(Debug, Clone)]
pub struct Workspace {
    /// ワークスペース名
    pub name: String,
    /// ワークスペースのルートディレクトリ
    pub root: PathBuf,
    /// 宣言されたサービス（ファイル内の順序を保持）
    pub services: Vec<ServiceDescriptor>,
}

impl Workspace {
    /// サービスのディレクトリ（絶対パス）を解決
    pub fn service_dir(&self, service: &ServiceDescriptor) -> PathBuf {
        self.root.join(service.relative_path())
    }

    pub fn services_dir(&self) -> PathBuf {
        self.root.join(SERVICES_DIR)
    }

    pub fn find(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
