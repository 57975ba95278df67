//! 記述子ローダー
//!
//! polyglot.json の読み込み、スキーマ変換、不変条件の検証を行います。

use crate::error::{Result, WorkspaceError};
use crate::model::{ServiceDescriptor, ServiceType, Workspace, default_service_path};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};
use tracing::{debug, info, instrument};

/// 記述子ファイル名
pub const DESCRIPTOR_FILENAME: &str = "polyglot.json";

/// ファイル上の表現（path は省略可能）
#[derive(Debug, Deserialize)]
struct RawWorkspace {
    name: Option<String>,
    services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    name: String,
    #[serde(rename = "type")]
    service_type: ServiceType,
    port: u16,
    path: Option<String>,
}

impl From<RawService> for ServiceDescriptor {
    fn from(raw: RawService) -> Self {
        let path = raw
            .path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| default_service_path(&raw.name));
        Self {
            name: raw.name,
            service_type: raw.service_type,
            port: raw.port,
            path,
        }
    }
}

/// ワークスペースルートから polyglot.json をロード
///
/// # Errors
/// * `ConfigNotFound` - 記述子ファイルが存在しない
/// * `ConfigInvalid` - JSON として、またはスキーマとして解釈できない
/// * その他 - 名前/ポートの重複、不正なポート、ワークスペース外のパス
#[instrument(skip(workspace_root), fields(workspace_root = %workspace_root.display()))]
pub fn load(workspace_root: &Path) -> Result<Workspace> {
    let path = workspace_root.join(DESCRIPTOR_FILENAME);
    if !path.is_file() {
        return Err(WorkspaceError::ConfigNotFound(path));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| WorkspaceError::Io {
        path: path.clone(),
        message: e.to_string(),
    })?;
    debug!(bytes = content.len(), "Read descriptor file");

    let raw: RawWorkspace =
        serde_json::from_str(&content).map_err(|e| WorkspaceError::ConfigInvalid {
            path: path.clone(),
            message: e.to_string(),
        })?;

    let name = raw.name.unwrap_or_else(|| {
        workspace_root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string()
    });
    let services: Vec<ServiceDescriptor> = raw.services.into_iter().map(Into::into).collect();
    validate_services(&services)?;

    info!(
        workspace = %name,
        services = services.len(),
        "Workspace loaded successfully"
    );

    Ok(Workspace {
        name,
        root: workspace_root.to_path_buf(),
        services,
    })
}

/// サービス一覧の不変条件を検証
pub fn validate_services(services: &[ServiceDescriptor]) -> Result<()> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut ports: HashMap<u16, &str> = HashMap::new();

    for (index, service) in services.iter().enumerate() {
        if service.name.trim().is_empty() {
            return Err(WorkspaceError::EmptyServiceName { index });
        }

        if !names.insert(service.name.as_str()) {
            return Err(WorkspaceError::DuplicateServiceName(service.name.clone()));
        }

        if service.port == 0 {
            return Err(WorkspaceError::InvalidPort {
                service: service.name.clone(),
                port: service.port,
            });
        }

        if let Some(first) = ports.insert(service.port, service.name.as_str()) {
            return Err(WorkspaceError::DuplicatePort {
                port: service.port,
                first: first.to_string(),
                second: service.name.clone(),
            });
        }

        if !is_contained_path(service.relative_path()) {
            return Err(WorkspaceError::PathOutsideWorkspace {
                service: service.name.clone(),
                path: service.path.clone(),
            });
        }
    }

    Ok(())
}

/// ルート配下に留まる相対パスか（絶対パス・`..` を拒否）
fn is_contained_path(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
