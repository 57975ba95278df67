//! ワークスペース発見
//!
//! 生成ツールは polyglot.json をワークスペースのルートに置くため、
//! 親ディレクトリへの探索は行いません。

use crate::error::{Result, WorkspaceError};
use crate::loader::{DESCRIPTOR_FILENAME, load};
use crate::model::Workspace;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// ワークスペースルートを指定する環境変数
pub const WORKSPACE_ROOT_ENV: &str = "POLYGLOT_WORKSPACE_ROOT";

/// ワークスペースルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 POLYGLOT_WORKSPACE_ROOT
/// 2. カレントディレクトリ
#[tracing::instrument]
pub fn find_workspace_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(WORKSPACE_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking POLYGLOT_WORKSPACE_ROOT");
        if has_descriptor(&path) {
            info!(workspace_root = %path.display(), "Found workspace root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "POLYGLOT_WORKSPACE_ROOT is set but contains no polyglot.json");
    }

    let current_dir = std::env::current_dir().map_err(|e| WorkspaceError::Io {
        path: PathBuf::from("."),
        message: e.to_string(),
    })?;

    if has_descriptor(&current_dir) {
        info!(workspace_root = %current_dir.display(), "Found workspace root");
        return Ok(current_dir);
    }

    Err(WorkspaceError::ConfigNotFound(
        current_dir.join(DESCRIPTOR_FILENAME),
    ))
}

/// ワークスペースを検出してロード
pub fn load_workspace() -> Result<Workspace> {
    let root = find_workspace_root()?;
    load(&root)
}

fn has_descriptor(dir: &Path) -> bool {
    dir.join(DESCRIPTOR_FILENAME).is_file()
}
