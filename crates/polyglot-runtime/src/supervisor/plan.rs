//! 起動計画
//!
//! サービスごとに「起動できるか」「何で起動するか」を決めます。
//! 起動できない理由は `SkipReason` として返し、エラーにはしません。

use super::package_manager::PackageManager;
use polyglot_core::{ServiceDescriptor, ServiceType, Workspace};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// サービスのマニフェストファイル名
pub const MANIFEST_FILENAME: &str = "package.json";

/// 起動に使うスクリプト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchScript {
    Dev,
    /// `dev` がないときのフォールバック
    Start,
}

impl LaunchScript {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Start => "start",
        }
    }
}

impl fmt::Display for LaunchScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// サービスを起動しない理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// ローカル起動の対象外の種別（python / go / java）
    UnsupportedType(ServiceType),
    MissingDirectory(PathBuf),
    NoManifest,
    InvalidManifest(String),
    NoLaunchScript,
}

impl SkipReason {
    /// 対象外の種別は毎回通知するほどではない
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::UnsupportedType(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType(t) => write!(f, "type '{}' is not run locally", t),
            Self::MissingDirectory(dir) => write!(f, "missing directory {}", dir.display()),
            Self::NoManifest => write!(f, "no {}", MANIFEST_FILENAME),
            Self::InvalidManifest(message) => {
                write!(f, "invalid {}: {}", MANIFEST_FILENAME, message)
            }
            Self::NoLaunchScript => f.write_str("no \"dev\" or \"start\" script"),
        }
    }
}

/// 1 サービスの起動計画
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub service: ServiceDescriptor,
    pub dir: PathBuf,
    pub script: LaunchScript,
    pub package_manager: PackageManager,
}

impl LaunchPlan {
    /// `<pm> run <script>` を組み立てる
    ///
    /// 親の環境変数を引き継ぎ、PORT だけ上書きします。
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.package_manager.program());
        command
            .args(self.package_manager.run_args(self.script.as_str()))
            .current_dir(&self.dir)
            .env("PORT", self.service.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// 表示用のコマンドライン
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.package_manager.program().to_string()];
        parts.extend(self.package_manager.run_args(self.script.as_str()));
        parts.join(" ")
    }

    pub fn is_fallback(&self) -> bool {
        self.script == LaunchScript::Start
    }
}

/// サービスの起動計画を立てる
///
/// 判定順: 種別 → ディレクトリ → package.json の有無 → パース → scripts.dev / scripts.start
pub async fn plan_service(
    workspace: &Workspace,
    service: &ServiceDescriptor,
) -> Result<LaunchPlan, SkipReason> {
    if !service.service_type.is_locally_runnable() {
        return Err(SkipReason::UnsupportedType(service.service_type));
    }

    let dir = workspace.service_dir(service);
    if !tokio::fs::metadata(&dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(SkipReason::MissingDirectory(dir));
    }

    let manifest_path = dir.join(MANIFEST_FILENAME);
    let content = match tokio::fs::read_to_string(&manifest_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SkipReason::NoManifest),
        Err(e) => return Err(SkipReason::InvalidManifest(e.to_string())),
    };

    let manifest: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| SkipReason::InvalidManifest(e.to_string()))?;

    let script = select_script(&manifest).ok_or(SkipReason::NoLaunchScript)?;
    let package_manager = PackageManager::detect(&dir).await;

    Ok(LaunchPlan {
        service: service.clone(),
        dir,
        script,
        package_manager,
    })
}

fn select_script(manifest: &serde_json::Value) -> Option<LaunchScript> {
    let scripts = manifest.get("scripts")?;
    let has = |name: &str| {
        scripts
            .get(name)
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty())
    };

    if has("dev") {
        Some(LaunchScript::Dev)
    } else if has("start") {
        Some(LaunchScript::Start)
    } else {
        None
    }
}
