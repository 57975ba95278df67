use std::fmt;
use std::path::Path;

/// サービスディレクトリのロックファイルから判定するパッケージマネージャー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// ロックファイルから判定
    ///
    /// pnpm → yarn → bun の順に確認し、どれもなければ npm。
    pub async fn detect(dir: &Path) -> Self {
        const LOCKFILES: &[(&str, PackageManager)] = &[
            ("pnpm-lock.yaml", PackageManager::Pnpm),
            ("yarn.lock", PackageManager::Yarn),
            ("bun.lockb", PackageManager::Bun),
            ("bun.lock", PackageManager::Bun),
        ];

        for (lockfile, manager) in LOCKFILES {
            if tokio::fs::try_exists(dir.join(lockfile))
                .await
                .unwrap_or(false)
            {
                return *manager;
            }
        }
        Self::Npm
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// `<pm> run <script>` の引数
    pub fn run_args(&self, script: &str) -> Vec<String> {
        vec!["run".to_string(), script.to_string()]
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}
