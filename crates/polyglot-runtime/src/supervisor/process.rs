//! 子プロセスの起動と終了監視

use super::output::{Stream, label, pump};
use super::plan::LaunchPlan;
use crate::error::{Result, RuntimeError};
use colored::Colorize;
use futures_util::future::join_all;
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 終了後に残りの出力を待つ上限
///
/// 孫プロセスがパイプを握ったままでも、この時間で終了を報告します。
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// 子プロセスの終了結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub name: String,
    /// 終了コード（シグナル終了時は None）
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

/// 子プロセスへシグナルを送るためのハンドル
#[derive(Debug, Clone)]
pub struct ProcessSignal {
    pub name: String,
    pub pid: Option<u32>,
}

impl ProcessSignal {
    /// SIGINT を送る（終了は待たない）
    pub fn interrupt(&self) {
        let Some(pid) = self.pid else {
            return;
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            debug!(service = %self.name, pid, "Sending SIGINT");
            if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
                // 既に終了している
                debug!(service = %self.name, pid, error = %e, "Failed to send SIGINT");
            }
        }

        #[cfg(not(unix))]
        warn!(service = %self.name, pid, "Interrupting child processes is only supported on unix");
    }
}

/// 起動済みの子プロセス
pub struct ManagedProcess {
    signal: ProcessSignal,
    exit: JoinHandle<ProcessExit>,
}

impl ManagedProcess {
    pub fn spawn(plan: &LaunchPlan) -> Result<Self> {
        Self::spawn_command(
            &plan.service.name,
            plan.package_manager.program(),
            plan.command(),
        )
    }

    /// 任意のコマンドを起動し、出力転送と終了監視のタスクを張る
    ///
    /// `command` の stdout / stderr は piped に設定されている必要があります。
    pub fn spawn_command(name: &str, program: &str, mut command: Command) -> Result<Self> {
        let mut child = command.spawn().map_err(|source| RuntimeError::Spawn {
            service: name.to_string(),
            program: program.to_string(),
            source,
        })?;

        let pid = child.id();
        debug!(service = %name, pid = ?pid, "Spawned child process");

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(pump(name, stdout, Stream::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(pump(name, stderr, Stream::Stderr));
        }

        let exit_name = name.to_string();
        let exit = tokio::spawn(async move {
            let status = child.wait().await;
            // 最後の出力行はなるべく終了報告より先に出す
            if tokio::time::timeout(OUTPUT_DRAIN_GRACE, join_all(pumps)).await.is_err() {
                debug!(service = %exit_name, "Output pipes still open after exit");
            }

            let exit = match status {
                Ok(status) => ProcessExit {
                    name: exit_name.clone(),
                    code: status.code(),
                    signal: exit_signal(&status),
                },
                Err(e) => {
                    warn!(service = %exit_name, error = %e, "Failed to wait for child process");
                    ProcessExit {
                        name: exit_name.clone(),
                        code: None,
                        signal: None,
                    }
                }
            };
            report_exit(&exit);
            exit
        });

        Ok(Self {
            signal: ProcessSignal {
                name: name.to_string(),
                pid,
            },
            exit,
        })
    }

    pub fn name(&self) -> &str {
        &self.signal.name
    }

    pub fn into_parts(self) -> (ProcessSignal, JoinHandle<ProcessExit>) {
        (self.signal, self.exit)
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

fn report_exit(exit: &ProcessExit) {
    let message = match (exit.code, exit.signal) {
        (Some(code), _) => format!("exited with code {}", code),
        (None, Some(signal)) => format!("exited by signal {}", signal),
        (None, None) => "exited".to_string(),
    };
    println!("{} {}", label(&exit.name), message.dimmed());
}
