use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestWorkspace {
    pub root: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_descriptor(&self, content: &str) {
        fs::write(self.root.path().join("polyglot.json"), content).unwrap();
    }

    /// services/<name>/package.json を書き込む
    #[allow(dead_code)]
    pub fn write_manifest(&self, name: &str, content: &str) {
        let dir = self.root.path().join("services").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn create_service_dir(&self, name: &str) {
        fs::create_dir_all(self.root.path().join("services").join(name)).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

/// 現在使われていないポート
#[allow(dead_code)]
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// `dir/<name>` に実行可能なシェルスクリプトを置く
#[cfg(unix)]
#[allow(dead_code)]
pub fn fake_program(dir: &std::path::Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// `dir` を先頭に足した PATH
#[allow(dead_code)]
pub fn path_with(dir: &std::path::Path) -> std::ffi::OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(paths).unwrap()
}

/// どのパスにも 200 を返すサーバーをバックグラウンドスレッドで起動し、ポートを返す
#[allow(dead_code)]
pub fn serve_ok() -> u16 {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
            );
        }
    });
    port
}
