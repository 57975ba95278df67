//! 子プロセス出力のプレフィックス付き転送

use colored::{Color, ColoredString, Colorize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

/// サービス名ラベルの配色
pub const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::BrightRed,
];

/// サービス名から色を決める（同じ名前は常に同じ色）
pub fn color_for(name: &str) -> Color {
    let sum: usize = name.chars().map(|c| c as usize).sum();
    PALETTE[sum % PALETTE.len()]
}

/// `[name]` ラベル
pub fn label(name: &str) -> ColoredString {
    format!("[{}]", name).color(color_for(name))
}

/// 出力先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// 子プロセスのパイプを行単位で読み、ラベルを付けて転送するタスクを起動
pub fn pump<R>(name: &str, reader: R, stream: Stream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let prefix = label(name).to_string();
    tokio::spawn(async move {
        let result = match stream {
            Stream::Stdout => forward_lines(&prefix, reader, &mut tokio::io::stdout()).await,
            Stream::Stderr => forward_lines(&prefix, reader, &mut tokio::io::stderr()).await,
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "Output stream closed with error");
        }
    })
}

/// `reader` を行単位で読み、`prefix` を付けて `writer` へ書き出す
///
/// 行は 1 回の書き込みで出力するため、同じサービスの行は書き込まれた順に並びます。
/// UTF-8 として不正なバイトは置換文字に変換し、末尾の改行なしの行も 1 行として扱います。
pub async fn forward_lines<R, W>(prefix: &str, reader: R, writer: &mut W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = format!("{} {}\n", prefix, line.trim_end_matches(['\n', '\r']));
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
