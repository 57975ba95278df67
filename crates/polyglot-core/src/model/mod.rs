//! モデル定義
//!
//! ワークスペース記述子のデータモデルを定義します。

mod service;
mod workspace;

// Re-exports
pub use service::*;
pub use workspace::*;
