//! polyglot 管理ダッシュボード
//!
//! ワークスペースの全サービスをリクエストごとにプローブし、
//! JSON のステータス API と自動更新される HTML ダッシュボードとして提供します。
//!
//! - `GET /api/status` - `ServiceSnapshot` の配列（CORS 許可）
//! - それ以外のパス - HTML ダッシュボード

pub mod error;
pub mod html;
pub mod server;

pub use error::*;
pub use html::*;
pub use server::*;
