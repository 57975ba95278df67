//! polyglot ワークスペース記述子
//!
//! 生成されたモノレポのルートにある `polyglot.json` を読み込み、
//! サービス一覧（名前・種別・ポート・パス）を検証済みのモデルとして提供します。
//!
//! # 概要
//!
//! - **model**: `ServiceDescriptor` / `ServiceType` / `Workspace`
//! - **discovery**: ワークスペースルートの検出
//! - **loader**: 記述子ファイルの読み込みと不変条件の検証

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;

pub use discovery::*;
pub use error::*;
pub use loader::*;
pub use model::*;
