//! polyglot ランタイム
//!
//! ワークスペースのサービスに対するヘルスプローブ、ステータス集約、
//! ローカルプロセスの起動・監視、docker compose への委譲を提供します。

pub mod compose;
pub mod error;
pub mod probe;
pub mod runtime;
pub mod status;
pub mod supervisor;
pub mod waiter;

pub use compose::*;
pub use error::*;
pub use probe::*;
pub use runtime::*;
pub use status::*;
pub use supervisor::*;
pub use waiter::*;

#[cfg(test)]
pub(crate) mod test_support;
