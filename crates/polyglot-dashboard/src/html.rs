//! ダッシュボード HTML の生成
//!
//! 初回表示はサーバー側でテーブルまで描画し、以降はページ内スクリプトが
//! `REFRESH_MS` ごとに `/api/status` を取得してテーブルを差し替えます。
//! テンプレートは `.html` として登録するため、差し込む値は Tera が自動でエスケープします。

use crate::error::{DashboardError, Result};
use chrono::Local;
use polyglot_runtime::ServiceSnapshot;
use serde::Serialize;
use std::time::Duration;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("../templates/dashboard.html");

/// テンプレートに渡す 1 行分
#[derive(Debug, Serialize)]
struct Row<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    service_type: &'a str,
    port: u16,
    status: &'a str,
    path: &'a str,
    checked: String,
}

impl<'a> From<&'a ServiceSnapshot> for Row<'a> {
    fn from(s: &'a ServiceSnapshot) -> Self {
        Self {
            name: &s.service.name,
            service_type: s.service.service_type.as_str(),
            port: s.service.port,
            status: s.state.status.as_str(),
            path: &s.service.path,
            checked: s
                .state
                .last_checked
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
        }
    }
}

/// コンパイル済みのダッシュボードテンプレート
#[derive(Debug, Clone)]
pub struct DashboardPage {
    tera: Tera,
}

impl DashboardPage {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(|e| DashboardError::Render(render_error_detail(&e)))?;
        Ok(Self { tera })
    }

    /// ダッシュボードページを描画
    pub fn render(&self, snapshots: &[ServiceSnapshot], refresh: Duration) -> Result<String> {
        let rows: Vec<Row> = snapshots.iter().map(Row::from).collect();

        let mut context = Context::new();
        context.insert("rows", &rows);
        context.insert("count", &rows.len());
        context.insert("refresh_ms", &(refresh.as_millis() as u64));
        context.insert("refresh_secs", &format!("{:.1}", refresh.as_secs_f64()));

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| DashboardError::Render(render_error_detail(&e)))
    }
}

/// Tera のエラーは原因を連結しないと肝心の情報が出ない
fn render_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut detail = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
