use crate::auth::CredentialTable;
use crate::charts::{ChartOptions, ChartRenderer, ChartSet};
use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline;
use crate::storage::{CompanyStore, SqliteStore};
use crate::templates::{DashboardTemplate, LoginTemplate};
use crate::types::{NormalizedRecord, SearchFilter};
use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CompanyStore>,
    pub credentials: Arc<CredentialTable>,
    pub charts: ChartRenderer,
}

impl AppState {
    pub fn new(store: Arc<dyn CompanyStore>, credentials: CredentialTable, charts: ChartRenderer) -> Self {
        Self {
            store,
            credentials: Arc::new(credentials),
            charts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(SqliteStore::open(&config.storage.db_path)),
            CredentialTable::from(&config.auth),
            ChartRenderer::new(ChartOptions::from(&config.charts)),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// Result of one dashboard read: records, charts and user-facing notices.
pub struct DashboardData {
    pub records: Vec<NormalizedRecord>,
    pub charts: ChartSet,
    pub notices: Vec<String>,
}

/// Loads, normalizes and charts the ranking. Storage problems never
/// escape; they turn into an empty table and a notice.
pub fn build_dashboard(
    store: &dyn CompanyStore,
    renderer: &ChartRenderer,
    filter: Option<&SearchFilter>,
) -> DashboardData {
    let mut notices = Vec::new();
    let records = match pipeline::load(store, filter) {
        Ok(records) => records,
        Err(e) if e.is_data_unavailable() => {
            warn!(error = %e, "ranking data unavailable");
            notices.push(format!("❌ 未找到数据库或读取失败：{}", e));
            Vec::new()
        }
        Err(e) => {
            error!(error = %e, "failed to load ranking data");
            notices.push(format!("❌ 读取数据库失败：{}", e));
            Vec::new()
        }
    };

    let charts = renderer.render_all(&records);
    DashboardData {
        records,
        charts,
        notices,
    }
}

fn render_page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template rendering failed: {}", e)).into_response()
        }
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fortune500-dash",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn login_page() -> Response {
    render_page(&LoginTemplate {
        error: None,
        username: String::new(),
    })
}

async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.credentials.verify(&form.username, &form.password) {
        Ok(()) => {
            info!(user = %form.username.trim(), "login succeeded");
            Redirect::to("/dashboard").into_response()
        }
        Err(e) => {
            warn!(user = %form.username.trim(), reason = ?e, "login rejected");
            let mut response = render_page(&LoginTemplate {
                error: Some(e.to_string()),
                username: form.username,
            });
            if response.status().is_success() {
                *response.status_mut() = StatusCode::UNAUTHORIZED;
            }
            response
        }
    }
}

async fn dashboard_get(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    dashboard(state, params.query.unwrap_or_default()).await
}

async fn dashboard_post(State(state): State<AppState>, Form(params): Form<SearchParams>) -> Response {
    dashboard(state, params.query.unwrap_or_default()).await
}

async fn dashboard(state: AppState, query: String) -> Response {
    let query = query.trim().to_string();
    let filter = SearchFilter::parse(&query);

    let store = state.store.clone();
    let renderer = state.charts;
    let built =
        tokio::task::spawn_blocking(move || build_dashboard(store.as_ref(), &renderer, filter.as_ref())).await;

    let data = match built {
        Ok(data) => data,
        Err(e) => {
            error!(error = %e, "dashboard task failed");
            DashboardData {
                records: Vec::new(),
                charts: ChartSet::default(),
                notices: vec!["❌ 读取数据失败，请稍后重试".to_string()],
            }
        }
    };

    info!(query = %query, records = data.records.len(), "dashboard rendered");
    render_page(&DashboardTemplate::new(query, &data.records, data.charts, data.notices))
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    Router::new()
        .route("/", get(login_page).post(login_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/dashboard", get(dashboard_get).post(dashboard_post))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_server(state);
    let server = hyper::Server::try_bind(&addr)?.serve(app.into_make_service());
    info!(%addr, "dashboard listening on http://{}", addr);

    server
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::CompanyRecord;

    #[test]
    fn missing_store_gives_empty_data_and_notice() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("missing.db"));
        let data = build_dashboard(&store, &ChartRenderer::default(), None);

        assert!(data.records.is_empty());
        assert_eq!(data.notices.len(), 1);
        assert!(data.notices[0].contains("未找到数据库"));
        assert!(!data.charts.revenue.has_image());
    }

    #[test]
    fn freshly_created_empty_store_gives_notice() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::create(dir.path().join("fortune500.db")).unwrap();
        let data = build_dashboard(&store, &ChartRenderer::default(), None);

        assert!(data.records.is_empty());
        assert_eq!(data.notices.len(), 1);
        assert!(data.notices[0].contains("未找到数据库或读取失败"));
    }

    #[test]
    fn builds_records_and_charts() {
        let store = InMemoryStore::with_rows(vec![
            CompanyRecord::new("1", "甲公司(Alpha Corp)", "", "1,000", "100", "US"),
            CompanyRecord::new("2", "甲公司", "", "900", "80", "US"),
            CompanyRecord::new("3", "乙公司", "", "500", "-20", "CN"),
        ]);
        let data = build_dashboard(&store, &ChartRenderer::default(), None);

        assert!(data.notices.is_empty());
        assert_eq!(data.records.len(), 2);
        assert!(data.charts.countries.has_image());
        assert_eq!(data.charts.revenue.entries.len(), 2);
    }
}
