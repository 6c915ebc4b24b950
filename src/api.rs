use std::path::PathBuf;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::models::{DateRangeOptions, FilterOptions};
use crate::{analytics, db, export};

/// Shared per-request dependencies, passed explicitly through axum state.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub static_dir: PathBuf,
}

/// Uniform success envelope; errors produce the mirrored
/// `{"success": false, "error": ...}` shape via `ApiError`.
#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/data", get(analytics_data))
        .route("/api/sales", get(sales))
        .route("/api/products", get(products))
        .route("/api/regions", get(regions))
        .route("/api/metrics", get(metrics))
        .route("/api/filters", get(filter_options))
        .route("/api/trends", get(trends))
        .route("/api/export/csv/{table}", get(export_csv))
        .route("/api/export/excel", get(export_excel))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let html = std::fs::read_to_string(state.static_dir.join("dashboard.html"))?;
    Ok(Html(html))
}

async fn analytics_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = db::fetch_sales(&state.pool, None, None, None, None).await?;
    let summary = analytics::summarize(&records, Utc::now().date_naive());
    Ok(ok(summary))
}

#[derive(Debug, Deserialize)]
struct SalesQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    product: Option<String>,
    region: Option<String>,
}

async fn sales(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<impl IntoResponse> {
    // empty strings come in when the front end clears a filter box
    let product = query.product.as_deref().filter(|p| !p.is_empty());
    let region = query.region.as_deref().filter(|r| !r.is_empty());

    let records =
        db::fetch_sales(&state.pool, query.start_date, query.end_date, product, region).await?;
    Ok(ok(records))
}

async fn products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = db::fetch_sales(&state.pool, None, None, None, None).await?;
    let summary = analytics::summarize(&records, Utc::now().date_naive());
    Ok(ok(summary.product_data))
}

async fn regions(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = db::fetch_sales(&state.pool, None, None, None, None).await?;
    let summary = analytics::summarize(&records, Utc::now().date_naive());
    Ok(ok(summary.region_data))
}

async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = db::fetch_sales(&state.pool, None, None, None, None).await?;
    let summary = analytics::summarize(&records, Utc::now().date_naive());
    Ok(ok(summary.metrics))
}

async fn filter_options(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let dates = db::distinct_dates(&state.pool).await?;
    let products = db::distinct_products(&state.pool).await?;
    let regions = db::distinct_regions(&state.pool).await?;

    Ok(ok(FilterOptions {
        dates: DateRangeOptions {
            min: dates.first().copied(),
            max: dates.last().copied(),
            available: dates,
        },
        products,
        regions,
    }))
}

async fn trends(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = db::fetch_sales(&state.pool, None, None, None, None).await?;
    Ok(ok(analytics::product_trends(&records)))
}

async fn export_csv(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> ApiResult<Response> {
    if !db::EXPORTABLE_TABLES.contains(&table.as_str()) {
        return Err(ApiError::InvalidTable(table));
    }

    let bytes = match table.as_str() {
        "sales" => export::to_csv(&db::fetch_sales(&state.pool, None, None, None, None).await?)?,
        "products" => export::to_csv(&db::fetch_products(&state.pool).await?)?,
        _ => export::to_csv(&db::fetch_regions(&state.pool).await?)?,
    };

    let filename = export::export_filename(&table, "csv", Utc::now());
    Ok(attachment(bytes, "text/csv; charset=utf-8", &filename))
}

async fn export_excel(State(state): State<AppState>) -> ApiResult<Response> {
    let sales = db::fetch_sales(&state.pool, None, None, None, None).await?;
    let products = db::fetch_products(&state.pool).await?;
    let regions = db::fetch_regions(&state.pool).await?;
    let summary = analytics::summarize(&sales, Utc::now().date_naive());

    let bytes = export::to_xlsx(&sales, &products, &regions, &summary.metrics)?;
    let filename = export::export_filename("analytics", "xlsx", Utc::now());
    Ok(attachment(
        bytes,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &filename,
    ))
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Reports degraded status in the payload instead of failing the request.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    match db::sales_count(&state.pool).await {
        Ok(_) => Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "database": "connected",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "timestamp": Utc::now().to_rfc3339(),
            "error": e.to_string(),
        })),
    }
}
