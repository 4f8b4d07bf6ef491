use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::models::StockRecord;
use crate::server::AppState;
use crate::services::{advisor, chart};

/// Static dashboard page: code dropdown, row table, the two charts, and the
/// advice button.
pub async fn dashboard_page() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// GET /api/codes - all stock codes for the dropdown.
pub async fn list_codes_handler(State(state): State<AppState>) -> Response {
    match state.store.list_codes().await {
        Ok(codes) => Json(codes).into_response(),
        Err(e) => {
            error!("listing codes failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("could not list stock codes")),
            )
                .into_response()
        }
    }
}

/// GET /api/stocks/{code} - raw rows for one code; an absent code is an empty
/// array, not an error.
pub async fn stock_rows_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    match state.store.query_by_code(code.trim()).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            error!("query for {} failed: {}", code, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("query failed")),
            )
                .into_response()
        }
    }
}

/// Fetch rows for a chart/advice endpoint, turning empty sets into 404s.
async fn rows_or_not_found(state: &AppState, code: &str) -> Result<Vec<StockRecord>, Response> {
    match state.store.query_by_code(code).await {
        Ok(rows) if rows.is_empty() => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new(format!("no data for stock code {}", code))),
        )
            .into_response()),
        Ok(rows) => Ok(rows),
        Err(e) => {
            error!("query for {} failed: {}", code, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("query failed")),
            )
                .into_response())
        }
    }
}

fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

/// GET /charts/{code}/price.svg
pub async fn price_chart_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    let code = code.trim().to_string();
    let rows = match rows_or_not_found(&state, &code).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    match chart::price_chart_svg(&rows, &code) {
        Ok(svg) => svg_response(svg),
        Err(e) => {
            error!("price chart for {} failed: {}", code, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("chart rendering failed")),
            )
                .into_response()
        }
    }
}

/// GET /charts/{code}/volume.svg
pub async fn volume_chart_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    let code = code.trim().to_string();
    let rows = match rows_or_not_found(&state, &code).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    match chart::volume_change_chart_svg(&rows, &code) {
        Ok(svg) => svg_response(svg),
        Err(e) => {
            error!("volume chart for {} failed: {}", code, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("chart rendering failed")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdviceQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub code: String,
    pub advice: String,
}

/// POST /api/advice - derive open/close/volume from the stored rows and ask
/// the local model. The dashboard stays interactive whatever happens here.
pub async fn advice_handler(
    State(state): State<AppState>,
    Json(query): Json<AdviceQuery>,
) -> Response {
    let code = query.code.trim().to_string();
    let rows = match rows_or_not_found(&state, &code).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let Some(inputs) = advisor::advice_inputs(&rows) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody::new("insufficient data to generate advice")),
        )
            .into_response();
    };

    match state.advisor.advise(&inputs).await {
        Ok(advice) => Json(AdviceResponse { code, advice }).into_response(),
        Err(e) => {
            warn!("advice for {} unavailable: {}", code, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new(format!("no advice available: {}", e))),
            )
                .into_response()
        }
    }
}
