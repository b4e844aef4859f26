//! API request handlers
//!
//! Every response is a JSON envelope. Success:
//! `{"isOk": true, "status": 200, "links": {"self": {..}}, "result": ..}`;
//! failure: `{"isOk": false, "status": N, "errors": [{"message": .., "options": {"code": ..}}]}`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use gridcalc_core::{CellInfo, CellRef, GridcalcError, Updates};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct Link {
    pub href: String,
    pub method: String,
}

#[derive(Debug, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub is_ok: bool,
    pub status: u16,
    pub links: Links,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    fn ok(method: &Method, uri: &Uri, result: Option<T>) -> Json<Self> {
        let href = match uri.query() {
            Some(query) => format!("{}?{}", uri.path(), query),
            None => uri.path().to_string(),
        };
        Json(Self {
            is_ok: true,
            status: StatusCode::OK.as_u16(),
            links: Links {
                self_link: Link {
                    href,
                    method: method.to_string(),
                },
            },
            result,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorOptions {
    pub code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub options: ErrorOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub is_ok: bool,
    pub status: u16,
    pub errors: Vec<ErrorDetail>,
}

/// An error code plus message, rendered as an error envelope.
#[derive(Debug)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQ" | "SYNTAX" | "CIRCULAR_REF" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GridcalcError> for ApiError {
    fn from(err: GridcalcError) -> Self {
        let code = err.code();
        if code == "DB" {
            error!("storage failure: {}", err);
        }
        ApiError::new(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new("BAD_REQ", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorEnvelope {
            is_ok: false,
            status: status.as_u16(),
            errors: vec![ErrorDetail {
                message: self.message,
                options: ErrorOptions { code: self.code },
            }],
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// GET /{sheet} - every formula, precedents first
pub async fn dump(
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Vec<(CellRef, String)>> {
    let entries = state.services.dump(&sheet)?;
    Ok(Envelope::ok(&method, &uri, Some(entries)))
}

/// PUT /{sheet} - replace the sheet with `[[id, expr], ..]`
pub async fn load(
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<Vec<(String, String)>>, JsonRejection>,
) -> ApiResult<()> {
    let Json(entries) = body?;
    state.services.load(&sheet, entries)?;
    Ok(Envelope::ok(&method, &uri, None))
}

/// DELETE /{sheet}
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<()> {
    state.services.clear(&sheet)?;
    Ok(Envelope::ok(&method, &uri, None))
}

/// GET /{sheet}/{cell}
pub async fn query(
    State(state): State<Arc<AppState>>,
    Path((sheet, cell)): Path<(String, String)>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<CellInfo> {
    let info = state.services.query(&sheet, &cell)?;
    Ok(Envelope::ok(&method, &uri, Some(info)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub expr: Option<String>,
    #[serde(rename = "srcCellId")]
    pub src_cell_id: Option<String>,
}

/// PATCH /{sheet}/{cell}?expr=E or ?srcCellId=S
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((sheet, cell)): Path<(String, String)>,
    Query(params): Query<UpdateParams>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Updates> {
    let updates = match (params.expr, params.src_cell_id) {
        (Some(expr), None) => state.services.evaluate(&sheet, &cell, &expr)?,
        (None, Some(src)) => state.services.copy(&sheet, &cell, &src)?,
        _ => {
            warn!(%uri, "update needs exactly one of expr or srcCellId");
            return Err(ApiError::new(
                "BAD_REQ",
                "exactly one of expr or srcCellId query parameters is required",
            ));
        }
    };
    Ok(Envelope::ok(&method, &uri, Some(updates)))
}

/// DELETE /{sheet}/{cell}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path((sheet, cell)): Path<(String, String)>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Updates> {
    let updates = state.services.remove(&sheet, &cell)?;
    Ok(Envelope::ok(&method, &uri, Some(updates)))
}

/// Fallback for unknown paths and unsupported methods
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::new("NOT_FOUND", format!("{} not supported for {}", method, uri))
}
