use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use service::user_record::UserRecord;

use crate::errors::JsonApiError;
use crate::state::AppState;

/// `POST /users/`: store the JSON object in the body under `user:<id>`.
///
/// The body is parsed here rather than through `Json` so that any malformed
/// payload is a 400 and never reaches the store. An unreadable or oversized
/// body keeps axum's status (400 / 413) with the usual JSON error shape.
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, JsonApiError> {
    let body = body?;
    let record = UserRecord::from_json_slice(&body)?;
    state.users.create(&record).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /users/:userid`: all stored fields as a JSON object, or 404.
pub async fn get_user(
    State(state): State<AppState>,
    userid: Result<Path<String>, PathRejection>,
) -> Result<Response, JsonApiError> {
    // 非 UTF-8 的路径段无法作为 id 使用，按 JSON 错误返回 400
    let Path(userid) = userid?;
    let Some(fields) = state.users.get(&userid).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    // 先完整编码响应体，再设置 Content-Type，避免出现头部与失败的响应体不一致
    let body = serde_json::to_vec(&fields).map_err(|e| JsonApiError::internal(e.to_string()))?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], Body::from(body)).into_response())
}
