//! HTTP routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use tablesmith_domain::{CreatureId, TableId};
use tablesmith_shared::{
    CreateEncounterTableData, EncounterTableData, EncounterTableEntryData,
    EncounterTableWithEntriesData, ErrorBody, ErrorCode, ListTablesQuery, PaginatedData,
    ReplaceEntryData, ReplaceModeData, RollResultData, ShareTableData, SuggestedNameData,
    UpdateEncounterTableData,
};
use uuid::Uuid;

use super::dto;
use super::identity::{CurrentUser, RequiredUser};
use crate::app::App;
use crate::infrastructure::ports::{RepoError, Requester};
use crate::use_cases::encounter::{
    EncounterError, ErrorCategory, NewTable, Pagination, ReplaceMode, TableUpdate,
};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route(
            "/api/encounter-tables",
            get(list_tables).post(create_table),
        )
        .route("/api/encounter-tables/preview", post(preview_table))
        .route("/api/encounter-tables/suggest-name", get(suggest_name))
        .route(
            "/api/encounter-tables/public/{slug}",
            get(get_public_table),
        )
        .route(
            "/api/encounter-tables/public/{slug}/copy",
            post(copy_public_table),
        )
        .route(
            "/api/encounter-tables/{id}",
            get(get_table).patch(update_table).delete(delete_table),
        )
        .route(
            "/api/encounter-tables/{id}/entries/{roll}",
            patch(replace_entry),
        )
        .route("/api/encounter-tables/{id}/generate", post(regenerate_table))
        .route("/api/encounter-tables/{id}/roll", post(roll_table))
        .route("/api/encounter-tables/{id}/share", patch(share_table))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Encounter Tables
// =============================================================================

async fn list_tables(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Query(query): Query<ListTablesQuery>,
) -> Result<Json<PaginatedData<EncounterTableData>>, ApiError> {
    let pagination = Pagination::new(query.page, query.limit)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let page = app
        .use_cases
        .encounter
        .ops
        .list_for_owner(user, pagination)
        .await?;
    Ok(Json(dto::page_data(&page)))
}

fn new_table(body: CreateEncounterTableData) -> Result<NewTable, ApiError> {
    Ok(NewTable {
        name: body.name,
        description: body.description,
        die_size: body.die_size,
        filter: dto::filter_from_data(body.filters)?,
    })
}

async fn create_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Json(body): Json<CreateEncounterTableData>,
) -> Result<(StatusCode, Json<EncounterTableWithEntriesData>), ApiError> {
    let table = app
        .use_cases
        .encounter
        .generate
        .execute(user, new_table(body)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(dto::table_with_entries_data(&table)?),
    ))
}

async fn preview_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Json(body): Json<CreateEncounterTableData>,
) -> Result<Json<EncounterTableWithEntriesData>, ApiError> {
    let table = app
        .use_cases
        .encounter
        .generate
        .preview(user, new_table(body)?)
        .await?;
    Ok(Json(dto::table_with_entries_data(&table)?))
}

async fn suggest_name(State(app): State<Arc<App>>) -> Json<SuggestedNameData> {
    Json(SuggestedNameData {
        name: app.use_cases.encounter.ops.suggest_name(),
    })
}

async fn get_table(
    State(app): State<Arc<App>>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EncounterTableWithEntriesData>, ApiError> {
    let table = app
        .use_cases
        .encounter
        .ops
        .get(TableId::from_uuid(id), &requester)
        .await?;
    Ok(Json(dto::table_with_entries_data(&table)?))
}

async fn update_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEncounterTableData>,
) -> Result<Json<EncounterTableData>, ApiError> {
    let changes = TableUpdate {
        name: body.name,
        description: body.description,
        filter: body.filters.map(dto::filter_from_data).transpose()?,
    };
    let table = app
        .use_cases
        .encounter
        .ops
        .update(TableId::from_uuid(id), &Requester::User(user), changes)
        .await?;
    Ok(Json(dto::table_data(&table)))
}

async fn delete_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .encounter
        .ops
        .delete(TableId::from_uuid(id), &Requester::User(user))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_entry(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path((id, roll)): Path<(Uuid, String)>,
    Json(body): Json<ReplaceEntryData>,
) -> Result<Json<EncounterTableEntryData>, ApiError> {
    let roll: u16 = roll
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid roll number: {}", roll)))?;
    let mode = match (body.mode, body.creature_id) {
        (ReplaceModeData::Random, _) => ReplaceMode::Random,
        (ReplaceModeData::Search, Some(creature_id)) => ReplaceMode::Search {
            creature_id: CreatureId::from_uuid(creature_id),
        },
        (ReplaceModeData::Search, None) => {
            return Err(ApiError::BadRequest(
                "creature_id is required in search mode".to_string(),
            ))
        }
    };
    let entry = app
        .use_cases
        .encounter
        .replace
        .execute(TableId::from_uuid(id), roll, mode, &Requester::User(user))
        .await?;
    Ok(Json(dto::entry_data(&entry)?))
}

async fn regenerate_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EncounterTableWithEntriesData>, ApiError> {
    let table = app
        .use_cases
        .encounter
        .generate
        .regenerate(TableId::from_uuid(id), &Requester::User(user))
        .await?;
    Ok(Json(dto::table_with_entries_data(&table)?))
}

async fn roll_table(
    State(app): State<Arc<App>>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RollResultData>, ApiError> {
    let result = app
        .use_cases
        .encounter
        .ops
        .roll(TableId::from_uuid(id), &requester)
        .await?;
    Ok(Json(dto::roll_data(&result)?))
}

async fn share_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ShareTableData>,
) -> Result<Json<EncounterTableData>, ApiError> {
    let table = app
        .use_cases
        .encounter
        .ops
        .set_visibility(TableId::from_uuid(id), &Requester::User(user), body.is_public)
        .await?;
    Ok(Json(dto::table_data(&table)))
}

// =============================================================================
// Public Tables
// =============================================================================

async fn get_public_table(
    State(app): State<Arc<App>>,
    Path(slug): Path<String>,
) -> Result<Json<EncounterTableWithEntriesData>, ApiError> {
    let table = app.use_cases.encounter.ops.get_public(&slug).await?;
    Ok(Json(dto::table_with_entries_data(&table)?))
}

async fn copy_public_table(
    State(app): State<Arc<App>>,
    RequiredUser(user): RequiredUser,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<EncounterTableWithEntriesData>), ApiError> {
    let copy = app.use_cases.encounter.clone.execute(&slug, user).await?;
    Ok((
        StatusCode::CREATED,
        Json(dto::table_with_entries_data(&copy)?),
    ))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    Unauthorized,
    Forbidden,
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(ErrorCode::NotFound, msg)),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(ErrorCode::BadRequest, msg),
            ),
            ApiError::Validation { message, details } => {
                let body = ErrorBody::new(ErrorCode::ValidationError, message);
                let body = match details {
                    Some(details) => body.with_details(details),
                    None => body,
                };
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(ErrorCode::Unauthorized, "x-user-id header required"),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody::new(ErrorCode::Forbidden, "Not allowed to access this table"),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new(ErrorCode::Conflict, msg)),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new(ErrorCode::ServiceUnavailable, msg),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(ErrorCode::InternalError, "Internal error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<EncounterError> for ApiError {
    fn from(e: EncounterError) -> Self {
        let message = e.to_string();
        match e.category() {
            ErrorCategory::NotFound => ApiError::NotFound(message),
            ErrorCategory::Forbidden => ApiError::Forbidden,
            ErrorCategory::UserCorrectable => match e {
                EncounterError::DuplicateInTable { .. } | EncounterError::CannotCloneOwnTable => {
                    ApiError::Conflict(message)
                }
                EncounterError::RollOutOfRange { .. } => ApiError::BadRequest(message),
                EncounterError::InsufficientCandidates { needed, available } => {
                    ApiError::Validation {
                        message,
                        details: Some(serde_json::json!({
                            "needed": needed,
                            "available": available,
                        })),
                    }
                }
                _ => ApiError::Validation {
                    message,
                    details: None,
                },
            },
            ErrorCategory::Retryable => match e {
                EncounterError::Persistence(_) => ApiError::Internal(message),
                _ => ApiError::Unavailable(message),
            },
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::from(EncounterError::from(e))
    }
}
