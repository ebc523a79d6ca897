use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::Database;
use crate::manager::{ErrorKind, ManagerError};
use crate::models::*;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Map a failed operation to a response.
///
/// Rejections from the manager are safe to show the client and keep their
/// message. Anything else (e.g. the task file could not be written) is
/// logged in full and returned as a generic 500.
fn error_response(e: anyhow::Error) -> ApiError {
    if let Some(rejection) = e.downcast_ref::<ManagerError>() {
        let status = match rejection.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::SchedulingConflict => StatusCode::NOT_ACCEPTABLE,
            ErrorKind::IllegalState => StatusCode::CONFLICT,
        };
        tracing::warn!("Rejected request: {}", rejection);
        return (status, rejection.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

fn deleted(found: bool, what: &str) -> Result<StatusCode, ApiError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(what))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(db): State<Database>) -> Json<Vec<Task>> {
    Json(db.get_all_tasks())
}

pub async fn get_task(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, ApiError> {
    db.get_task(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Task"))
}

pub async fn create_task(
    State(db): State<Database>,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    db.create_task(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(error_response)
}

pub async fn update_task(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, ApiError> {
    db.update_task(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Task"))
}

pub async fn delete_task(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    deleted(db.delete_task(id).map_err(error_response)?, "Task")
}

pub async fn delete_all_tasks(State(db): State<Database>) -> Result<StatusCode, ApiError> {
    db.delete_all_tasks().map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Epics
// ============================================================

pub async fn list_epics(State(db): State<Database>) -> Json<Vec<Epic>> {
    Json(db.get_all_epics())
}

pub async fn get_epic(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<Json<Epic>, ApiError> {
    db.get_epic(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Epic"))
}

pub async fn list_epic_subtasks(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<Json<Vec<Subtask>>, ApiError> {
    db.get_epic_subtasks(id)
        .map(Json)
        .ok_or_else(|| not_found("Epic"))
}

pub async fn create_epic(
    State(db): State<Database>,
    Json(input): Json<EpicInput>,
) -> Result<(StatusCode, Json<Epic>), ApiError> {
    db.create_epic(input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(error_response)
}

pub async fn update_epic(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
    Json(input): Json<EpicInput>,
) -> Result<Json<Epic>, ApiError> {
    db.update_epic(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Epic"))
}

pub async fn delete_epic(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    deleted(db.delete_epic(id).map_err(error_response)?, "Epic")
}

pub async fn delete_all_epics(State(db): State<Database>) -> Result<StatusCode, ApiError> {
    db.delete_all_epics().map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Subtasks
// ============================================================

pub async fn list_subtasks(State(db): State<Database>) -> Json<Vec<Subtask>> {
    Json(db.get_all_subtasks())
}

pub async fn get_subtask(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<Json<Subtask>, ApiError> {
    db.get_subtask(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Subtask"))
}

pub async fn create_subtask(
    State(db): State<Database>,
    Json(input): Json<SubtaskInput>,
) -> Result<(StatusCode, Json<Subtask>), ApiError> {
    db.create_subtask(input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(error_response)
}

pub async fn update_subtask(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
    Json(input): Json<SubtaskInput>,
) -> Result<Json<Subtask>, ApiError> {
    db.update_subtask(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Subtask"))
}

pub async fn delete_subtask(
    State(db): State<Database>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    deleted(db.delete_subtask(id).map_err(error_response)?, "Subtask")
}

pub async fn delete_all_subtasks(State(db): State<Database>) -> Result<StatusCode, ApiError> {
    db.delete_all_subtasks().map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Views
// ============================================================

pub async fn get_history(State(db): State<Database>) -> Json<Vec<Entity>> {
    Json(db.get_history())
}

pub async fn get_prioritized(State(db): State<Database>) -> Json<Vec<Entity>> {
    Json(db.get_prioritized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rejections_to_status_codes() {
        let cases = [
            (ManagerError::EpicNotFound { epic_id: 3 }, StatusCode::BAD_REQUEST),
            (ManagerError::InvalidDuration { minutes: -5 }, StatusCode::BAD_REQUEST),
            (
                ManagerError::SchedulingConflict { conflicting_id: 1 },
                StatusCode::NOT_ACCEPTABLE,
            ),
            (
                ManagerError::DetachedSubtask {
                    subtask_id: 4,
                    epic_id: 2,
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (rejection, expected) in cases {
            let (status, body) = error_response(rejection.clone().into());
            assert_eq!(status, expected);
            assert_eq!(body, rejection.to_string());
        }
    }

    #[test]
    fn hides_internal_errors() {
        let (status, body) = error_response(anyhow::anyhow!("disk full at /var/data"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }
}
