mod handlers;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    Router::new()
        // Tasks
        .route(
            "/tasks",
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .delete(handlers::delete_all_tasks),
        )
        .route(
            "/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        // Epics
        .route(
            "/epics",
            get(handlers::list_epics)
                .post(handlers::create_epic)
                .delete(handlers::delete_all_epics),
        )
        .route(
            "/epics/{id}",
            get(handlers::get_epic)
                .put(handlers::update_epic)
                .delete(handlers::delete_epic),
        )
        .route("/epics/{id}/subtasks", get(handlers::list_epic_subtasks))
        // Subtasks
        .route(
            "/subtasks",
            get(handlers::list_subtasks)
                .post(handlers::create_subtask)
                .delete(handlers::delete_all_subtasks),
        )
        .route(
            "/subtasks/{id}",
            get(handlers::get_subtask)
                .put(handlers::update_subtask)
                .delete(handlers::delete_subtask),
        )
        // Views
        .route("/history", get(handlers::get_history))
        .route("/prioritized", get(handlers::get_prioritized))
        // Health
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
