use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{NaiveDate, NaiveDateTime};
use taskboard::api::create_router;
use taskboard::db::Database;
use taskboard::models::*;

fn setup() -> TestServer {
    let app = create_router(Database::open_memory());
    TestServer::new(app).expect("Failed to create test server")
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

async fn create_test_epic(server: &TestServer, title: &str) -> Epic {
    server
        .post("/epics")
        .json(&EpicInput::new(title, ""))
        .await
        .json::<Epic>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn returns_ok() {
        let server = setup();

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_a_task() {
        let server = setup();

        let response = server
            .post("/tasks")
            .json(&TaskInput::new("Groceries", "Bread").scheduled(at(9, 0), 30))
            .await;

        response.assert_status(StatusCode::CREATED);
        let task: Task = response.json();
        assert_eq!(task.title, "Groceries");
        assert_eq!(task.status, Status::New);

        let response = server.get(&format!("/tasks/{}", task.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Task>(), task);
    }

    #[tokio::test]
    async fn accepts_minimal_json() {
        let server = setup();

        let response = server
            .post("/tasks")
            .json(&serde_json::json!({ "title": "Only a title" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let task: Task = response.json();
        assert_eq!(task.description, "");
        assert!(task.start_time.is_none());
    }

    #[tokio::test]
    async fn lists_tasks() {
        let server = setup();
        server.post("/tasks").json(&TaskInput::new("A", "")).await;
        server.post("/tasks").json(&TaskInput::new("B", "")).await;

        let response = server.get("/tasks").await;

        response.assert_status_ok();
        let tasks: Vec<Task> = response.json();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let server = setup();

        server.get("/tasks/999").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn updates_a_task() {
        let server = setup();
        let task = server
            .post("/tasks")
            .json(&TaskInput::new("Draft", ""))
            .await
            .json::<Task>();

        let response = server
            .put(&format!("/tasks/{}", task.id))
            .json(&TaskInput::new("Final", "").with_status(Status::Done))
            .await;

        response.assert_status_ok();
        let updated: Task = response.json();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.status, Status::Done);
    }

    #[tokio::test]
    async fn update_of_unknown_task_is_404() {
        let server = setup();

        server
            .put("/tasks/5")
            .json(&TaskInput::new("Ghost", ""))
            .await
            .assert_status_not_found();

        let tasks: Vec<Task> = server.get("/tasks").await.json();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn rejects_overlapping_task_with_406() {
        let server = setup();
        server
            .post("/tasks")
            .json(&TaskInput::new("T1", "").scheduled(at(9, 0), 60))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/tasks")
            .json(&TaskInput::new("T2", "").scheduled(at(9, 30), 60))
            .await
            .assert_status(StatusCode::NOT_ACCEPTABLE);

        let prioritized: Vec<Entity> = server.get("/prioritized").await.json();
        assert_eq!(prioritized.len(), 1);
        assert_eq!(prioritized[0].title(), "T1");
    }

    #[tokio::test]
    async fn rejects_out_of_range_duration_with_400() {
        let server = setup();

        server
            .post("/tasks")
            .json(&TaskInput::new("Forever", "").scheduled(at(9, 0), i64::MAX))
            .await
            .assert_status_bad_request();
        server
            .post("/tasks")
            .json(&TaskInput::new("Backwards", "").scheduled(at(9, 0), -15))
            .await
            .assert_status_bad_request();

        server
            .post("/tasks")
            .json(&TaskInput::new("Lunch", "").scheduled(at(12, 0), 60))
            .await
            .assert_status(StatusCode::CREATED);
        let tasks: Vec<Task> = server.get("/tasks").await.json();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn deletes_a_task() {
        let server = setup();
        let task = server
            .post("/tasks")
            .json(&TaskInput::new("Doomed", ""))
            .await
            .json::<Task>();

        server
            .delete(&format!("/tasks/{}", task.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete(&format!("/tasks/{}", task.id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn deletes_all_tasks() {
        let server = setup();
        server.post("/tasks").json(&TaskInput::new("A", "")).await;
        server.post("/tasks").json(&TaskInput::new("B", "")).await;

        server
            .delete("/tasks")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let tasks: Vec<Task> = server.get("/tasks").await.json();
        assert!(tasks.is_empty());
    }
}

mod epics {
    use super::*;

    #[tokio::test]
    async fn new_epic_has_new_status() {
        let server = setup();

        let epic = create_test_epic(&server, "Move house").await;

        assert_eq!(epic.status, Status::New);
        assert!(epic.subtask_ids.is_empty());
    }

    #[tokio::test]
    async fn lists_subtasks_of_an_epic() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await;

        let response = server.get(&format!("/epics/{}/subtasks", epic.id)).await;

        response.assert_status_ok();
        let subtasks: Vec<Subtask> = response.json();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].title, "Pack");
    }

    #[tokio::test]
    async fn subtasks_of_unknown_epic_is_404() {
        let server = setup();

        server.get("/epics/12/subtasks").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn renames_an_epic() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;

        let response = server
            .put(&format!("/epics/{}", epic.id))
            .json(&EpicInput::new("Move flat", "Smaller"))
            .await;

        response.assert_status_ok();
        let renamed: Epic = response.json();
        assert_eq!(renamed.title, "Move flat");
        assert_eq!(renamed.description, "Smaller");
    }

    #[tokio::test]
    async fn deleting_an_epic_removes_its_subtasks() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        let subtask = server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", "").scheduled(at(9, 0), 60))
            .await
            .json::<Subtask>();
        server.get(&format!("/subtasks/{}", subtask.id)).await;

        server
            .delete(&format!("/epics/{}", epic.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server.get(&format!("/epics/{}", epic.id)).await.assert_status_not_found();
        server
            .get(&format!("/subtasks/{}", subtask.id))
            .await
            .assert_status_not_found();

        let history: Vec<Entity> = server.get("/history").await.json();
        assert!(history.is_empty());
        let prioritized: Vec<Entity> = server.get("/prioritized").await.json();
        assert!(prioritized.is_empty());
    }

    #[tokio::test]
    async fn deletes_all_epics() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await;

        server
            .delete("/epics")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let epics: Vec<Epic> = server.get("/epics").await.json();
        let subtasks: Vec<Subtask> = server.get("/subtasks").await.json();
        assert!(epics.is_empty());
        assert!(subtasks.is_empty());
    }
}

mod subtasks {
    use super::*;

    #[tokio::test]
    async fn creating_subtasks_updates_epic_status() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;

        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Drive", "").with_status(Status::Done))
            .await
            .assert_status(StatusCode::CREATED);

        let epic: Epic = server.get(&format!("/epics/{}", epic.id)).await.json();
        assert_eq!(epic.status, Status::InProgress);
        assert_eq!(epic.subtask_ids.len(), 2);
    }

    #[tokio::test]
    async fn rejects_unknown_epic_with_400() {
        let server = setup();

        let response = server
            .post("/subtasks")
            .json(&SubtaskInput::new(77, "Orphan", ""))
            .await;

        response.assert_status_bad_request();
        assert!(response.text().contains("epic 77 not found"));
    }

    #[tokio::test]
    async fn rejects_self_reference_with_400() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        let subtask = server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await
            .json::<Subtask>();

        server
            .put(&format!("/subtasks/{}", subtask.id))
            .json(&SubtaskInput::new(subtask.id, "Pack", ""))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn updating_a_subtask_recomputes_epic() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        let subtask = server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await
            .json::<Subtask>();

        server
            .put(&format!("/subtasks/{}", subtask.id))
            .json(&SubtaskInput::new(epic.id, "Pack", "").with_status(Status::Done))
            .await
            .assert_status_ok();

        let epic: Epic = server.get(&format!("/epics/{}", epic.id)).await.json();
        assert_eq!(epic.status, Status::Done);
    }

    #[tokio::test]
    async fn deleting_a_subtask_recomputes_epic() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        let open = server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", ""))
            .await
            .json::<Subtask>();
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Drive", "").with_status(Status::Done))
            .await;

        server
            .delete(&format!("/subtasks/{}", open.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let epic: Epic = server.get(&format!("/epics/{}", epic.id)).await.json();
        assert_eq!(epic.status, Status::Done);
    }

    #[tokio::test]
    async fn deletes_all_subtasks_but_keeps_epics() {
        let server = setup();
        let epic = create_test_epic(&server, "Move house").await;
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Pack", "").with_status(Status::Done))
            .await;

        server
            .delete("/subtasks")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let epic: Epic = server.get(&format!("/epics/{}", epic.id)).await.json();
        assert_eq!(epic.status, Status::New);
        assert!(epic.subtask_ids.is_empty());
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn history_lists_viewed_items_once_in_recency_order() {
        let server = setup();
        let a = server
            .post("/tasks")
            .json(&TaskInput::new("A", ""))
            .await
            .json::<Task>();
        let b = create_test_epic(&server, "B").await;

        server.get(&format!("/tasks/{}", a.id)).await;
        server.get(&format!("/epics/{}", b.id)).await;
        server.get(&format!("/tasks/{}", a.id)).await;

        let response = server.get("/history").await;
        response.assert_status_ok();
        let history: Vec<Entity> = response.json();
        let ids: Vec<_> = history.iter().map(Entity::id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert_eq!(history[0].kind(), EntityKind::Epic);
    }

    #[tokio::test]
    async fn listing_does_not_touch_history() {
        let server = setup();
        server.post("/tasks").json(&TaskInput::new("A", "")).await;
        server.get("/tasks").await;

        let history: Vec<Entity> = server.get("/history").await.json();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn prioritized_is_sorted_by_start_time() {
        let server = setup();
        let epic = create_test_epic(&server, "E").await;
        server
            .post("/tasks")
            .json(&TaskInput::new("Late", "").scheduled(at(15, 0), 30))
            .await;
        server
            .post("/subtasks")
            .json(&SubtaskInput::new(epic.id, "Early", "").scheduled(at(8, 0), 30))
            .await;
        server.post("/tasks").json(&TaskInput::new("Unscheduled", "")).await;

        let prioritized: Vec<Entity> = server.get("/prioritized").await.json();
        let titles: Vec<_> = prioritized.iter().map(Entity::title).collect();
        assert_eq!(titles, vec!["Early", "Late"]);
    }
}
