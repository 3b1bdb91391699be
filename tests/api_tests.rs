// tests/api_tests.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use exam_backend::{
    config::Config,
    engine::clock::{Clock, ManualClock},
    routes,
    state::AppState,
    store::storage::MemoryStorage,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    clock: ManualClock,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn token(&self, user: &str) -> String {
        sign_jwt(user, SECRET, 600).expect("Failed to sign token")
    }

    async fn create_exam(&self, owner: &str, body: Value) -> Value {
        let response = self
            .client
            .post(self.url("/api/exams"))
            .bearer_auth(self.token(owner))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn start_attempt(&self, respondent: &str, exam_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/attempts"))
            .bearer_auth(self.token(respondent))
            .json(&json!({ "examId": exam_id }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Spawns the app over in-memory storage on a random port.
async fn spawn_app() -> TestApp {
    let config = Config {
        database_url: None,
        jwt_secret: SECRET.to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        tick_interval: Duration::from_secs(1),
        session_retention: Duration::from_secs(600),
        session_idle_timeout: Duration::from_secs(3600),
    };

    let clock = ManualClock::new(Utc::now());
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let state = AppState::new(config, Arc::new(MemoryStorage::new()), shared_clock);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        clock,
        client: reqwest::Client::new(),
    }
}

fn sample_exam(time_limit: Option<u32>) -> Value {
    json!({
        "title": "Sample Quiz",
        "description": "A sample quiz to demonstrate the platform",
        "timeLimit": time_limit,
        "isPublished": true,
        "questions": [
            {
                "id": "1",
                "type": "multiple-choice",
                "prompt": "What is the capital of France?",
                "options": ["London", "Berlin", "Paris", "Madrid"],
                "correctAnswer": 2,
                "points": 10
            },
            {
                "id": "2",
                "type": "true-false",
                "prompt": "The Earth is flat.",
                "correctAnswer": "false",
                "points": 5
            },
            {
                "id": "3",
                "type": "open-ended",
                "prompt": "Explain the concept of photosynthesis.",
                "points": 15
            }
        ]
    })
}

#[tokio::test]
async fn unknown_path_is_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn creating_an_exam_requires_a_token() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .post(app.url("/api/exams"))
        .json(&sample_exam(None))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn create_rejects_empty_title() {
    // Arrange
    let app = spawn_app().await;
    let mut body = sample_exam(None);
    body["title"] = json!("");

    // Act
    let response = app
        .client
        .post(app.url("/api/exams"))
        .bearer_auth(app.token("author"))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn public_view_hides_answers_and_definition_is_owner_only() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(Some(60))).await;
    let id = exam["id"].as_str().unwrap();

    // Act
    let public: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stranger = app
        .client
        .get(app.url(&format!("/api/exams/{}/definition", id)))
        .bearer_auth(app.token("stranger"))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(public["totalPoints"], 30);
    assert_eq!(public["questionCount"], 3);
    assert!(public["questions"][0].get("correctAnswer").is_none());
    assert_eq!(stranger.status().as_u16(), 403);
}

#[tokio::test]
async fn update_by_non_owner_is_forbidden_and_title_unchanged() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(None)).await;
    let id = exam["id"].as_str().unwrap();

    // Act
    let response = app
        .client
        .patch(app.url(&format!("/api/exams/{}", id)))
        .bearer_auth(app.token("someone-else"))
        .json(&json!({ "title": "New" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 403);
    let stored: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["title"], "Sample Quiz");
}

#[tokio::test]
async fn owner_patch_merges_fields() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(Some(30))).await;
    let id = exam["id"].as_str().unwrap();

    // Act
    let updated: Value = app
        .client
        .patch(app.url(&format!("/api/exams/{}", id)))
        .bearer_auth(app.token("author"))
        .json(&json!({ "title": "Renamed", "timeLimit": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["timeLimit"], Value::Null);
    assert_eq!(updated["description"], "A sample quiz to demonstrate the platform");
    assert_eq!(updated["questions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn full_attempt_flow_scores_and_records_result() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(Some(60))).await;
    let exam_id = exam["id"].as_str().unwrap();

    // Act: start, answer, seek, submit
    let started = app.start_attempt("student", exam_id).await;
    assert_eq!(started.status().as_u16(), 201);
    let view: Value = started.json().await.unwrap();
    let attempt_id = view["attemptId"].as_str().unwrap().to_string();
    assert_eq!(view["remainingSeconds"], 3600);
    assert_eq!(view["status"], "in-progress");

    for (question_id, value) in [("1", json!(2)), ("2", json!(false))] {
        let response = app
            .client
            .put(app.url(&format!("/api/attempts/{}/answers", attempt_id)))
            .bearer_auth(app.token("student"))
            .json(&json!({ "questionId": question_id, "value": value }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let out_of_range = app
        .client
        .put(app.url(&format!("/api/attempts/{}/position", attempt_id)))
        .bearer_auth(app.token("student"))
        .json(&json!({ "index": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 409);

    let negative = app
        .client
        .put(app.url(&format!("/api/attempts/{}/position", attempt_id)))
        .bearer_auth(app.token("student"))
        .json(&json!({ "index": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative.status().as_u16(), 409);
    let body: Value = negative.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("out of range"));

    let moved: Value = app
        .client
        .put(app.url(&format!("/api/attempts/{}/position", attempt_id)))
        .bearer_auth(app.token("student"))
        .json(&json!({ "index": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moved["currentQuestion"]["id"], "3");
    assert_eq!(moved["answeredCount"], 2);

    let submitted = app
        .client
        .post(app.url(&format!("/api/attempts/{}/submit", attempt_id)))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap();
    assert_eq!(submitted.status().as_u16(), 200);
    let result: Value = submitted.json().await.unwrap();

    // Assert
    assert_eq!(result["score"], 15);
    assert_eq!(result["totalPoints"], 30);
    assert_eq!(result["examTitle"], "Sample Quiz");
    assert_eq!(result["answers"]["2"], "false");

    let again = app
        .client
        .post(app.url(&format!("/api/attempts/{}/submit", attempt_id)))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    let mine: Vec<Value> = app
        .client
        .get(app.url("/api/results"))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], result["id"]);
}

#[tokio::test]
async fn timer_expiry_submits_with_collected_answers() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(Some(1))).await;
    let exam_id = exam["id"].as_str().unwrap();
    let view: Value = app.start_attempt("student", exam_id).await.json().await.unwrap();
    let attempt_id = view["attemptId"].as_str().unwrap().to_string();

    app.client
        .put(app.url(&format!("/api/attempts/{}/answers", attempt_id)))
        .bearer_auth(app.token("student"))
        .json(&json!({ "questionId": "1", "value": 2 }))
        .send()
        .await
        .unwrap();

    // Act
    app.clock.advance_secs(60);
    let after: Value = app
        .client
        .get(app.url(&format!("/api/attempts/{}", attempt_id)))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(after["status"], "submitted");
    assert_eq!(after["remainingSeconds"], 0);
    assert_eq!(after["score"], 10);

    let results: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/exams/{}/results", exam_id)))
        .bearer_auth(app.token("author"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["score"], 10);
    assert_eq!(results[0]["respondentId"], "student");
}

#[tokio::test]
async fn drafts_and_empty_exams_cannot_be_taken_by_respondents() {
    // Arrange
    let app = spawn_app().await;
    let mut draft = sample_exam(None);
    draft["isPublished"] = json!(false);
    let draft = app.create_exam("author", draft).await;
    let empty = app
        .create_exam("author", json!({ "title": "Empty", "questions": [] }))
        .await;

    // Act
    let respondent = app
        .start_attempt("student", draft["id"].as_str().unwrap())
        .await;
    let preview = app
        .start_attempt("author", draft["id"].as_str().unwrap())
        .await;
    let no_questions = app
        .start_attempt("author", empty["id"].as_str().unwrap())
        .await;
    let publish_empty = app
        .client
        .patch(app.url(&format!("/api/exams/{}", empty["id"].as_str().unwrap())))
        .bearer_auth(app.token("author"))
        .json(&json!({ "isPublished": true }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(respondent.status().as_u16(), 403);
    assert_eq!(preview.status().as_u16(), 201);
    assert_eq!(no_questions.status().as_u16(), 400);
    assert_eq!(publish_empty.status().as_u16(), 400);
}

#[tokio::test]
async fn deleting_an_exam_keeps_its_results() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(None)).await;
    let exam_id = exam["id"].as_str().unwrap();
    let view: Value = app.start_attempt("student", exam_id).await.json().await.unwrap();
    let attempt_id = view["attemptId"].as_str().unwrap().to_string();
    app.client
        .post(app.url(&format!("/api/attempts/{}/submit", attempt_id)))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap();

    // Act
    let deleted = app
        .client
        .delete(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(app.token("author"))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(deleted.status().as_u16(), 204);
    let gone = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);

    let mine: Vec<Value> = app
        .client
        .get(app.url("/api/results"))
        .bearer_auth(app.token("student"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["examTitle"], "Sample Quiz");
    assert_eq!(mine[0]["totalPoints"], 30);
}

#[tokio::test]
async fn summary_reports_buckets_for_owner() {
    // Arrange
    let app = spawn_app().await;
    let exam = app.create_exam("author", sample_exam(None)).await;
    let exam_id = exam["id"].as_str().unwrap();

    for (respondent, choice) in [("a", 2), ("b", 0)] {
        let view: Value = app.start_attempt(respondent, exam_id).await.json().await.unwrap();
        let attempt_id = view["attemptId"].as_str().unwrap().to_string();
        app.client
            .put(app.url(&format!("/api/attempts/{}/answers", attempt_id)))
            .bearer_auth(app.token(respondent))
            .json(&json!({ "questionId": "1", "value": choice }))
            .send()
            .await
            .unwrap();
        app.client
            .post(app.url(&format!("/api/attempts/{}/submit", attempt_id)))
            .bearer_auth(app.token(respondent))
            .send()
            .await
            .unwrap();
    }

    // Act
    let summary: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}/results/summary", exam_id)))
        .bearer_auth(app.token("author"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(summary["attempts"], 2);
    assert_eq!(summary["distribution"]["failing"], 2);
    assert_eq!(summary["passRate"], 0.0);
}
