//! Integration tests for the HTTP adapters.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::http::{StatusCode, Uri, header};
use axum::routing::post;
use axum::{Json, Router};
use eq_core::{Difficulty, GameMode, QuestionRequest};
use eq_http::{
    ApiClient, HttpConfig, HttpQuestionProvider, HttpResultSink, HttpWeakTopicAnalyzer,
};
use eq_session::{
    ChapterCompletion, ProviderError, QuestionProvider, ResultSink, WeakTopicAnalyzer,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the stub service saw.
struct Captured {
    path: String,
    body: Value,
}

/// Answer every POST with `status` and `reply`; the first request is
/// captured.
async fn serve_once(status: u16, reply: &'static str) -> (HttpConfig, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let status = StatusCode::from_u16(status).unwrap();

    let app = Router::new().route(
        "/{*path}",
        post(move |uri: Uri, Json(body): Json<Value>| {
            let tx = Arc::clone(&tx);
            async move {
                let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(sender) = sender {
                    let _ = sender.send(Captured {
                        path: uri.path().to_string(),
                        body,
                    });
                }
                (status, [(header::CONTENT_TYPE, "application/json")], reply)
            }
        }),
    );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (HttpConfig::new(format!("http://{addr}")), rx)
}

fn request() -> QuestionRequest {
    QuestionRequest {
        subject: "Science".into(),
        grade: "6".into(),
        difficulty: Difficulty::Hard,
        interaction_type: "enemy".into(),
        entity_id: "default-enemy-2".into(),
        entity_name: "Gravity Golem".into(),
        weak_topics: vec!["orbits".into()],
        syllabus_id: None,
        chapter_id: None,
        chapter_content: None,
        attempted_entities: vec!["default-enemy-0".into()],
        user_id: "u1".into(),
    }
}

const QUESTION: &str = r#"{"question":"What force keeps planets in orbit?","options":["Magnetism","Friction","Gravity","Inertia"],"correct_index":2,"explanation":"Gravity"}"#;

#[tokio::test]
async fn generates_questions() {
    let (config, seen) = serve_once(200, QUESTION).await;
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());

    let question = provider.generate(&request()).await.unwrap();
    assert_eq!(question.correct_option(), "Gravity");

    let seen = seen.await.unwrap();
    assert_eq!(seen.path, "/api/generate-question");
    assert_eq!(seen.body["difficulty"], "hard");
    assert_eq!(seen.body["interaction_type"], "enemy");
    assert_eq!(seen.body["weak_topics"][0], "orbits");
    assert_eq!(seen.body["attempted_entities"][0], "default-enemy-0");
}

#[tokio::test]
async fn rejects_malformed_questions() {
    let (config, _seen) =
        serve_once(200, r#"{"question":"?","options":["a","b"],"correct_index":0}"#).await;
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());
    let err = provider.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidPayload(_)), "{err}");
}

#[tokio::test]
async fn accepts_any_success_status() {
    let (config, _seen) = serve_once(201, QUESTION).await;
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());
    let question = provider.generate(&request()).await.unwrap();
    assert_eq!(question.correct_index, 2);
}

#[tokio::test]
async fn reports_error_statuses() {
    let (config, _seen) = serve_once(500, r#"{"error":"boom"}"#).await;
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());
    let err = provider.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status(500)), "{err}");
}

#[tokio::test]
async fn reports_undecodable_bodies() {
    let (config, _seen) = serve_once(200, "not json").await;
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());
    let err = provider.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "{err}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = HttpConfig::new(format!("http://{addr}")).with_timeout(Duration::from_secs(2));
    let provider = HttpQuestionProvider::new(ApiClient::new(config).unwrap());
    let err = provider.generate(&request()).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::Transport(_) | ProviderError::Timeout(_)),
        "{err}"
    );
}

#[tokio::test]
async fn posts_chapter_completions() {
    let (config, seen) = serve_once(200, r#"{"success":true,"completion":{}}"#).await;
    let sink = HttpResultSink::new(ApiClient::new(config).unwrap());
    let completion = ChapterCompletion {
        user_id: "u1".into(),
        syllabus_id: Some("syl".into()),
        chapter_id: Some(3),
        chapter_title: "Fractions".into(),
        score: 600,
        total_questions: 7,
        correct_answers: 6,
        accuracy: 86,
        time_taken: 240,
        mode: GameMode::Syllabus,
        subject: "Math".into(),
        grade: "5".into(),
    };
    sink.save_completion(&completion).await.unwrap();

    let seen = seen.await.unwrap();
    assert_eq!(seen.path, "/api/complete-chapter");
    assert_eq!(seen.body["chapter_id"], 3);
    assert_eq!(seen.body["accuracy"], 86);
    assert_eq!(seen.body["mode"], "syllabus");
}

#[tokio::test]
async fn analyzes_wrong_answers() {
    let (config, seen) = serve_once(200, r#"{"weak_topics":["fractions","decimals"]}"#).await;
    let analyzer = HttpWeakTopicAnalyzer::new(ApiClient::new(config).unwrap());
    let wrong = vec!["What is half of 3/4?".to_string()];

    let topics = analyzer.analyze("Math", "5", &wrong).await.unwrap();
    assert_eq!(topics, ["fractions", "decimals"]);

    let seen = seen.await.unwrap();
    assert_eq!(seen.path, "/api/analyze-session");
    assert_eq!(seen.body["grade"], "5");
    assert_eq!(seen.body["wrong_answers"][0], "What is half of 3/4?");
}
