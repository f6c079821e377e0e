//! Integration tests for the engagement ledger
//!
//! These tests require a running PostgreSQL database.
//! Run with: cargo test --test interaction_integration_test -- --ignored

mod common;

use axum::http::StatusCode;
use common::TestApp;
use uuid::Uuid;
use vidstream_backend::repositories::TargetType;

#[tokio::test]
#[ignore = "requires database"]
async fn test_video_like_toggle_lifecycle() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (user_id, token, _) = app.signup_user().await;
    let video_id = app.seed_video(user_id).await;

    // First like records the vote
    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/like", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK, "like failed: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Recorded");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (1, 0));
    assert_eq!(app.vote_rows(video_id, "video").await, 1);

    // Same vote again retracts it
    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/like", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Retracted");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 0));
    assert_eq!(app.vote_rows(video_id, "video").await, 0);

    // A dislike after retraction records fresh
    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/dislike", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Recorded");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 1));

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_switching_vote_moves_both_counters() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (user_id, token, _) = app.signup_user().await;
    let video_id = app.seed_video(user_id).await;

    let (status, _) = app
        .post_auth(&format!("/api/videos/{}/like", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Opposite vote switches the existing row rather than adding one
    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/dislike", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Switched");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 1));
    assert_eq!(app.vote_rows(video_id, "video").await, 1);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_comment_votes_use_their_own_counters() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (user_id, token, _) = app.signup_user().await;
    let video_id = app.seed_video(user_id).await;
    let comment_id = app.seed_comment(user_id, video_id).await;

    let (status, body) = app
        .post_auth(&format!("/api/comments/{}/like", comment_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK, "comment like failed: {}", body);
    assert_eq!(app.counters(TargetType::Comment, comment_id).await, (1, 0));

    // Video counters are untouched
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 0));

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_vote_on_missing_target_is_not_found() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (_, token, _) = app.signup_user().await;
    let missing = Uuid::new_v4();

    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/like", missing), "", &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["message"], "Video not found");

    let (status, body) = app
        .post_auth(&format!("/api/comments/{}/dislike", missing), "", &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["message"], "Comment not found");

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_like_status_reflects_current_vote() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (user_id, token, _) = app.signup_user().await;
    let video_id = app.seed_video(user_id).await;

    let status_uri = format!(
        "/api/interactions/like-status?target_id={}&target_type=video",
        video_id
    );

    // No vote yet
    let (status, body) = app.get(&status_uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "like-status failed: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["liked"], false);
    assert_eq!(json["disliked"], false);

    let (status, _) = app
        .post_auth(&format!("/api/videos/{}/dislike", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&status_uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["liked"], false);
    assert_eq!(json["disliked"], true);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_votes_are_scoped_per_user() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (owner_id, first_token, _) = app.signup_user().await;
    let (_, second_token, _) = app.signup_user().await;
    let video_id = app.seed_video(owner_id).await;

    let uri = format!("/api/videos/{}/like", video_id);
    let (status, _) = app.post_auth(&uri, "", &first_token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.post_auth(&uri, "", &second_token).await;
    assert_eq!(status, StatusCode::OK);

    // Two distinct users, two rows, counter matches
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Recorded");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (2, 0));
    assert_eq!(app.vote_rows(video_id, "video").await, 2);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_full_session_and_vote_scenario() {
    let app = TestApp::new().await;
    app.cleanup().await;

    // signup
    let email = format!("scenario_{}@example.com", Uuid::new_v4());
    let signup = serde_json::json!({
        "username": "scenariouser",
        "email": email,
        "password": "SecurePassword123!"
    });
    let (status, _, body) = app
        .post_full("/api/auth/signup", Some(&signup.to_string()), None, None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let user_id = Uuid::parse_str(json["user"]["id"].as_str().unwrap()).unwrap();

    // login from a second client
    let login = serde_json::json!({ "email": email, "password": "SecurePassword123!" });
    let (status, headers, body) = app
        .post_full("/api/auth/login", Some(&login.to_string()), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let token = json["accessToken"].as_str().unwrap().to_string();
    let refresh_cookie = common::extract_refresh_cookie(&headers).unwrap();

    let video_id = app.seed_video(user_id).await;
    let like_uri = format!("/api/videos/{}/like", video_id);

    // like: 0 -> 1
    let (status, body) = app.post_auth(&like_uri, "", &token).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Recorded");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (1, 0));

    // like again: 1 -> 0
    let (status, body) = app.post_auth(&like_uri, "", &token).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Retracted");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 0));

    // dislike: 0 -> 1
    let (status, body) = app
        .post_auth(&format!("/api/videos/{}/dislike", video_id), "", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Recorded");
    assert_eq!(app.counters(TargetType::Video, video_id).await, (0, 1));

    // logout, then refresh must fail
    let (status, _, _) = app
        .post_full("/api/auth/logout", None, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = app
        .post_full("/api/auth/refresh", None, None, Some(&refresh_cookie))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_votes_never_overcount() {
    let app = TestApp::new().await;
    app.cleanup().await;

    let (user_id, token, _) = app.signup_user().await;
    let video_id = app.seed_video(user_id).await;

    // Fire several identical votes at once; the unique index plus the
    // row lock force them to serialize into toggles
    let mut handles = Vec::new();
    for _ in 0..4 {
        let app_clone = app.app.clone();
        let uri = format!("/api/videos/{}/like", video_id);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            use tower::ServiceExt;
            let request = axum::http::Request::builder()
                .method("POST")
                .uri(&uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(axum::body::Body::empty())
                .unwrap();
            app_clone.oneshot(request).await.unwrap().status()
        }));
    }

    for handle in handles {
        let status = handle.await.unwrap();
        assert!(
            status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
            "unexpected status: {}",
            status
        );
    }

    // Whatever interleaving happened, the counter matches the rows and
    // never exceeds one vote per user
    let rows = app.vote_rows(video_id, "video").await;
    let (likes, dislikes) = app.counters(TargetType::Video, video_id).await;
    assert!(rows <= 1);
    assert_eq!(likes, rows);
    assert_eq!(dislikes, 0);

    app.cleanup().await;
}
