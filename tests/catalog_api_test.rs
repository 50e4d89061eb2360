//! Integration tests for the beat catalog HTTP surface, including the
//! multipart upload path.

mod common;

use axum::http::Method;
use common::{decimal_field, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn multipart_body(boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [
        ("title", "Night Drive"),
        ("artist", "Prod. Test"),
        ("genre", "trap"),
        ("price", "29.99"),
    ] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"audio_file\"; \
             filename=\"night-drive.mp3\"\r\nContent-Type: audio/mpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"ID3fakeaudiodata");
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn admin_uploads_a_beat() {
    let app = TestApp::new().await;
    let admin = app.admin_token("root@example.com").await;

    let boundary = "X-TEST-BOUNDARY";
    let content_type = format!("multipart/form-data; boundary={boundary}");
    let auth = format!("Bearer {admin}");
    let response = app
        .raw_request(
            Method::POST,
            "/api/v1/beats",
            &[
                ("content-type", content_type.as_str()),
                ("authorization", auth.as_str()),
            ],
            multipart_body(boundary),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert_eq!(body["data"]["title"], "Night Drive");
    assert_eq!(decimal_field(&body["data"]["price"]), dec!(29.99));
    let audio_url = body["data"]["audio_file"].as_str().unwrap();
    assert!(audio_url.contains("/uploads/audio/"));
    assert!(audio_url.ends_with(".mp3"));
}

#[tokio::test]
async fn upload_requires_admin_role() {
    let app = TestApp::new().await;
    let (_id, user_token) = app.user_with_token("buyer@example.com").await;

    let boundary = "X-TEST-BOUNDARY";
    let content_type = format!("multipart/form-data; boundary={boundary}");
    let auth = format!("Bearer {user_token}");
    let response = app
        .raw_request(
            Method::POST,
            "/api/v1/beats",
            &[
                ("content-type", content_type.as_str()),
                ("authorization", auth.as_str()),
            ],
            multipart_body(boundary),
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn listing_is_public() {
    let app = TestApp::new().await;
    app.seed_beat("public-one", dec!(9.99)).await;
    app.seed_beat("public-two", dec!(4.99)).await;

    let response = app.request(Method::GET, "/api/v1/beats", None, None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_update_delete_cycle() {
    let app = TestApp::new().await;
    let admin = app.admin_token("root@example.com").await;
    let beat = app.seed_beat("mutable", dec!(10.00)).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/beats/{}", beat.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/beats/{}", beat.id),
            Some(json!({ "price": "15.00" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body["data"]["price"]), dec!(15.00));
    assert_eq!(body["data"]["title"], "mutable");

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/beats/{}", beat.id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/beats/{}", beat.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}
