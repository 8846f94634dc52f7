mod support;

#[tokio::test]
async fn when_room_is_created_then_created_and_its_id_are_returned() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let room_id = format!("test-{}", uuid::Uuid::new_v4());

    let res = client
        .post(format!("{base_url}/rooms"))
        .json(&serde_json::json!({ "room_id": room_id }))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["room_id"], room_id);
}

#[tokio::test]
async fn when_room_id_is_taken_then_conflict_is_returned() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let payload = serde_json::json!({ "room_id": format!("dup-{}", uuid::Uuid::new_v4()) });

    let first = client
        .post(format!("{base_url}/rooms"))
        .json(&payload)
        .send()
        .await
        .expect("first request");
    let second = client
        .post(format!("{base_url}/rooms"))
        .json(&payload)
        .send()
        .await
        .expect("second request");

    assert_eq!(first.status(), reqwest::StatusCode::CREATED);
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = second.json().await.expect("json body");
    assert_eq!(body["error"], "room already exists");
}

#[tokio::test]
async fn when_room_id_is_omitted_then_one_is_generated() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base_url}/rooms"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.expect("json body");
    assert!(!body["room_id"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn when_room_id_is_blank_then_bad_request_is_returned() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base_url}/rooms"))
        .json(&serde_json::json!({ "room_id": "   " }))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}
