mod support;

fn unique_match_id() -> String {
    format!("it-{}", uuid::Uuid::new_v4())
}

async fn create(client: &reqwest::Client, base_url: &str, match_id: &str) -> reqwest::Response {
    client
        .post(format!("{base_url}/matches"))
        .json(&serde_json::json!({
            "match_id": match_id,
            "allowed_player_ids": []
        }))
        .send()
        .await
        .expect("request should succeed")
}

#[tokio::test]
async fn creating_a_match_returns_its_id() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let match_id = unique_match_id();

    let res = create(&client, base_url, &match_id).await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["match_id"], match_id.as_str());
}

#[tokio::test]
async fn duplicate_match_is_a_conflict() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let match_id = unique_match_id();

    assert_eq!(
        create(&client, base_url, &match_id).await.status(),
        reqwest::StatusCode::CREATED
    );
    let res = create(&client, base_url, &match_id).await;
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);

    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["error"], "match already exists");
}

#[tokio::test]
async fn blank_match_id_is_rejected() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = create(&client, base_url, "   ").await;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn removed_match_can_be_recreated() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let match_id = unique_match_id();

    create(&client, base_url, &match_id).await;
    let res = client
        .delete(format!("{base_url}/matches/{match_id}"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{base_url}/matches/{match_id}"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    assert_eq!(
        create(&client, base_url, &match_id).await.status(),
        reqwest::StatusCode::CREATED
    );
}

#[tokio::test]
async fn default_match_is_pinned() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{base_url}/matches/test"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);
}
