use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use geodex::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps every query on the same in-memory db.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = geodex::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    geodex::api::router(state).await
}

fn record_body(ip: &str, country: &str, region: &str, city: &str) -> String {
    serde_json::json!({
        "ip": ip,
        "country": country,
        "region": region,
        "city": city,
        "zip_code": 40514,
        "latitude": 34.04,
        "longitude": -118.02,
    })
    .to_string()
}

async fn create_record(app: &Router, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn put_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_greeting() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("geodex"));
}

#[tokio::test]
async fn test_create_sanitizes_and_lookup_round_trips() {
    let app = spawn_app().await;

    let (status, body) =
        create_record(&app, record_body(" 1.2.3.4 ", "poland", "SILESIA", "katowice")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"]["ip"], "1.2.3.4");
    assert_eq!(body["added"]["country"], "Poland");
    assert_eq!(body["added"]["region"], "Silesia");
    assert_eq!(body["added"]["city"], "Katowice");

    let (status, body) = get_json(&app, "/ips/1.2.3.4").await;

    assert_eq!(status, StatusCode::OK);
    let result = body["result"].as_array().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0]["ip_address"], "1.2.3.4");
    assert_eq!(result[0]["country"], "Poland");
    assert_eq!(result[0]["zip_code"], 40514);
    assert_eq!(result[0]["latitude"], 34.04);
    assert_eq!(result[0]["longitude"], -118.02);
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let app = spawn_app().await;

    let (status, _) =
        create_record(&app, record_body("1.2.3.4", "Poland", "Silesia", "Katowice")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        create_record(&app, record_body("1.2.3.4", "Poland", "Silesia", "Katowice")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("1.2.3.4"));
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let app = spawn_app().await;

    // ip shorter than the shortest dotted quad
    let (status, _) = create_record(&app, record_body("1.2.3", "Poland", "Silesia", "Katowice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // empty country after trimming
    let (status, _) = create_record(&app, record_body("1.2.3.4", "   ", "Silesia", "Katowice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // zip_code below 1
    let body = serde_json::json!({
        "ip": "1.2.3.4",
        "country": "Poland",
        "region": "Silesia",
        "city": "Katowice",
        "zip_code": 0,
        "latitude": 34.04,
        "longitude": -118.02,
    })
    .to_string();
    let (status, _) = create_record(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_point_lookup_unknown_ip() {
    let app = spawn_app().await;

    let (status, _) = get_json(&app, "/ips/9.9.9.9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // out-of-bounds ip length is rejected before storage access
    let (status, _) = get_json(&app, "/ips/1.2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_a_filter() {
    let app = spawn_app().await;

    let (status, _) = get_json(&app, "/ips/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // limit alone is not a filter
    let (status, _) = get_json(&app, "/ips/?limit=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_filters_conjunctively() {
    let app = spawn_app().await;

    create_record(&app, record_body("1.2.3.4", "Poland", "Silesia", "Katowice")).await;
    create_record(&app, record_body("5.6.7.8", "Poland", "Lesser Poland", "Krakow")).await;

    let (status, body) = get_json(&app, "/ips/?country=Poland").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"].as_array().unwrap().len(), 2);

    let (status, body) = get_json(&app, "/ips/?country=Poland&city=Krakow").await;
    assert_eq!(status, StatusCode::OK);
    let result = body["result"].as_array().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0]["ip_address"], "5.6.7.8");

    let (status, body) = get_json(&app, "/ips/?zip_code=40514&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let (status, _) = get_json(&app, "/ips/?country=Germany").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_changes_only_supplied_fields() {
    let app = spawn_app().await;

    create_record(&app, record_body("1.2.3.4", "Poland", "Silesia", "Katowice")).await;

    let (status, body) = put_json(&app, "/ips/1.2.3.4?city=Krakow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"]["city"], "Krakow");
    assert_eq!(body["updated"]["country"], "Poland");
    assert_eq!(body["updated"]["region"], "Silesia");
    assert_eq!(body["updated"]["zip_code"], 40514);
    assert_eq!(body["updated"]["latitude"], 34.04);
    assert_eq!(body["updated"]["longitude"], -118.02);

    // the stored row reflects the change on a fresh read
    let (_, body) = get_json(&app, "/ips/1.2.3.4").await;
    assert_eq!(body["result"][0]["city"], "Krakow");
}

#[tokio::test]
async fn test_update_rejects_empty_and_unknown() {
    let app = spawn_app().await;

    create_record(&app, record_body("1.2.3.4", "Poland", "Silesia", "Katowice")).await;

    let (status, _) = put_json(&app, "/ips/1.2.3.4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = put_json(&app, "/ips/9.9.9.9?city=Krakow").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_scenario() {
    let app = spawn_app().await;

    let (status, body) =
        create_record(&app, record_body("1.2.3.4", "poland", "silesia", "katowice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"]["country"], "Poland");

    let (status, body) = get_json(&app, "/ips/1.2.3.4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"][0]["country"], "Poland");

    let (status, body) = put_json(&app, "/ips/1.2.3.4?city=Krakow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"]["city"], "Krakow");
    assert_eq!(body["updated"]["country"], "Poland");

    let (status, body) = get_json(&app, "/ips/?country=Poland").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"][0]["ip_address"], "1.2.3.4");

    let (status, _) = get_json(&app, "/ips/?country=Germany").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
