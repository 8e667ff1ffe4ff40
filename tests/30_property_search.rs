mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use serde_json::{json, Value};

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn properties(published_column: Option<&str>) -> Value {
    let rows: Vec<Value> = [
        ("p1", "Yourte du lac", "Annecy", 80, true, "2024-01-01T00:00:00Z"),
        ("p2", "Cabane perchee", "Vercors", 120, false, "2024-02-01T00:00:00Z"),
        ("p3", "Tipi des pins", "Landes", 60, true, "2024-03-01T00:00:00Z"),
    ]
    .iter()
    .map(|(id, name, location, price, published, created_at)| {
        let mut row = json!({
            "id": id,
            "name": name,
            "location": location,
            "price_per_night": price,
            "created_at": created_at
        });
        if let (Some(column), Some(obj)) = (published_column, row.as_object_mut()) {
            obj.insert(column.to_string(), json!(published));
        }
        row
    })
    .collect();
    json!({ "properties": rows, "bookings": [] })
}

#[tokio::test]
async fn published_filter_works_with_either_spelling() -> Result<()> {
    let plain = common::TestApp::with_fixtures(properties(Some("published")))?;
    let prefixed = common::TestApp::with_fixtures(properties(Some("is_published")))?;
    let neither = common::TestApp::with_fixtures(properties(None))?;

    let uri = "/api/properties/search?published=true";
    let a = plain.get(uri, None).await?;
    let b = prefixed.get(uri, None).await?;
    let c = neither.get(uri, None).await?;

    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(ids(&a.body), vec!["p3", "p1"]);
    assert_eq!(ids(&a.body), ids(&b.body));
    assert_eq!(ids(&c.body), vec!["p3", "p2", "p1"]);
    assert_eq!(c.body["count"], json!(3));
    Ok(())
}

#[tokio::test]
async fn search_is_public_and_not_cached() -> Result<()> {
    let app = common::TestApp::with_fixtures(properties(Some("published")))?;

    let res = app.get("/api/properties/search?q=yourte", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], json!(true));
    assert_eq!(ids(&res.body), vec!["p1"]);
    assert_eq!(res.headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    Ok(())
}

#[tokio::test]
async fn combines_price_and_location_filters() -> Result<()> {
    let app = common::TestApp::with_fixtures(properties(Some("published")))?;

    let res = app
        .get("/api/properties/search?minPrice=50&maxPrice=100&location=an", None)
        .await?;
    // Annecy (80) and Landes (60) both match "an" within the price band.
    assert_eq!(ids(&res.body), vec!["p3", "p1"]);
    Ok(())
}

#[tokio::test]
async fn rejects_non_integer_price() -> Result<()> {
    let app = common::TestApp::with_fixtures(properties(Some("published")))?;

    let res = app.get("/api/properties/search?maxPrice=abc", None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], json!("BAD_REQUEST"));
    assert_eq!(app.store.query_count(), 0);
    Ok(())
}

#[tokio::test]
async fn malformed_query_string_is_a_structured_bad_request() -> Result<()> {
    let app = common::TestApp::with_fixtures(properties(Some("published")))?;

    let res = app.get("/api/properties/search?location=a&location=b", None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], json!("BAD_REQUEST"));
    assert_eq!(res.headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(app.store.query_count(), 0);
    Ok(())
}

#[tokio::test]
async fn wildcard_heavy_search_terms_complete() -> Result<()> {
    let app = common::TestApp::with_fixtures(json!({
        "properties": [{
            "id": "p1",
            "name": "a".repeat(40),
            "location": "a".repeat(40),
            "created_at": "2024-01-01T00:00:00Z"
        }],
        "bookings": []
    }))?;

    let res = app.get("/api/properties/search?q=%25%25%25%25%25%25%25%25%25%25%25%25%25b", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], json!(0));
    Ok(())
}
