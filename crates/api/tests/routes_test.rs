//! Router tests against a mocked database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use kvitto_api::{AppState, create_router};
use kvitto_db::entities::expense_records;

fn record_model(
    owner: &str,
    merchant: &str,
    date: (i32, u32, u32),
    amount: rust_decimal::Decimal,
    tax: Option<rust_decimal::Decimal>,
    category: &str,
) -> expense_records::Model {
    let now = Utc::now().fixed_offset();
    expense_records::Model {
        id: Uuid::new_v4(),
        owner: owner.to_string(),
        image_key: None,
        merchant: merchant.to_string(),
        transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        amount,
        tax,
        category: category.to_string(),
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

fn state_with_rows(rows: Vec<expense_records::Model>) -> AppState {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([rows])
        .into_connection();
    AppState {
        db: Arc::new(db),
        storage: None,
        analyzer: None,
        profiles: Arc::new(vec![]),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_check() {
    let app = create_router(state_with_rows(vec![]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_list_records_requires_owner_header() {
    let app = create_router(state_with_rows(vec![]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/records")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "missing_owner");
}

#[tokio::test]
async fn test_unknown_profile_is_forbidden() {
    let mut state = state_with_rows(vec![]);
    state.profiles = Arc::new(vec!["alice".to_string(), "bob".to_string()]);
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/records")
                .header("X-Owner", "carol")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unknown_owner");
}

#[tokio::test]
async fn test_list_records_formats_money_and_derives_tax() {
    let rows = vec![record_model(
        "alice",
        "Cafe Aurora",
        (2024, 3, 15),
        dec!(100.00),
        None,
        "Meals",
    )];
    let app = create_router(state_with_rows(rows));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/records")
                .header("X-Owner", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let record = &body[0];
    assert_eq!(record["amount"], "100.00");
    assert_eq!(record["tax"], Value::Null);
    assert_eq!(record["effective_tax"], "4.76");
    assert_eq!(record["pre_tax"], "95.24");
}

#[tokio::test]
async fn test_month_without_year_is_invalid_filter() {
    let app = create_router(state_with_rows(vec![]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/records?month=3")
                .header("X-Owner", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_filter");
}

#[tokio::test]
async fn test_create_record_rejects_tax_above_amount() {
    let app = create_router(state_with_rows(vec![]));

    let payload = serde_json::json!({
        "merchant": "Cafe Aurora",
        "transaction_date": "2024-03-15",
        "amount": "10.00",
        "tax": "12.00",
        "category": "Meals"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/records")
                .header("X-Owner", "alice")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_summary_reports_totals_and_category_order() {
    // 100.00 with no stored tax derives 4.76; 55.00 with stored 10.24 keeps it.
    let rows = vec![
        record_model("alice", "Cafe Aurora", (2024, 3, 15), dec!(100.00), None, "Meals"),
        record_model(
            "alice",
            "Nordic Rail",
            (2024, 3, 20),
            dec!(55.00),
            Some(dec!(10.24)),
            "Travel",
        ),
    ];
    let app = create_router(state_with_rows(rows));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/reports/summary?owner=alice&year=2024&month=3")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_amount"], "155.00");
    assert_eq!(body["total_tax"], "15.00");
    assert_eq!(body["total_pre_tax"], "140.00");
    assert_eq!(body["record_count"], 2);

    // Largest category total first.
    assert_eq!(body["by_category"][0]["category"], "Meals");
    assert_eq!(body["by_category"][0]["total"], "100.00");
    assert_eq!(body["by_category"][1]["category"], "Travel");
}

#[tokio::test]
async fn test_spreadsheet_export_headers_and_magic() {
    let rows = vec![record_model(
        "alice",
        "Cafe Aurora",
        (2024, 3, 15),
        dec!(100.00),
        None,
        "Meals",
    )];
    let app = create_router(state_with_rows(rows));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/reports/export/spreadsheet?owner=alice&year=2024")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("header");
    assert!(disposition.contains("expense-report-"));
    assert!(disposition.ends_with(".xlsx\""));

    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_document_export_headers_and_magic() {
    let rows = vec![record_model(
        "alice",
        "Cafe Aurora",
        (2024, 3, 15),
        dec!(100.00),
        None,
        "Meals",
    )];
    let app = create_router(state_with_rows(rows));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/reports/export/document?owner=alice&year=2024")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_receipt_routes_without_storage_are_unavailable() {
    let rows = vec![record_model(
        "alice",
        "Cafe Aurora",
        (2024, 3, 15),
        dec!(100.00),
        None,
        "Meals",
    )];
    let id = rows[0].id;
    let app = create_router(state_with_rows(rows));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/records/{id}/receipt"))
                .header("X-Owner", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "storage_not_configured");
}
