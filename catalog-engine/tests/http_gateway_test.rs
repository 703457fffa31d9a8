//! HttpCatalogGateway tests against a local axum fixture.

use std::collections::BTreeSet;
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use catalog_engine::error::{FetchError, SaveError};
use catalog_engine::gateway::{HttpCatalogGateway, RemoteCatalogGateway};
use catalog_types::{CatalogEntry, ProcedureDescriptor};

fn entry(key: &str, price: Option<i64>) -> CatalogEntry {
    CatalogEntry {
        key: key.into(),
        enabled: true,
        price_override: price,
        duration_override_minutes: None,
    }
}

async fn get_catalog(Path(provider_id): Path<String>) -> Response {
    match provider_id.as_str() {
        "prov-1" => Json(vec![entry("vac01", Some(1500)), entry("dent02", None)]).into_response(),
        "garbled" => (StatusCode::OK, "<html>not a catalog</html>").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown provider" })),
        )
            .into_response(),
    }
}

async fn put_catalog(
    Path(provider_id): Path<String>,
    Json(mut payload): Json<Vec<CatalogEntry>>,
) -> Response {
    if provider_id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    if payload.iter().any(|e| e.price_override.is_some_and(|p| p < 0)) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "", "message": "price must not be negative" })),
        )
            .into_response();
    }
    // Server-side correction: durations are rounded up to 5 minutes.
    for entry in &mut payload {
        if let Some(minutes) = entry.duration_override_minutes {
            entry.duration_override_minutes = Some(minutes.div_ceil(5) * 5);
        }
    }
    Json(payload).into_response()
}

async fn get_procedures() -> Json<Vec<ProcedureDescriptor>> {
    Json(vec![ProcedureDescriptor {
        key: "consult01".into(),
        display_name: "General consult".to_string(),
        compatible_species: ["canine", "feline"]
            .iter()
            .map(|s| s.to_string())
            .collect::<BTreeSet<_>>(),
    }])
}

async fn spawn_fixture() -> String {
    let app = Router::new()
        .route(
            "/api/providers/{provider_id}/catalog",
            get(get_catalog).put(put_catalog),
        )
        .route("/api/procedures", get(get_procedures));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fixture listener");
    let addr = listener.local_addr().expect("Failed to read fixture addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server failed");
    });
    format!("http://{addr}/api/")
}

async fn gateway_for(provider_id: &str) -> HttpCatalogGateway {
    let base_url = spawn_fixture().await;
    HttpCatalogGateway::new(base_url, provider_id, Duration::from_secs(5))
        .expect("Failed to build gateway")
}

#[tokio::test]
async fn test_fetch_catalog_and_procedures() {
    let gateway = gateway_for("prov-1").await;

    let catalog = gateway.fetch_catalog().await.unwrap();
    assert_eq!(catalog, vec![entry("vac01", Some(1500)), entry("dent02", None)]);

    let procedures = gateway.fetch_master_procedures().await.unwrap();
    assert_eq!(procedures.len(), 1);
    assert!(procedures[0].supports_species("Canine"));
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let gateway = gateway_for("missing").await;

    let err = gateway.fetch_catalog().await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 404,
            message: "unknown provider".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unreadable_body_is_a_decode_error() {
    let gateway = gateway_for("garbled").await;

    let err = gateway.fetch_catalog().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_save_returns_server_corrected_catalog() {
    let gateway = gateway_for("prov-1").await;
    let mut timed = entry("dent02", None);
    timed.duration_override_minutes = Some(42);

    let saved = gateway
        .save(vec![entry("vac01", Some(1500)), timed])
        .await
        .unwrap();

    assert_eq!(saved[0], entry("vac01", Some(1500)));
    assert_eq!(saved[1].duration_override_minutes, Some(45));
}

#[tokio::test]
async fn test_validation_failure_echoes_payload() {
    let gateway = gateway_for("prov-1").await;
    let payload = vec![entry("vac01", Some(-5))];

    let err = gateway.save(payload.clone()).await.unwrap_err();
    assert_eq!(
        err,
        SaveError::Rejected {
            reason: "price must not be negative".to_string(),
            payload,
        }
    );
}

#[tokio::test]
async fn test_server_failure_on_save_is_transport() {
    let gateway = gateway_for("broken").await;

    let err = gateway.save(vec![entry("vac01", None)]).await.unwrap_err();
    match err {
        SaveError::Transport(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("database unavailable"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport() {
    let gateway =
        HttpCatalogGateway::new("http://127.0.0.1:9", "prov-1", Duration::from_millis(500))
            .unwrap();

    let err = gateway.fetch_catalog().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
