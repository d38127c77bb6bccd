//! Tests for the REST front-end.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use da_gateway_config::{MemstoreConfig, ObjectStoreConfig, StorageConfig};
use da_gateway_da_clients::memstore::{encode_payload, MemstoreCert};
use da_gateway_store::builder::build_storage;
use da_gateway_types::{keccak256, EigenDABackend, VersionByte};
use http_body_util::BodyExt as _;
use tower::ServiceExt;

use crate::RestApi;

const MAX_BODY_BYTES: usize = 1_024;

struct TestClient {
    router: Router,
}

impl TestClient {
    async fn new(storage: StorageConfig, object_store: Option<ObjectStoreConfig>) -> Self {
        let memstore = MemstoreConfig {
            enabled: true,
            ..MemstoreConfig::default()
        };
        let components = build_storage(&storage, &memstore, object_store)
            .await
            .unwrap();
        let api = RestApi::new(components.manager, components.keccak_manager);
        Self {
            router: api.into_router(MAX_BODY_BYTES),
        }
    }

    async fn with_defaults() -> Self {
        let storage = StorageConfig {
            backends_to_enable: vec![EigenDABackend::V1, EigenDABackend::V2],
            ..StorageConfig::default()
        };
        Self::new(storage, Some(ObjectStoreConfig::for_tests())).await
    }

    async fn send(&self, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn put(&self, payload: &[u8]) -> Vec<u8> {
        let (status, commitment) = self.send(Method::POST, "/put", payload.to_vec()).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&commitment));
        commitment
    }

    async fn get(&self, commitment: &[u8], query: &str) -> (StatusCode, Vec<u8>) {
        let uri = format!("/get/0x{}{query}", hex::encode(commitment));
        self.send(Method::GET, &uri, Body::empty()).await
    }

    async fn set_backend(&self, backend: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/admin/dispersal-backend")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"backend":"{backend}"}}"#)))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }
}

#[tokio::test]
async fn health_check() {
    let client = TestClient::with_defaults().await;
    let (status, body) = client.send(Method::GET, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn payload_round_trip() {
    let client = TestClient::with_defaults().await;
    let commitment = client.put(b"rollup batch").await;
    assert_eq!(commitment[0], u8::from(VersionByte::V2));

    let (status, payload) = client.get(&commitment, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, b"rollup batch");

    let (status, encoded) = client.get(&commitment, "?return_encoded_payload=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(encoded, encode_payload(b"rollup batch"));
}

#[tokio::test]
async fn switching_dispersal_backend() {
    let client = TestClient::with_defaults().await;
    let (status, body) = client
        .send(Method::GET, "/admin/dispersal-backend", Body::empty())
        .await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, serde_json::json!({ "backend": "v2" }));

    let (status, body) = client.set_backend("v1").await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, serde_json::json!({ "backend": "v1" }));

    let commitment = client.put(b"legacy batch").await;
    assert_eq!(commitment[0], u8::from(VersionByte::V0));
    let (status, payload) = client.get(&commitment, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, b"legacy batch");

    // Encoded payloads are only available for V2 certs.
    let (status, _) = client.get(&commitment, "?return_encoded_payload=true").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.set_backend("v3").await;
    assert!(status.is_client_error(), "{status}");
}

#[tokio::test]
async fn malformed_commitments_are_rejected() {
    let client = TestClient::with_defaults().await;
    let (status, _) = client.send(Method::GET, "/get/0xnothex", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client.get(&[9, 1, 2, 3], "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("version byte"));

    let (status, _) = client.get(&[2], "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stale_certs_are_rejected_with_teapot() {
    let client = TestClient::with_defaults().await;
    let cert = MemstoreCert {
        reference_block_number: 1_000,
        payload_digest: keccak256(b"payload"),
        nonce: 0,
    };
    let mut commitment = vec![u8::from(VersionByte::V2)];
    commitment.extend_from_slice(&cert.encode());

    let (status, body) = client
        .get(&commitment, "?l1_inclusion_block_number=1000000")
        .await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert!(String::from_utf8_lossy(&body).contains("cert verification failed"));
}

#[tokio::test]
async fn unknown_certs_result_in_server_error() {
    let client = TestClient::with_defaults().await;
    let cert = MemstoreCert {
        reference_block_number: 1_000,
        payload_digest: keccak256(b"payload"),
        nonce: 0,
    };
    let mut commitment = vec![u8::from(VersionByte::V2)];
    commitment.extend_from_slice(&cert.encode());

    let (status, body) = client.get(&commitment, "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"internal server error");
}

#[tokio::test]
async fn missing_payloads_across_tiers_result_in_server_error() {
    let storage = StorageConfig {
        cache_targets: vec!["memstore_v2".to_owned()],
        ..StorageConfig::default()
    };
    let client = TestClient::new(storage, None).await;
    let cert = MemstoreCert {
        reference_block_number: 1_000,
        payload_digest: keccak256(b"payload"),
        nonce: 0,
    };
    let mut commitment = vec![u8::from(VersionByte::V2)];
    commitment.extend_from_slice(&cert.encode());

    let (status, body) = client.get(&commitment, "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"internal server error");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let client = TestClient::with_defaults().await;
    let (status, _) = client
        .send(Method::POST, "/put", vec![0_u8; MAX_BODY_BYTES + 1])
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn keccak_preimages() {
    let client = TestClient::with_defaults().await;
    let key = hex::encode(keccak256(b"preimage"));

    let (status, _) = client
        .send(Method::PUT, &format!("/put/0x{key}"), b"preimage".to_vec())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, preimage) = client
        .send(Method::GET, &format!("/get/keccak/0x{key}"), Body::empty())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preimage, b"preimage");

    let (status, _) = client
        .send(Method::PUT, &format!("/put/0x{key}"), b"other".to_vec())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = hex::encode(keccak256(b"missing"));
    let (status, _) = client
        .send(Method::GET, &format!("/get/keccak/0x{missing}"), Body::empty())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn keccak_requires_object_store() {
    let client = TestClient::new(StorageConfig::default(), None).await;
    let key = hex::encode(keccak256(b"preimage"));
    let (status, body) = client
        .send(Method::PUT, &format!("/put/0x{key}"), b"preimage".to_vec())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("not supported"));
}

#[tokio::test]
async fn payloads_are_replicated_to_secondary_storage() {
    let storage = StorageConfig {
        cache_targets: vec!["memstore_v2".to_owned()],
        fallback_targets: vec!["object_store".to_owned()],
        ..StorageConfig::default()
    };
    let client = TestClient::new(storage, Some(ObjectStoreConfig::for_tests())).await;
    let commitment = client.put(b"cached batch").await;
    let (status, payload) = client.get(&commitment, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, b"cached batch");
}
