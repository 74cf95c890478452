//! Integration tests for SwiftClient against a mocked Swift endpoint

use std::time::Duration;

use futures::TryStreamExt;
use futures::future::join_all;
use sc_core::{ClientConfig, Error, ObjectKey, ObjectStore, Storage, StorageSettings};
use sc_swift::{SwiftClient, content_md5};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OBJECT_PATH: &str = "/storage/container/test.txt";

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        auth_url: format!("{}/auth/", server.uri()),
        ..ClientConfig::new("test", "secret")
    }
}

fn client(server: &MockServer) -> SwiftClient {
    SwiftClient::new(&config(server)).unwrap()
}

fn key() -> ObjectKey {
    ObjectKey::new("container", "test.txt").unwrap()
}

/// Mount the auth handshake, answering with a token valid for `expires_in` seconds
async fn mount_auth(server: &MockServer, expires_in: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/auth/"))
        .and(header("X-Auth-User", "test"))
        .and(header("X-Auth-Key", "secret"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("X-Expire-Auth-Token", expires_in)
                .insert_header("X-Storage-Url", format!("{}/storage/", server.uri()))
                .insert_header("X-Auth-Token", "tok"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_returns_content() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .and(header("X-Auth-Token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("test_content"))
        .expect(1)
        .mount(&server)
        .await;

    let content = client(&server).get(&key()).await.unwrap();
    assert_eq!(content, "test_content");
}

#[tokio::test]
async fn test_get_error_carries_status() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Trans-Id", "tx1"))
        .mount(&server)
        .await;

    match client(&server).get(&key()).await {
        Err(Error::Api {
            status, headers, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(headers.get("x-trans-id").map(String::as_str), Some("tx1"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_put_sends_etag() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .and(header("ETag", content_md5(b"test_content").as_str()))
        .and(body_bytes(b"test_content".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).put(&key(), "test_content").await.unwrap());
}

#[tokio::test]
async fn test_put_requires_created() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client(&server).put(&key(), "test_content").await.unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_put_then_get_round_trips_multibyte_text() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    let content = "Кирилица Cirrilic ✓".as_bytes().to_vec();
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .and(body_bytes(content.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.put(&key(), content.clone()).await.unwrap();
    assert_eq!(client.get(&key()).await.unwrap().to_vec(), content);
}

#[tokio::test]
async fn test_put_stream_uploads_whole_payload() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .and(header("ETag", content_md5(b"hello world").as_str()))
        .and(body_bytes(b"hello world".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let parts = futures::stream::iter(vec![
        Ok(bytes::Bytes::from_static(b"hello ")),
        Ok(bytes::Bytes::from_static(b"world")),
    ]);
    let uploaded = client(&server)
        .put_stream(&key(), parts, Default::default())
        .await
        .unwrap();
    assert!(uploaded);
}

#[tokio::test]
async fn test_get_stream_yields_fixed_chunks() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    let body: Vec<u8> = (0..2560u32).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let stream = client(&server)
        .get_stream_with_chunk_size(&key(), 1024)
        .await
        .unwrap();
    let chunks: Vec<bytes::Bytes> = stream.try_collect().await.unwrap();

    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![1024, 1024, 512]);
    assert_eq!(chunks.concat(), body);
}

#[tokio::test]
async fn test_get_stream_fails_before_streaming() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).get_stream(&key()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_stream_rejects_zero_chunk_size() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 0).await;

    let result = client(&server).get_stream_with_chunk_size(&key(), 0).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_remove_force_tolerates_missing_object() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("DELETE"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Trans-Id", "tx404"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let headers = client.remove(&key(), true).await.unwrap();
    assert_eq!(headers.get("x-trans-id").unwrap(), "tx404");

    let err = client.remove(&key(), false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_remove_accepts_only_no_content() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("DELETE"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.remove(&key(), false).await.is_ok());

    let err = client.remove(&key(), true).await.unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_exists_follows_head_status() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.exists(&key()).await.unwrap());
    assert!(!client.exists(&key()).await.unwrap());
    assert_eq!(client.exists(&key()).await.unwrap_err().status(), Some(500));
}

#[tokio::test]
async fn test_size_reads_content_length() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "10000")
                .set_body_bytes(vec![0u8; 10000]),
        )
        .mount(&server)
        .await;

    assert_eq!(client(&server).size(&key()).await.unwrap(), 10000);
}

#[tokio::test]
async fn test_size_of_missing_object() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).size(&key()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_url_composes_storage_url() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;

    let key = ObjectKey::parse("container/dir/test.txt").unwrap();
    let url = client(&server).url(&key).await.unwrap();
    assert_eq!(url, format!("{}/storage/container/dir/test.txt", server.uri()));
}

#[tokio::test]
async fn test_missing_credentials_make_no_request() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 0).await;

    let config = ClientConfig {
        password: String::new(),
        max_retry: Some(3),
        ..config(&server)
    };
    let client = SwiftClient::new(&config).unwrap();

    assert!(matches!(client.authenticate().await, Err(Error::Config(_))));
    assert!(matches!(client.get(&key()).await, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_auth_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).exists(&key()).await.unwrap_err();
    assert!(matches!(err, Error::Auth { status: 403, .. }));
}

#[tokio::test]
async fn test_auth_failure_is_retried_by_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        max_retry: Some(2),
        ..config(&server)
    };
    let client = SwiftClient::new(&config).unwrap();
    assert!(client.exists(&key()).await.unwrap());
}

#[tokio::test]
async fn test_session_is_reused_while_valid() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    for _ in 0..3 {
        assert!(client.exists(&key()).await.unwrap());
    }
    assert!(!client.is_token_expired().await);
}

#[tokio::test]
async fn test_token_inside_threshold_is_refreshed_once_per_operation() {
    let server = MockServer::start().await;
    // 10 seconds left is always inside the default 1800 second threshold
    mount_auth(&server, "10", 2).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.exists(&key()).await.unwrap());
    assert!(client.is_token_expired().await);
    assert!(client.exists(&key()).await.unwrap());
}

#[tokio::test]
async fn test_unauthorized_triggers_single_reauthentication() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 2).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("test_content"))
        .expect(1)
        .mount(&server)
        .await;

    let content = client(&server).get(&key()).await.unwrap();
    assert_eq!(content, "test_content");
}

#[tokio::test]
async fn test_repeated_unauthorized_is_not_retried_without_policy() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 2).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server).get(&key()).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_retry_stops_after_max_attempts() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(5)
        .expect(3)
        .mount(&server)
        .await;

    let config = ClientConfig {
        max_retry: Some(3),
        retry_delay_secs: 0.0,
        ..config(&server)
    };
    let err = SwiftClient::new(&config)
        .unwrap()
        .get(&key())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("test_content"))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        max_retry: Some(3),
        retry_delay_secs: 0.01,
        ..config(&server)
    };
    let content = SwiftClient::new(&config)
        .unwrap()
        .get(&key())
        .await
        .unwrap();
    assert_eq!(content, "test_content");
}

#[tokio::test]
async fn test_concurrent_callers_authenticate_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("X-Expire-Auth-Token", "3600")
                .insert_header("X-Storage-Url", format!("{}/storage/", server.uri()))
                .insert_header("X-Auth-Token", "tok")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(8)
        .mount(&server)
        .await;

    let client = client(&server);
    let tasks = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.exists(&key()).await })
    });

    for result in join_all(tasks).await {
        assert!(result.unwrap().unwrap());
    }
}

#[tokio::test]
async fn test_storage_adapter_over_swift_client() {
    let server = MockServer::start().await;
    mount_auth(&server, "3600", 1).await;
    Mock::given(method("HEAD"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Storage::new(client(&server), StorageSettings::default());
    let name = storage
        .save("container/test.txt", b"test_content")
        .await
        .unwrap();
    assert_eq!(name, "container/test.txt");
    assert!(!storage.store().object_exists(&key()).await.unwrap());
}
