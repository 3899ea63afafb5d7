use sha2::{Digest, Sha256};
use std::time::Duration;
use tempfile::TempDir;
use tsupdate::core::UpdateError;
use tsupdate::update::download::Downloader;
use tsupdate::update::{HttpFetcher, Track, VersionResolver};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);
const ARTIFACT: &str = "/unstable/tailscale-setup-1.45.3-amd64.msi";

fn artifact_body() -> Vec<u8> {
    (0..=255u8).cycle().take(4096).collect()
}

async fn mount_artifact(server: &MockServer, body: &[u8], checksum: &str) {
    Mock::given(method("HEAD"))
        .and(path(ARTIFACT))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", body.len().to_string().as_str())
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ARTIFACT}.sha256")))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{checksum}\n")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(ARTIFACT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_latest_version_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stable/"))
        .and(query_param("mode", "json"))
        .and(query_param("os", "linux"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Version":"1.46.2"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let base = server.uri();
    let resolver = VersionResolver::new(&fetcher, &base, "linux", TIMEOUT);
    assert_eq!(resolver.latest(Track::Stable).await.unwrap(), "1.46.2");
}

#[tokio::test]
async fn test_latest_version_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unstable/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let base = server.uri();
    let resolver = VersionResolver::new(&fetcher, &base, "linux", TIMEOUT);
    let err = resolver.latest(Track::Unstable).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Network { .. })));
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn test_download_verified() {
    let server = MockServer::start().await;
    let body = artifact_body();
    mount_artifact(&server, &body, &hex::encode(Sha256::digest(&body))).await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("tailscale-setup-1.45.3-amd64.msi");
    let fetcher = HttpFetcher::new().unwrap();
    let downloader = Downloader::new(&fetcher, TIMEOUT, Duration::from_secs(2));
    let url = format!("{}{ARTIFACT}", server.uri());

    let artifact = downloader.download(&url, &dest).await.unwrap();
    assert_eq!(artifact.declared_length, 4096);
    assert_eq!(artifact.local_path, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn test_download_checksum_mismatch() {
    let server = MockServer::start().await;
    let body = artifact_body();
    mount_artifact(&server, &body, &hex::encode(Sha256::digest(b"something else"))).await;

    let dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new().unwrap();
    let downloader = Downloader::new(&fetcher, TIMEOUT, Duration::from_secs(2));
    let url = format!("{}{ARTIFACT}", server.uri());

    let err = downloader.download(&url, &dir.path().join("pkg.msi")).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Integrity { .. })));
    assert!(err.to_string().contains("didn't match expected value"));
}

#[tokio::test]
async fn test_download_missing_artifact_skips_body() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(ARTIFACT))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new().unwrap();
    let downloader = Downloader::new(&fetcher, TIMEOUT, Duration::from_secs(2));
    let url = format!("{}{ARTIFACT}", server.uri());

    let err = downloader.download(&url, &dir.path().join("pkg.msi")).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Network { .. })));
    assert!(err.to_string().contains("HTTP 404"));
}
