//! Integration tests for the command-line entry point.

use camino::Utf8PathBuf;
use serde_json::{Value, json};
use tosdr_harvest_lib::Host;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
#[derive(Default)]
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
    exit_code: Option<i32>,
}

impl TestHost {
    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

/// Configuration that keeps every pause at zero so crawls finish quickly.
const FAST_CONFIG: &str = r#"
base_backoff = "0s"
transient_backoff = "0s"
request_timeout = "5s"
jitter_min = "0ms"
jitter_max = "0ms"
workers = 2
max_empty_pages = 1
"#;

fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().join(name)).unwrap()
}

async fn catalog() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/service/v3/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": [{"id": 182}, {"id": 9}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/v3/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/v3/"))
        .and(query_param("id", "182"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parameters": {
                "name": "Wikipédia",
                "rating": {"human": "Grade B"},
                "documents": [{"name": "Privacy Policy", "url": "https://foundation.wikimedia.org/wiki/Privacy_policy"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/v3/"))
        .and(query_param("id", "9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_crawl_writes_dataset() {
    let server = catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let config = temp_path(&dir, "tosdr-harvest.toml");
    std::fs::write(&config, FAST_CONFIG).unwrap();
    let output = temp_path(&dir, "data/TOSDR/tosdr_links_only.json");

    let uri = server.uri();
    let mut host = TestHost::default();
    tosdr_harvest_lib::run(
        &mut host,
        [
            "tosdr-harvest",
            "crawl",
            "--config",
            config.as_str(),
            "--output",
            output.as_str(),
            "--base-url",
            uri.as_str(),
            "--color",
            "never",
        ],
    )
    .await
    .unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("Wikipédia"), "non-ASCII text should be written verbatim");

    let dataset: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        dataset,
        json!([{
            "id": 182,
            "name": "Wikipédia",
            "rating": "Grade B",
            "documents": [{"title": "Privacy Policy", "url": "https://foundation.wikimedia.org/wiki/Privacy_policy"}]
        }])
    );

    let out = host.output_str();
    assert!(out.contains(&format!("Saved 1 services to {output}")), "{out}");
    assert!(out.contains("1 of 2 services yielded no usable data"), "{out}");
    assert!(out.contains("\"name\": \"Wikipédia\""), "{out}");
    assert_eq!(host.exit_code, None);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_crawl_fails_when_index_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = temp_path(&dir, "tosdr-harvest.toml");
    std::fs::write(&config, FAST_CONFIG).unwrap();
    let output = temp_path(&dir, "out.json");

    let uri = server.uri();
    let mut host = TestHost::default();
    let result = tosdr_harvest_lib::run(
        &mut host,
        [
            "tosdr-harvest",
            "crawl",
            "--config",
            config.as_str(),
            "--output",
            output.as_str(),
            "--base-url",
            uri.as_str(),
        ],
    )
    .await;

    assert!(result.is_err());
    assert_eq!(host.exit_code, Some(1));
    assert!(host.error_str().contains("Crawl failed"), "{}", host.error_str());
    assert!(!output.exists(), "no dataset should be written on failure");
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_init_then_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_path(&dir, "generated.toml");

    let mut host = TestHost::default();
    tosdr_harvest_lib::run(&mut host, ["tosdr-harvest", "init", "--output", config.as_str()])
        .await
        .unwrap();
    assert!(config.exists());

    let mut host = TestHost::default();
    tosdr_harvest_lib::run(&mut host, ["tosdr-harvest", "validate", "--config", config.as_str()])
        .await
        .unwrap();
    assert!(host.output_str().contains("Configuration file is valid"));

    let mut host = TestHost::default();
    let again = tosdr_harvest_lib::run(&mut host, ["tosdr-harvest", "init", "--output", config.as_str()]).await;
    assert!(again.is_err(), "init must not overwrite without --force");
}
