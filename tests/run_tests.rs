//! End-to-end tests for a scheduled run driven by a config file
//!
//! The database lives in a temporary directory so that a second run sees
//! what the first one stored.

use sitewatch::config::parse_config;
use sitewatch::crawler::crawl;
use sitewatch::state::SiteStatus;
use sitewatch::storage::{open_storage, Storage};
use sitewatch::Config;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(db_path: &Path, sites: &[(&str, String)]) -> Config {
    let mut toml = format!(
        r#"
[fetcher]
timeout-secs = 5
connect-timeout-secs = 1

[user-agent]
crawler-name = "TestWatcher"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[crawler]
max-concurrent-crawls = 4

[storage]
database-path = "{}"
"#,
        db_path.display()
    );

    for (name, url) in sites {
        toml.push_str(&format!("\n[[site]]\nname = \"{}\"\nurl = \"{}\"\n", name, url));
    }

    parse_config(&toml).expect("test config should be valid")
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_run_registers_and_crawls_configured_sites() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Headlines"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("watch.db");
    let config = config_for(
        &db_path,
        &[
            ("News", format!("{}/news", server.uri())),
            ("Gone", format!("http://127.0.0.1:{}/", closed_port())),
        ],
    );

    let summary = crawl(&config).await.unwrap();
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(summary.failed, 1);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_total_sites().unwrap(), 2);
    assert_eq!(storage.count_total_versions().unwrap(), 1);
    assert_eq!(storage.count_sites_by_status(SiteStatus::ExistDiff).unwrap(), 1);
    assert_eq!(storage.count_sites_by_status(SiteStatus::Failed).unwrap(), 1);
}

#[tokio::test]
async fn test_second_run_sees_previous_versions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Stable"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("watch.db");
    let config = config_for(&db_path, &[("Page", format!("{}/page", server.uri()))]);

    let first = crawl(&config).await.unwrap();
    assert_eq!(first.changed, 1);

    let second = crawl(&config).await.unwrap();
    assert_eq!(second.changed, 0);
    assert_eq!(second.unchanged, 1);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_total_sites().unwrap(), 1);
    assert_eq!(storage.count_total_versions().unwrap(), 1);
    assert_eq!(storage.count_sites_by_status(SiteStatus::NonDiff).unwrap(), 1);
}

#[tokio::test]
async fn test_run_with_no_sites() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir.path().join("watch.db"), &[]);

    let summary = crawl(&config).await.unwrap();
    assert_eq!(summary.total(), 0);
}
