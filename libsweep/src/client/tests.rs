use super::*;
use mockito::Matcher;

fn test_client(server: &mockito::ServerGuard) -> RegistryClient {
    let config = ClientConfig::new()
        .with_base_url(server.url())
        .with_credentials(Credentials::Token("secret-key".to_string()))
        .with_retry(RetryPolicy::default().with_unit(Duration::from_millis(1)));
    RegistryClient::new(config).unwrap()
}

fn tag_json(id: &str, name: &str, created_at: &str) -> String {
    format!(
        r#"{{"id": "{id}", "name": "{name}", "image_id": "img-1", "status": "ready", "digest": "sha256:{id}", "created_at": "{created_at}"}}"#
    )
}

// Construction

#[test]
fn test_client_defaults_to_fr_par() {
    let client = RegistryClient::new(ClientConfig::new()).unwrap();
    assert_eq!(
        client.base_url(),
        "https://api.scaleway.com/registry/v1/regions/fr-par"
    );
}

#[test]
fn test_client_with_region() {
    let client = RegistryClient::new(ClientConfig::new().with_region(Region::PlWaw)).unwrap();
    assert_eq!(
        client.base_url(),
        "https://api.scaleway.com/registry/v1/regions/pl-waw"
    );
}

#[test]
fn test_client_with_base_url_removes_trailing_slashes() {
    let client =
        RegistryClient::new(ClientConfig::new().with_base_url("http://localhost:8080/v1//"))
            .unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080/v1");
}

#[test]
fn test_client_region_and_base_url_conflict() {
    let config = ClientConfig::new()
        .with_region(Region::FrPar)
        .with_base_url("http://localhost:8080");

    let result = RegistryClient::new(config);
    assert!(matches!(result, Err(SweepError::Config { .. })));
}

#[test]
fn test_client_invalid_base_url() {
    let result = RegistryClient::new(ClientConfig::new().with_base_url("not a url"));
    assert!(matches!(result, Err(SweepError::Config { .. })));
}

#[test]
fn test_client_empty_base_url() {
    let result = RegistryClient::new(ClientConfig::new().with_base_url("   "));
    assert!(matches!(result, Err(SweepError::Config { .. })));
}

#[test]
fn test_client_rejects_non_http_scheme() {
    let result = RegistryClient::new(ClientConfig::new().with_base_url("ftp://example.com"));
    assert!(matches!(result, Err(SweepError::Config { .. })));
}

#[test]
fn test_client_rejects_credentials_with_newline() {
    let config = ClientConfig::new().with_credentials(Credentials::Token("bad\nkey".to_string()));
    assert!(matches!(
        RegistryClient::new(config),
        Err(SweepError::Config { .. })
    ));
}

#[test]
fn test_region_from_str() {
    assert_eq!("fr-par".parse::<Region>().unwrap(), Region::FrPar);
    assert_eq!("nl-ams".parse::<Region>().unwrap(), Region::NlAms);
    assert_eq!(" pl-waw ".parse::<Region>().unwrap(), Region::PlWaw);
    assert!(matches!(
        "us-east".parse::<Region>(),
        Err(SweepError::Config { .. })
    ));
}

#[test]
fn test_region_display() {
    assert_eq!(Region::NlAms.to_string(), "nl-ams");
}

#[test]
fn test_credentials_debug_hides_secret() {
    let debug = format!("{:?}", Credentials::Token("super-secret".to_string()));
    assert!(!debug.contains("super-secret"));
}

#[test]
fn test_client_config_defaults() {
    let config = ClientConfig::new();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.read_timeout, Duration::from_secs(20));
    assert_eq!(config.retry, RetryPolicy::default());
    assert!(config.user_agent.starts_with("sweep/"));
    assert!(!config.echo_bodies);
}

#[test]
fn test_client_config_from_config() {
    let yaml = r#"
registry:
  region: nl-ams
network:
  connect_timeout: 2
  read_timeout: 8
retry:
  max_retries: 1
  max_delay: 4
"#;
    let config = Config::from_yaml_str(yaml).unwrap();
    let client_config = ClientConfig::from_config(&config).unwrap();

    assert_eq!(client_config.region, Some(Region::NlAms));
    assert_eq!(client_config.connect_timeout, Duration::from_secs(2));
    assert_eq!(client_config.read_timeout, Duration::from_secs(8));
    assert_eq!(client_config.retry.max_retries, 1);
    assert_eq!(client_config.retry.max_backoff, 4);
}

#[test]
fn test_client_config_from_config_unknown_region() {
    let mut config = Config::default();
    config.registry.region = Some("mars-1".to_string());
    assert!(ClientConfig::from_config(&config).is_err());
}

#[test]
fn test_delete_batch_size_from_read_timeout() {
    let client = RegistryClient::new(ClientConfig::new()).unwrap();
    assert_eq!(client.delete_batch_size(), 10);

    let client = RegistryClient::new(
        ClientConfig::new().with_timeouts(Duration::from_secs(5), Duration::from_secs(1)),
    )
    .unwrap();
    assert_eq!(client.delete_batch_size(), 1);
}

// Namespaces

#[tokio::test]
async fn test_list_namespaces_sends_name_and_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::UrlEncoded("name".into(), "team-a".into()))
        .match_header("x-auth-token", "secret-key")
        .match_header("user-agent", Matcher::Regex("^sweep/".into()))
        .with_status(200)
        .with_body(r#"{"namespaces": [{"id": "ns-1", "name": "team-a"}], "total_count": 1}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let namespaces = client.list_namespaces("team-a").await.unwrap();

    mock.assert_async().await;
    assert_eq!(namespaces.len(), 1);
    assert_eq!(namespaces[0].id, "ns-1");
}

#[tokio::test]
async fn test_session_jwt_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::Any)
        .match_header("x-session-token", "jwt-value")
        .match_header("x-auth-token", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"namespaces": []}"#)
        .create_async()
        .await;

    let config = ClientConfig::new()
        .with_base_url(server.url())
        .with_credentials(Credentials::SessionJwt("jwt-value".to_string()));
    let client = RegistryClient::new(config).unwrap();
    client.list_namespaces("team-a").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_namespace_picks_exact_name() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"namespaces": [
                {"id": "ns-2", "name": "team-a-staging"},
                {"id": "ns-1", "name": "team-a"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = test_client(&server);
    let namespace = client.namespace("team-a").await.unwrap();
    assert_eq!(namespace.id, "ns-1");
}

#[tokio::test]
async fn test_namespace_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"namespaces": []}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let result = client.namespace("ghost").await;

    match result {
        Err(SweepError::NotFound {
            resource_type,
            name,
        }) => {
            assert_eq!(resource_type, "namespace");
            assert_eq!(name, "ghost");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_namespaces_retries_maintenance() {
    let mut server = mockito::Server::new_async().await;
    let maintenance = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/namespaces")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"namespaces": [{"id": "ns-1", "name": "team-a"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server);
    let namespaces = client.list_namespaces("team-a").await.unwrap();

    maintenance.assert_async().await;
    ok.assert_async().await;
    assert_eq!(namespaces.len(), 1);
}

// Images

#[tokio::test]
async fn test_list_images_paginates_until_empty_page() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/images")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("namespace_id".into(), "ns-1".into()),
            Matcher::UrlEncoded("page_size".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"images": [{"id": "img-1", "name": "api"}, {"id": "img-2", "name": "worker"}]}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/images")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("namespace_id".into(), "ns-1".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"images": []}"#)
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server);
    let images = client.list_images("ns-1", None).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let names: Vec<_> = images.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["api", "worker"]);
}

#[tokio::test]
async fn test_list_images_with_name_filter() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/images")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("namespace_id".into(), "ns-1".into()),
            Matcher::UrlEncoded("name".into(), "api".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"images": []}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let images = client.list_images("ns-1", Some("api")).await.unwrap();

    mock.assert_async().await;
    assert!(images.is_empty());
}

// Tags

#[tokio::test]
async fn test_list_tags_paginates_until_empty_page() {
    let mut server = mockito::Server::new_async().await;
    let page_one = format!(
        r#"{{"tags": [{}, {}]}}"#,
        tag_json("t1", "v1", "2024-01-01T00:00:00Z"),
        tag_json("t2", "v2", "2024-01-02T00:00:00Z")
    );
    let page_two = format!(
        r#"{{"tags": [{}]}}"#,
        tag_json("t3", "v3", "2024-01-03T00:00:00Z")
    );

    let first = server
        .mock("GET", "/images/img-1/tags")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page_size".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(page_one)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/images/img-1/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(page_two)
        .expect(1)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/images/img-1/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .with_status(200)
        .with_body(r#"{"tags": []}"#)
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server);
    let tags = client.list_tags("img-1").await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
    let ids: Vec<_> = tags.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn test_list_tags_stops_at_page_cap() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        r#"{{"tags": [{}]}}"#,
        tag_json("t1", "v1", "2024-01-01T00:00:00Z")
    );
    let mock = server
        .mock("GET", "/images/img-1/tags")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .expect(MAX_PAGES as usize)
        .create_async()
        .await;

    let client = test_client(&server);
    let tags = client.list_tags("img-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(tags.len(), MAX_PAGES as usize);
}

#[tokio::test]
async fn test_list_tags_invalid_payload() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/images/img-1/tags")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"unexpected": true}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let result = client.list_tags("img-1").await;
    assert!(matches!(result, Err(SweepError::Validation { .. })));
}

#[tokio::test]
async fn test_delete_tag() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/tags/t1")
        .match_header("x-auth-token", "secret-key")
        .with_status(200)
        .with_body(tag_json("t1", "v1", "2024-01-01T00:00:00Z").replace("ready", "deleting"))
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server);
    let tag = client.delete_tag("t1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(tag.id, "t1");
    assert_eq!(tag.status, crate::models::TagStatus::Deleting);
}

#[tokio::test]
async fn test_delete_tag_forbidden_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/tags/t1")
        .with_status(403)
        .with_body("permission denied")
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server);
    let result = client.delete_tag("t1").await;

    mock.assert_async().await;
    assert!(matches!(
        result,
        Err(SweepError::Authentication {
            status_code: Some(403),
            ..
        })
    ));
}
