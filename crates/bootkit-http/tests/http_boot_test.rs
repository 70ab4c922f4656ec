//! Integration tests for the HTTP client auto-configuration
//!
//! A minimal HTTP/1.1 server on a local tokio listener answers each request
//! with the next status from a script and records the request heads.

use bootkit::autoconfig::FnAutoConfiguration;
use bootkit::introspection::BindingView;
use bootkit::{auto_configuration, run_boot, Container, CoreError};
use bootkit_http::{
    http_initializer, ClientProperties, HttpClient, HttpClientCustomizer, HttpLogger, HttpPropertiesExt,
    JsonOptions,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

struct TestServer {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    async fn start(statuses: Vec<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buffer = [0u8; 1024];
                while !head.windows(4).any(|window| window == b"\r\n\r\n") {
                    let read = socket.read(&mut buffer).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    head.extend_from_slice(&buffer[..read]);
                }
                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).to_lowercase());

                let status = statuses[served.min(statuses.len() - 1)];
                served += 1;
                let body = r#"{"ok":true,"extra":"ignored"}"#;
                let response = format!(
                    "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        Self { url, requests }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// A second unit competing to install the default client
fn fallback_client_unit() -> FnAutoConfiguration {
    auto_configuration("fallback-http-client", |scope| {
        scope.on_missing::<HttpClient>(|scope| {
            scope.single(|_| {
                let mut properties = ClientProperties::default();
                properties.request.url = "http://fallback.example/".to_string();
                HttpClient::from_properties(&properties, None).map_err(CoreError::initialization::<HttpClient>)
            });
        });
        Ok(())
    })
}

fn client_bindings(container: &Container) -> usize {
    container
        .bindings()
        .into_iter()
        .filter(|(id, _)| id.type_id == TypeId::of::<HttpClient>())
        .count()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Health {
    ok: bool,
}

fn boot_client(url: &str, attempts: u32) -> Arc<HttpClient> {
    let url = url.to_string();
    let container = run_boot(move |boot| {
        boot.with(http_initializer)?.properties(|props| {
            props
                .http_client_request_url(&url)?
                .http_client_retry_attempts(attempts)?
                .http_client_retry_delay_millis(10)?
                .http_client_request_header("X-Api-Key", "secret")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    container.resolve::<HttpClient>().unwrap()
}

#[tokio::test]
async fn test_retries_server_errors_for_get() {
    let server = TestServer::start(vec![503, 200]).await;
    let client = boot_client(&server.url, 2);

    let health: Health = client.get_json("health").await.unwrap();
    assert!(health.ok);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("get /health"));
    assert!(!requests[0].contains("x-retry-count"));
    assert!(requests[1].contains("x-retry-count: 1"));
    assert!(requests[1].contains("x-api-key: secret"));
}

#[tokio::test]
async fn test_gives_up_after_configured_attempts() {
    let server = TestServer::start(vec![500]).await;
    let client = boot_client(&server.url, 2);

    let response = client.get("health").await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn test_post_is_not_retried_by_default() {
    let server = TestServer::start(vec![503, 200]).await;
    let client = boot_client(&server.url, 3);

    let request = client.request(Method::POST, "items").unwrap().body("{}").build().unwrap();
    let response = client.execute(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_no_retry_without_attempts() {
    let server = TestServer::start(vec![503, 200]).await;
    let client = boot_client(&server.url, 0);

    let response = client.get("health").await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_user_client_is_kept() {
    let mut properties = ClientProperties::default();
    properties.request.url = "http://user.example/".to_string();
    let user_client = HttpClient::from_properties(&properties, None).unwrap();

    let container = run_boot(move |boot| {
        boot.with(http_initializer)?
            .auto_configuration(fallback_client_unit())
            .module(|module| {
                module.instance(user_client);
            })
            .properties(|props| {
                props.http_client_request_url("http://generated.example/")?;
                Ok(())
            })?;
        Ok(())
    })
    .unwrap();

    let client = container.resolve::<HttpClient>().unwrap();
    assert_eq!(client.base_url().unwrap().as_str(), "http://user.example/");

    assert_eq!(client_bindings(&container), 1);
    assert!(container.contains::<JsonOptions>());
}

#[test]
fn test_first_unit_by_order_installs_the_client() {
    let container = run_boot(|boot| {
        boot.auto_configuration(fallback_client_unit().order(200))
            .with(http_initializer)?
            .properties(|props| {
                props.http_client_request_url("http://generated.example/")?;
                Ok(())
            })?;
        Ok(())
    })
    .unwrap();

    let client = container.resolve::<HttpClient>().unwrap();
    assert_eq!(client.base_url().unwrap().as_str(), "http://generated.example/");
    assert_eq!(client_bindings(&container), 1);
}

#[test]
fn test_user_transport_and_customizer() {
    let container = run_boot(|boot| {
        boot.with(http_initializer)?.module(|module| {
            module.instance(reqwest::Client::new());
            module.instance(HttpClientCustomizer::new(|builder| builder));
        });
        Ok(())
    })
    .unwrap();

    let client = container.resolve::<HttpClient>().unwrap();
    assert!(client.base_url().is_none());
    assert!(!client.retry_policy().is_enabled());
}

#[test]
fn test_logger_follows_property() {
    let quiet = run_boot(|boot| {
        boot.with(http_initializer)?;
        Ok(())
    })
    .unwrap();
    assert!(!quiet.contains::<HttpLogger>());
    assert!(quiet.resolve::<HttpClient>().unwrap().logger().is_none());

    let verbose = run_boot(|boot| {
        boot.with(http_initializer)?.properties(|props| {
            props.http_client_logging_enabled(true)?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    assert!(verbose.contains::<HttpLogger>());
    assert!(verbose.resolve::<HttpClient>().unwrap().logger().is_some());
}
