//! # Service Failure Tests
//!
//! The nutrition lookup and suggestion clients against a local one-shot HTTP
//! server: failing statuses, unreadable bodies, refused connections and timeouts
//! all degrade to "no data" or the fallback payload.

use glycomeal::config::{LookupConfig, SuggestionConfig};
use glycomeal::errors::ServiceError;
use glycomeal::meal_model::{RiskLevel, Totals};
use glycomeal::nutrition_lookup::{EdamamClient, NutritionLookup};
use glycomeal::suggestions::{fallback_suggestions, GroqSuggestionClient, SuggestionGenerator, Suggestions};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const REFUSED_URL: &str = "http://127.0.0.1:9/endpoint";

const NUTRITION_BODY: &str =
    r#"{"calories": 95, "totalNutrients": {"ENERC_KCAL": {"quantity": 95.0}, "SUGAR": {"quantity": 18.9}}}"#;

const CHAT_BODY: &str = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"suggestions\": [\"Walk for 10 minutes\"], \"analysis\": [\"Sugar is high\"]}"}}]}"#;

const CHAT_BODY_WITH_PROSE: &str =
    r#"{"choices": [{"message": {"role": "assistant", "content": "Sure! Here are some tips."}}]}"#;

/// Read one request: headers, then as many body bytes as Content-Length announces
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            let mut remaining = content_length.saturating_sub(buf.len() - (end + 4));
            while remaining > 0 {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    return;
                }
                remaining = remaining.saturating_sub(n);
            }
            return;
        }
    }
}

/// Answer a single request with `status` and `body`; returns the endpoint URL
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}/endpoint")
}

/// Accept a connection and never answer it
async fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        }
    });

    format!("http://{addr}/endpoint")
}

fn edamam(base_url: String) -> EdamamClient {
    EdamamClient::new(LookupConfig {
        app_id: Some("id".to_string()),
        app_key: Some("key".to_string()),
        base_url,
        timeout: Duration::from_millis(300),
    })
    .unwrap()
}

fn groq(base_url: String) -> GroqSuggestionClient {
    GroqSuggestionClient::new(SuggestionConfig {
        api_key: Some("key".to_string()),
        base_url,
        timeout: Duration::from_millis(300),
        ..SuggestionConfig::default()
    })
    .unwrap()
}

fn high_sugar_day() -> Totals {
    Totals {
        total_sugar: 72.0,
        total_carbs: 160.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_lookup_reads_successful_reply() {
    let client = edamam(serve_once("200 OK", NUTRITION_BODY).await);
    let profile = client.lookup("apple").await.unwrap();
    assert_eq!(profile.food_name, "apple");
    assert_eq!(profile.sugar, 18.9);
    assert_eq!(profile.calories, 95.0);
}

#[tokio::test]
async fn test_lookup_server_error_is_none() {
    let client = edamam(serve_once("500 Internal Server Error", "{}").await);
    assert!(matches!(client.fetch("apple").await, Err(ServiceError::Status(500))));

    let client = edamam(serve_once("500 Internal Server Error", "{}").await);
    assert!(client.lookup("apple").await.is_none());
}

#[tokio::test]
async fn test_lookup_non_json_body_is_none() {
    let client = edamam(serve_once("200 OK", "<html>oops</html>").await);
    assert!(matches!(client.fetch("apple").await, Err(ServiceError::Payload(_))));

    let client = edamam(serve_once("200 OK", "<html>oops</html>").await);
    assert!(client.lookup("apple").await.is_none());
}

#[tokio::test]
async fn test_lookup_refused_connection_is_none() {
    let client = edamam(REFUSED_URL.to_string());
    assert!(client.fetch("apple").await.is_err());
    assert!(client.lookup("apple").await.is_none());
}

#[tokio::test]
async fn test_lookup_invalid_url_is_none() {
    let client = edamam("not a url".to_string());
    assert!(client.lookup("apple").await.is_none());
}

#[tokio::test]
async fn test_lookup_timeout_is_none() {
    let client = edamam(serve_silently().await);
    assert!(matches!(client.fetch("apple").await, Err(ServiceError::Timeout(_))));

    let client = edamam(serve_silently().await);
    assert!(client.lookup("apple").await.is_none());
}

#[tokio::test]
async fn test_suggestions_read_successful_reply() {
    let client = groq(serve_once("200 OK", CHAT_BODY).await);
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(
        result,
        Suggestions {
            suggestions: vec!["Walk for 10 minutes".to_string()],
            analysis: vec!["Sugar is high".to_string()],
        }
    );
}

#[tokio::test]
async fn test_suggestions_server_error_falls_back() {
    let client = groq(serve_once("500 Internal Server Error", "{}").await);
    assert!(matches!(
        client.request(&high_sugar_day(), RiskLevel::High).await,
        Err(ServiceError::Status(500))
    ));

    let client = groq(serve_once("500 Internal Server Error", "{}").await);
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(result, fallback_suggestions());
}

#[tokio::test]
async fn test_suggestions_non_json_body_falls_back() {
    let client = groq(serve_once("200 OK", "<html>oops</html>").await);
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(result, fallback_suggestions());
}

#[tokio::test]
async fn test_suggestions_prose_content_falls_back() {
    let client = groq(serve_once("200 OK", CHAT_BODY_WITH_PROSE).await);
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(result, fallback_suggestions());
}

#[tokio::test]
async fn test_suggestions_refused_connection_falls_back() {
    let client = groq(REFUSED_URL.to_string());
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(result, fallback_suggestions());
}

#[tokio::test]
async fn test_suggestions_timeout_falls_back() {
    let client = groq(serve_silently().await);
    assert!(matches!(
        client.request(&high_sugar_day(), RiskLevel::High).await,
        Err(ServiceError::Timeout(_))
    ));

    let client = groq(serve_silently().await);
    let result = client.suggest(&high_sugar_day(), RiskLevel::High).await;
    assert_eq!(result, fallback_suggestions());
}
