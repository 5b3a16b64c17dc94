//! Integration tests for WeatherProvider using wiremock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::NaiveTime;
use neolight_core::{NetworkError, WeatherConfig};
use neolight_weather::{WeatherError, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> WeatherProvider {
    let config = WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: format!("{}/data/2.5", server.uri()),
        timeout_secs: 2,
        ..WeatherConfig::default()
    };
    WeatherProvider::new(&config, chrono_tz::Asia::Kolkata).unwrap()
}

fn clouds_body() -> serde_json::Value {
    serde_json::json!({
        "cod": 200,
        "name": "New Delhi",
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": 24.1, "humidity": 60},
        "sys": {"country": "IN", "sunrise": 1700000000, "sunset": 1700040000}
    })
}

fn is_hms(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok() && s.len() == 8
}

#[tokio::test]
async fn test_fetch_success_sends_expected_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "New Delhi,IN"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clouds_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let obs = provider_for(&mock_server).fetch().await.unwrap();

    assert_eq!(obs.condition, "clouds");
    assert_eq!(obs.sunrise.format("%H:%M:%S").to_string(), "03:43:20");
    assert_eq!(obs.sunset.format("%H:%M:%S").to_string(), "14:50:00");
    assert!(is_hms(&obs.sunrise.format("%H:%M:%S").to_string()));
}

#[tokio::test]
async fn test_condition_is_lowercased_for_every_label() {
    for label in ["Clear", "Rain", "Thunderstorm", "Drizzle", "Snow", "Mist"] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": 200,
                "weather": [{"main": label}],
                "sys": {"sunrise": 1700000000, "sunset": 1700040000}
            })))
            .mount(&mock_server)
            .await;

        let obs = provider_for(&mock_server).fetch().await.unwrap();
        assert_eq!(obs.condition, label.to_lowercase());
    }
}

#[tokio::test]
async fn test_fetch_city_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(
        matches!(err, WeatherError::Api { ref code, .. } if code == "404"),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("city not found"));
}

#[tokio::test]
async fn test_fetch_in_body_error_with_http_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"cod": 404})))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(matches!(err, WeatherError::Api { .. }));
}

#[tokio::test]
async fn test_fetch_invalid_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(matches!(err, WeatherError::Api { ref code, .. } if code == "401"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn test_fetch_gateway_error_with_html_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(
        matches!(err, WeatherError::Network(NetworkError::ServerError { status: 502, .. })),
        "unexpected error: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_success_without_weather_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": 200,
            "weather": [],
            "sys": {"sunrise": 1700000000, "sunset": 1700040000}
        })))
        .mount(&mock_server)
        .await;

    let err = provider_for(&mock_server).fetch().await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Grab a free port and release it so nothing is listening
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let config = WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: format!("{}/data/2.5", uri),
        timeout_secs: 2,
        ..WeatherConfig::default()
    };
    let provider = WeatherProvider::new(&config, chrono_tz::Asia::Kolkata).unwrap();

    let err = provider.fetch().await.unwrap_err();
    assert!(matches!(err, WeatherError::Network(_)), "unexpected error: {err:?}");
}
