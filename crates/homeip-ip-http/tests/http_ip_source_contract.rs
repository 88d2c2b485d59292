//! Contract Test: HTTP IP source
//!
//! Constraints verified:
//! - One request per `current()` call, nothing cached
//! - Body is trimmed and parsed as IPv4
//! - Every failure surfaces as `Error::Network`

use homeip_core::Error;
use homeip_core::traits::IpSource;
use homeip_ip_http::HttpIpSource;
use std::net::Ipv4Addr;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer, timeout: Duration) -> HttpIpSource {
    HttpIpSource::new(format!("{}/ip", server.uri()), timeout).unwrap()
}

#[tokio::test]
async fn returns_trimmed_ipv4() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("5.6.7.8\n"))
        .expect(1)
        .mount(&server)
        .await;

    let ip = source(&server, Duration::from_secs(5)).current().await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(5, 6, 7, 8));
}

#[tokio::test]
async fn every_call_hits_the_service() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("5.6.7.8"))
        .expect(3)
        .mount(&server)
        .await;

    let source = source(&server, Duration::from_secs(5));
    for _ in 0..3 {
        source.current().await.unwrap();
    }
}

#[tokio::test]
async fn ipv6_answer_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2001:db8::1"))
        .mount(&server)
        .await;

    let err = source(&server, Duration::from_secs(5))
        .current()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)), "{:?}", err);
}

#[tokio::test]
async fn non_success_status_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = source(&server, Duration::from_secs(5))
        .current()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("5.6.7.8")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = source(&server, Duration::from_millis(100))
        .current()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    // Port 9 (discard) on localhost is almost never listening.
    let source = HttpIpSource::new("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();

    let err = source.current().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}
