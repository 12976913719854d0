//! sipgate XML-RPC client against a mock endpoint

use assert_matches::assert_matches;
use sms_notify::notify::{SipgateSms, SmsError, SmsSender};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

// base64("user:secret")
const BASIC_AUTH: &str = "Basic dXNlcjpzZWNyZXQ=";

async fn client(server: &MockServer) -> SipgateSms {
    SipgateSms::new(format!("{}/RPC2", server.uri()), "user", "secret").unwrap()
}

#[tokio::test]
async fn test_identify_sends_client_information() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/RPC2"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains(
            "<methodName>samurai.ClientIdentify</methodName>",
        ))
        .and(body_string_contains("<name>ClientName</name>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xmlrpc_success()))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server).await.identify().await.unwrap();
}

#[tokio::test]
async fn test_send_initiates_text_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/RPC2"))
        .and(body_string_contains(
            "<methodName>samurai.SessionInitiate</methodName>",
        ))
        .and(body_string_contains(
            "<string>sip:4917712345678@sipgate.de</string>",
        ))
        .and(body_string_contains("<string>text</string>"))
        .and(body_string_contains("<string>db:5432(TCP) &amp; more</string>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xmlrpc_success()))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .await
        .send(DESTINATION, "db:5432(TCP) & more")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wrong_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).await.identify().await;
    assert_matches!(result, Err(SmsError::Unauthorized(401)));
}

#[tokio::test]
async fn test_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).await.send(DESTINATION, "hi").await;
    assert_matches!(result, Err(SmsError::Http(500)));
}

#[tokio::test]
async fn test_fault_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(xmlrpc_fault(407, "Invalid parameter value.")),
        )
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).await.send("0000", "hi").await;
    assert_matches!(
        result,
        Err(SmsError::Fault { code: 407, ref message }) if message == "Invalid parameter value."
    );
}

#[tokio::test]
async fn test_too_long_message_is_rejected_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xmlrpc_success()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .await
        .send(DESTINATION, &"x".repeat(161))
        .await;
    assert_matches!(
        result,
        Err(SmsError::MessageTooLong {
            length: 161,
            max: 160
        })
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/RPC2", mock_server.uri());
    drop(mock_server);

    let sms = SipgateSms::new(url, "user", "secret").unwrap();
    assert_matches!(
        sms.send(DESTINATION, "hi").await,
        Err(SmsError::Transport(_))
    );
}
