use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use critiq::domain::DomainError;
use critiq::notifier::{MailerSendNotifier, Notifier};

#[tokio::test]
async fn test_mailersend_delivery() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/email"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "to": [{ "email": "carol@example.com" }],
            "text": "Your verification code is: 123456"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = MailerSendNotifier::new("test-key")
        .expect("build notifier")
        .with_api_url(format!("{}/v1/email", server.uri()));

    notifier
        .send_verification_email("carol@example.com", "123456")
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn test_mailersend_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/email"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let notifier = MailerSendNotifier::new("bad-key")
        .expect("build notifier")
        .with_api_url(format!("{}/v1/email", server.uri()));

    let err = notifier
        .send_verification_email("carol@example.com", "123456")
        .await
        .expect_err("failed delivery must surface");
    assert!(matches!(err, DomainError::External(_)));
}
