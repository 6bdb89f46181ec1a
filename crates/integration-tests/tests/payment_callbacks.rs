//! Gateway return variants handled by the commit endpoint.

#![allow(clippy::unwrap_used)]

use febeflo_core::payment::{ApiErrorBody, COMMIT_PATH, PaymentOutcome};
use febeflo_core::PaymentStatus;
use febeflo_integration_tests::TestContext;
use reqwest::{StatusCode, header};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

fn outcome_of(response: &reqwest::Response) -> PaymentOutcome {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    PaymentOutcome::from_query(&location).unwrap()
}

#[tokio::test]
async fn test_cancelled_payment_redirects_as_aborted() {
    let ctx = TestContext::new().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.webpay)
        .await;

    let response = ctx
        .client
        .post(ctx.url(COMMIT_PATH))
        .form(&[
            ("TBK_TOKEN", "tbk-abc"),
            ("TBK_ORDEN_COMPRA", "O-31337"),
            ("TBK_ID_SESION", "S-1"),
        ])
        .send()
        .await
        .unwrap();

    let outcome = outcome_of(&response);
    assert_eq!(outcome.status, PaymentStatus::Aborted);
    assert_eq!(outcome.order.as_deref(), Some("O-31337"));
}

#[tokio::test]
async fn test_callback_without_token_is_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url(COMMIT_PATH))
        .form(&[("token_ws", ""), ("TBK_ORDEN_COMPRA", "O-1")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_commit_failure_hides_gateway_detail() {
    let ctx = TestContext::new().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error_message": "Invalid status 6 for transaction while authorizing"
        })))
        .expect(1)
        .mount(&ctx.webpay)
        .await;

    let response = ctx
        .client
        .post(ctx.url(COMMIT_PATH))
        .form(&[("token_ws", "tok-stale")])
        .send()
        .await
        .unwrap();

    let outcome = outcome_of(&response);
    assert_eq!(outcome.status, PaymentStatus::Error);
    assert!(!outcome.message.unwrap().contains("Invalid status 6"));
}

#[tokio::test]
async fn test_commit_failure_detail_when_exposed() {
    let ctx = TestContext::with_config(|config| config.expose_payment_errors = true).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error_message": "Invalid status 6 for transaction while authorizing"
        })))
        .expect(1)
        .mount(&ctx.webpay)
        .await;

    let response = ctx
        .client
        .post(ctx.url(COMMIT_PATH))
        .form(&[("token_ws", "tok-stale")])
        .send()
        .await
        .unwrap();

    let outcome = outcome_of(&response);
    assert_eq!(outcome.status, PaymentStatus::Error);
    assert!(outcome.message.unwrap().contains("Invalid status 6"));
}

#[tokio::test]
async fn test_result_page_for_unknown_status() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .get(ctx.url("/payment/return?status=bogus"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("No encontramos"));
}
