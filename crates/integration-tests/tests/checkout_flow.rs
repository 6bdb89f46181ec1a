//! Full checkout: cart, create, gateway return, result page, cart settlement.

#![allow(clippy::unwrap_used)]

use febeflo_core::cart::{CartStore, MemoryStorage, Product};
use febeflo_core::checkout::{CheckoutFlow, CheckoutState};
use febeflo_core::payment::{
    ApiErrorBody, COMMIT_PATH, CREATE_PATH, CreateTransactionResponse, PaymentOutcome,
};
use febeflo_core::shipping::Delivery;
use febeflo_core::{Clp, PaymentStatus, ProductId};
use febeflo_integration_tests::{TX_PATH, TestContext, commit_body};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::{StatusCode, header};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn product(id: i64, name: &str, price: u64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Clp::new(price),
        image_url: None,
        category: "Mujeres".to_string(),
        sizes: vec!["S".to_string(), "M".to_string()],
    }
}

fn filled_cart() -> CartStore<MemoryStorage> {
    let mut cart = CartStore::open(MemoryStorage::default());
    cart.add_item(&product(1, "Blusa lino", 12990), Some("S"));
    cart.add_item(&product(1, "Blusa lino", 12990), Some("S"));
    cart.add_item(&product(2, "Falda plisada", 17990), Some("M"));
    cart
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_successful_payment_clears_cart() {
    let ctx = TestContext::new().await;
    let mut cart = filled_cart();
    let mut flow = CheckoutFlow::new();
    let delivery = Delivery::Courier {
        region: "Región Metropolitana".to_string(),
    };

    // 12990 * 2 + 17990 + 2990 shipping
    let request = flow
        .begin(&cart, &delivery, &mut StdRng::seed_from_u64(7))
        .unwrap();
    assert_eq!(request.amount, Clp::new(46960));

    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .and(body_partial_json(serde_json::json!({
            "buy_order": request.buy_order.as_str(),
            "amount": 46960,
            "return_url": ctx.url(COMMIT_PATH)
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok-ok",
            "url": "https://webpay3gint.transbank.cl/webpayserver/initTransaction"
        })))
        .expect(1)
        .mount(&ctx.webpay)
        .await;
    ctx.mock_commit("tok-ok", commit_body(0, 46960, request.buy_order.as_str()))
        .await;

    let created: CreateTransactionResponse = ctx
        .client
        .post(ctx.url(CREATE_PATH))
        .json(&request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    flow.transaction_created(created);

    let redirect = flow.take_redirect().unwrap();
    assert!(flow.take_redirect().is_none());
    assert!(matches!(flow.state(), CheckoutState::Submitted(_)));

    // The shopper pays and Webpay posts the token back
    let response = ctx
        .client
        .post(ctx.url(COMMIT_PATH))
        .form(&[("token_ws", redirect.token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let result_url = location(&response);
    assert!(result_url.starts_with(&ctx.url("/payment/return?")));

    let outcome = PaymentOutcome::from_query(&result_url).unwrap();
    assert_eq!(outcome.status, PaymentStatus::Success);
    assert_eq!(outcome.amount, Some(Clp::new(46960)));
    assert_eq!(outcome.order.as_deref(), Some(request.buy_order.as_str()));
    assert_eq!(outcome.auth_code.as_deref(), Some("1213"));

    let page = ctx
        .client
        .get(&result_url)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("$46.960"));
    assert!(page.contains("1213"));

    assert!(outcome.settle_cart(&mut cart));
    assert!(cart.is_empty());
    assert!(cart.storage().saved().is_empty());
}

#[tokio::test]
async fn test_rejected_payment_keeps_cart() {
    let ctx = TestContext::new().await;
    let mut cart = filled_cart();
    let mut flow = CheckoutFlow::new();

    let request = flow
        .begin(&cart, &Delivery::StorePickup, &mut StdRng::seed_from_u64(8))
        .unwrap();
    assert_eq!(request.amount, cart.total());

    ctx.mock_create("tok-no").await;
    ctx.mock_commit("tok-no", commit_body(-1, 43970, request.buy_order.as_str()))
        .await;

    let created: CreateTransactionResponse = ctx
        .client
        .post(ctx.url(CREATE_PATH))
        .json(&request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    flow.transaction_created(created);
    let redirect = flow.take_redirect().unwrap();

    let response = ctx
        .client
        .get(format!("{}?token_ws={}", ctx.url(COMMIT_PATH), redirect.token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let outcome = PaymentOutcome::from_query(&location(&response)).unwrap();
    assert_eq!(outcome.status, PaymentStatus::Failed);
    assert!(!outcome.settle_cart(&mut cart));
    assert_eq!(cart.items_count(), 3);
}

#[tokio::test]
async fn test_gateway_outage_fails_checkout_without_touching_cart() {
    let ctx = TestContext::new().await;
    let cart = filled_cart();
    let saves = cart.storage().save_count();
    let mut flow = CheckoutFlow::new();

    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&ctx.webpay)
        .await;

    let request = flow
        .begin(&cart, &Delivery::StorePickup, &mut StdRng::seed_from_u64(9))
        .unwrap();
    let response = ctx
        .client
        .post(ctx.url(CREATE_PATH))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ApiErrorBody = response.json().await.unwrap();
    flow.creation_failed(body.error);

    assert!(matches!(flow.state(), CheckoutState::Failed(_)));
    assert!(flow.take_redirect().is_none());
    assert_eq!(cart.items_count(), 3);
    assert_eq!(cart.storage().save_count(), saves);

    // A retry starts over with new identifiers
    flow.reset();
    let retry = flow
        .begin(&cart, &Delivery::StorePickup, &mut StdRng::seed_from_u64(10))
        .unwrap();
    assert_ne!(retry.buy_order, request.buy_order);
}
