use axum::http::StatusCode;
use serde_json::{json, Value as Json};
use spellbook::api;
use spellbook::config::LedgerParams;
use spellbook::domain::Decimal;
use spellbook::external::{FixedPriceFeed, MemoryAuditSink};
use spellbook::orchestration::Protocol;
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    audit: Arc<MemoryAuditSink>,
}

fn setup_test_app() -> TestApp {
    let audit = Arc::new(MemoryAuditSink::new());
    let protocol = Protocol::new(
        LedgerParams::default(),
        Arc::new(FixedPriceFeed::new(Decimal::from_int(2000))),
        audit.clone(),
    );
    let app = api::create_router(api::AppState::new(protocol));
    TestApp { app, audit }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Json>,
) -> (StatusCode, Json) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn fund(app: &axum::Router, address: &str, asset: &str, amount: f64) {
    let (status, _) = send(
        app,
        "POST",
        "/v1/fund",
        Some(json!({"address": address, "asset": asset, "amount": amount})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn open_spell(collateral: f64, borrow: f64) -> Json {
    json!({
        "operation": "trove.open",
        "args": [
            {"literal": {"amount": collateral}},
            {"literal": {"amount": 0.01}},
            {"literal": {"amount": borrow}},
            {"literal": "empty"},
            {"literal": "empty"}
        ]
    })
}

async fn open(app: &axum::Router, owner: &str, collateral: f64, borrow: f64) {
    fund(app, owner, "collateral", collateral).await;
    let (status, body) = send(
        app,
        "POST",
        "/v1/cast",
        Some(json!({"account": owner, "spells": [open_spell(collateral, borrow)]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_health_and_ready() {
    let test_app = setup_test_app();
    let (status, body) = send(&test_app.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&test_app.app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activePositions"], 0);
    assert_eq!(body["operations"], 15);
}

#[tokio::test]
async fn test_fund_and_balances() {
    let test_app = setup_test_app();
    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/fund",
        Some(json!({"address": "0xABC", "asset": "governance", "amount": 12.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "0xabc");
    assert_eq!(body["balance"].as_f64(), Some(12.5));

    let (status, body) = send(&test_app.app, "GET", "/v1/balances?address=0xabc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["governance"].as_f64(), Some(12.5));
    assert_eq!(body["debt"].as_f64(), Some(0.0));

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/fund",
        Some(json!({"address": "0xabc", "asset": "debt", "amount": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "InvalidAmount");
}

#[tokio::test]
async fn test_cast_chain_over_http() {
    let test_app = setup_test_app();
    fund(&test_app.app, "0xowner", "collateral", 5.0).await;

    let request = json!({
        "account": "0xdsa",
        "origin": "0xowner",
        "spells": [
            {
                "operation": "basic.deposit",
                "args": [{"literal": {"asset": "collateral"}}, {"literal": {"amount": 5}}],
                "output": 1
            },
            {
                "operation": "trove.open",
                "args": [
                    {"register": 1},
                    {"literal": {"amount": 0.01}},
                    {"literal": {"amount": 2000}},
                    {"literal": "empty"},
                    {"literal": "empty"}
                ],
                "output": 2
            },
            {
                "operation": "basic.withdraw",
                "args": [
                    {"literal": {"asset": "debt"}},
                    {"register": 2},
                    {"literal": {"address": "0xrecipient"}}
                ]
            }
        ]
    });
    let (status, body) = send(&test_app.app, "POST", "/v1/cast", Some(request)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["receipts"].as_array().unwrap().len(), 3);
    assert_eq!(body["receipts"][1]["writtenTo"], 2);
    assert_eq!(body["batchDigest"].as_str().unwrap().len(), 64);
    assert_eq!(body["records"][0]["kind"], "open");
    assert_eq!(test_app.audit.len(), 1);

    let (_, body) = send(&test_app.app, "GET", "/v1/balances?address=0xrecipient", None).await;
    assert_eq!(body["debt"].as_f64(), Some(2000.0));

    let (status, body) = send(&test_app.app, "GET", "/v1/positions/0xdsa", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["debt"].as_f64(), Some(2210.0));
}

#[tokio::test]
async fn test_rejected_cast_reports_step_and_kind() {
    let test_app = setup_test_app();
    fund(&test_app.app, "0xdsa", "collateral", 5.0).await;

    let request = json!({
        "account": "0xdsa",
        "spells": [
            {
                "operation": "basic.deposit",
                "args": [{"literal": {"asset": "collateral"}}, {"literal": {"amount": 5}}]
            },
            open_spell(5.0, 100.0)
        ]
    });
    let (status, body) = send(&test_app.app, "POST", "/v1/cast", Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "BelowMinimumNetDebt");
    assert_eq!(body["step"], 1);
    assert_eq!(body["operation"], "trove.open");
    assert!(test_app.audit.is_empty());

    let (_, body) = send(&test_app.app, "GET", "/v1/balances?address=0xdsa", None).await;
    assert_eq!(body["collateral"].as_f64(), Some(5.0));
}

#[tokio::test]
async fn test_cast_request_validation() {
    let test_app = setup_test_app();
    let (status, _) = send(
        &test_app.app,
        "POST",
        "/v1/cast",
        Some(json!({"account": "0xdsa", "spells": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &test_app.app,
        "POST",
        "/v1/cast",
        Some(json!({"account": "   ", "spells": [open_spell(5.0, 2000.0)]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_position_not_found() {
    let test_app = setup_test_app();
    let (status, body) = send(&test_app.app, "GET", "/v1/positions/0xnobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("0xnobody"));
}

#[tokio::test]
async fn test_ranking_and_insert_hints() {
    let test_app = setup_test_app();
    open(&test_app.app, "0xa11ce", 5.0, 2000.0).await;
    open(&test_app.app, "0xb0b", 5.0, 4000.0).await;
    open(&test_app.app, "0xca201", 10.0, 2000.0).await;

    let (status, body) = send(&test_app.app, "GET", "/v1/ranking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"].as_f64(), Some(2000.0));
    let owners: Vec<&str> = body["positions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["owner"].as_str().unwrap())
        .collect();
    assert_eq!(owners, vec!["0xca201", "0xa11ce", "0xb0b"]);

    let (status, body) = send(
        &test_app.app,
        "GET",
        "/v1/hints/insert?collateral=7&debt=2210",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upperHint"], "0xca201");
    assert_eq!(body["lowerHint"], "0xa11ce");
    assert!(body["approxHint"]["handle"].is_string());

    let (status, _) = send(
        &test_app.app,
        "GET",
        "/v1/hints/insert?collateral=abc&debt=2210",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redemption_endpoints() {
    let test_app = setup_test_app();
    open(&test_app.app, "0xa11ce", 10.0, 2000.0).await;
    open(&test_app.app, "0xb0b", 5.0, 4000.0).await;

    let (status, body) = send(
        &test_app.app,
        "GET",
        "/v1/redemptions/hints?amount=4020",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstRedemptionHint"], "0xb0b");
    assert_eq!(body["partialRedemptionRatio"], Json::Null);
    assert_eq!(body["truncatedAmount"].as_f64(), Some(4020.0));

    let (status, _) = send(&test_app.app, "GET", "/v1/redemptions/hints?amount=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    fund(&test_app.app, "0x4edee3e4", "debt", 4020.0).await;
    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/redemptions",
        Some(json!({"redeemer": "0x4edee3e4", "amount": 4020})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["redeemed"].as_f64(), Some(4020.0));
    assert_eq!(body["collateralPaid"].as_f64(), Some(2.01));
    assert_eq!(body["steps"][0]["owner"], "0xb0b");
    assert_eq!(body["records"][0]["kind"], "redeemed");

    let (_, body) = send(&test_app.app, "GET", "/v1/positions/0xb0b", None).await;
    assert_eq!(body["status"], "redeemed");
}

#[tokio::test]
async fn test_inbound_events() {
    let test_app = setup_test_app();
    open(&test_app.app, "0xa11ce", 5.0, 2000.0).await;

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/events",
        Some(json!({"type": "liquidated", "owner": "0xa11ce"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], "liquidated");
    assert_eq!(body["records"][0]["kind"], "liquidated");

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/events",
        Some(json!({"type": "liquidated", "owner": "0xa11ce"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "InvalidTransition");

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/events",
        Some(json!({"type": "stabilityGain", "depositor": "0xa11ce", "amount": 0.25})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], "stabilityGain");
    assert!(body["records"].as_array().unwrap().is_empty());

    let (_, body) = send(&test_app.app, "GET", "/v1/balances?address=0xa11ce", None).await;
    assert_eq!(body["stabilityGain"].as_f64(), Some(0.25));
}

#[tokio::test]
async fn test_mixed_case_addresses_in_bodies_are_normalized() {
    let test_app = setup_test_app();
    open(&test_app.app, "0xABC", 10.0, 2000.0).await;

    let (status, body) = send(&test_app.app, "GET", "/v1/positions/0xabc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let request = json!({
        "account": "0xAbC",
        "spells": [{
            "operation": "basic.withdraw",
            "args": [
                {"literal": {"asset": "debt"}},
                {"literal": {"amount": 500}},
                {"literal": {"address": "0xRecipient"}}
            ]
        }]
    });
    let (status, body) = send(&test_app.app, "POST", "/v1/cast", Some(request)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let (_, body) = send(&test_app.app, "GET", "/v1/balances?address=0xrecipient", None).await;
    assert_eq!(body["debt"].as_f64(), Some(500.0));

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/v1/events",
        Some(json!({"type": "liquidated", "owner": "0xABC"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["records"][0]["kind"], "liquidated");

    let (_, body) = send(&test_app.app, "GET", "/v1/positions/0xabc", None).await;
    assert_eq!(body["status"], "liquidated");
}
