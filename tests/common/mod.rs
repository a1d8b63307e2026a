//! Common test utilities

#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
};
use rust_decimal::Decimal;
use serde_json::Value;
use unipay_core::aggregate::Account;
use unipay_core::domain::Amount;
use unipay_core::handlers::{AccountHandler, CreateAccountCommand};
use unipay_core::AppState;

/// Fresh, empty scratch directory under the system temp dir
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("unipay-{}-{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Open an account with a PIN of `1234`
pub async fn seed_account(state: &AppState, name: &str, n: u32, merchant: bool) -> Account {
    let handler = AccountHandler::new(state.clone());
    let mut command = CreateAccountCommand::new(
        name.to_string(),
        format!("{}@unipay.test", name.to_lowercase()),
        format!("91000000{:02}", n),
        "password".to_string(),
    );
    if merchant {
        command = command.as_merchant();
    }

    let account = handler
        .create_account(command)
        .await
        .expect("Failed to create account");
    handler
        .set_pin(account.id(), "1234")
        .await
        .expect("Failed to set PIN");
    account
}

pub async fn fund(state: &AppState, account_id: &str, value: Decimal) {
    let amount = Amount::new(value).expect("Invalid funding amount");
    state
        .accounts
        .update(account_id, |a| a.credit(&amount))
        .await
        .expect("Failed to fund account");
}

pub async fn balance_of(state: &AppState, account_id: &str) -> Decimal {
    state
        .accounts
        .get_balance(account_id)
        .await
        .expect("Account missing")
        .value()
}

/// JSON request, optionally carrying a session token
pub fn json_request(method: &str, uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("X-Session-Id", session);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(session) = session {
        builder = builder.header("X-Session-Id", session);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Read a response body as JSON (empty bodies read as `null`)
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
