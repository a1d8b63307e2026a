//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Account, AccountRole, Transaction};
use crate::domain::BankLinkRequest;
use crate::error::AppError;
use crate::handlers::{
    AccountHandler, CreateAccountCommand, LoginResult, SecurityHandler, StatementHandler,
    TransferAuth, TransferCommand, TransferHandler,
};
use crate::projection::SpendingSummary;
use crate::rewards::MerchantRewards;
use crate::state::AppState;

use super::middleware::{session_middleware, CurrentSession};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub merchant: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub account_id: String,
    pub password: String,
}

/// Public view of an account; credentials, PIN and face template stay inside
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub role: AccountRole,
    pub balance: Decimal,
    pub bank_linked: bool,
    pub pin_set: bool,
    pub face_enrolled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            display_name: account.display_name().to_string(),
            email: account.email().to_string(),
            phone: account.phone().to_string(),
            role: account.role(),
            balance: account.balance().value(),
            bank_linked: account.bank_link().is_linked(),
            pin_set: account.pin().is_some(),
            face_enrolled: account.biometric_template().is_some(),
            created_at: account.created_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub receiver_id: Option<String>,
    pub amount: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub face_embedding: Option<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transaction_id: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub amount: Decimal,
    pub reward: Decimal,
    pub balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub account_id: String,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
pub struct CustomerRewardsResponse {
    pub account_id: String,
    pub merchants: Vec<MerchantRewards>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceRequest {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceMatchResponse {
    pub account_id: String,
    pub display_name: String,
    pub similarity: f64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Everything except signup and login requires a
/// session.
pub fn create_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/balance", get(get_balance))
        .route("/bank-link", post(link_bank))
        .route("/pin", post(set_pin))
        .route("/pin/verify", post(verify_pin))
        .route("/transfers", post(transfer))
        .route("/transactions", get(get_transactions))
        .route("/spending-summary", get(get_spending_summary))
        .route("/rewards", get(get_customer_rewards))
        .route("/merchants/:merchant_id/rewards", get(get_merchant_rewards))
        .route("/face", post(enroll_face))
        .route("/face/verify", post(verify_face))
        .route_layer(middleware::from_fn_with_state(state, session_middleware));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .merge(protected)
}

// =========================================================================
// POST /signup, POST /login, POST /logout
// =========================================================================

/// Open a new account
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let command = CreateAccountCommand::new(
        request.display_name,
        request.email,
        request.phone,
        request.password,
    );
    let command = if request.merchant {
        command.as_merchant()
    } else {
        command
    };

    let account = AccountHandler::new(state).create_account(command).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResult>, AppError> {
    let (result, _session) = AccountHandler::new(state)
        .authenticate_login(&request.account_id, &request.password)
        .await?;
    Ok(Json(result))
}

async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<StatusCode, AppError> {
    AccountHandler::new(state).logout(session.0.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// GET /balance, POST /bank-link, POST /pin, POST /pin/verify
// =========================================================================

async fn get_balance(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = AccountHandler::new(state)
        .get_balance(session.account_id())
        .await?;

    Ok(Json(BalanceResponse {
        account_id: session.account_id().to_string(),
        balance: balance.value(),
    }))
}

async fn link_bank(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<BankLinkRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = AccountHandler::new(state)
        .link_bank(session.account_id(), request)
        .await?;
    Ok(Json(AccountResponse::from(&account)))
}

async fn set_pin(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<PinRequest>,
) -> Result<StatusCode, AppError> {
    AccountHandler::new(state)
        .set_pin(session.account_id(), &request.pin)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PIN-gated balance check
async fn verify_pin(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<PinRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = SecurityHandler::new(state)
        .verify_pin(&session.0, &request.pin)
        .await?;

    Ok(Json(BalanceResponse {
        account_id: session.account_id().to_string(),
        balance: balance.value(),
    }))
}

// =========================================================================
// POST /transfers
// =========================================================================

async fn transfer(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let auth = match (request.pin, request.face_embedding) {
        (Some(pin), None) => TransferAuth::Pin(pin),
        (None, Some(embedding)) => TransferAuth::Face(embedding),
        _ => {
            return Err(AppError::InvalidRequest(
                "Provide exactly one of pin or face_embedding".to_string(),
            ))
        }
    };

    let command = TransferCommand {
        receiver_id: request.receiver_id,
        amount: request.amount,
        note: request.note,
        auth,
    };

    let receipt = TransferHandler::new(state)
        .execute(command, &session.0)
        .await?;
    let reward = receipt.reward();
    let tx = receipt.transaction;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transaction_id: tx.id,
            receiver_id: tx.receiver_id,
            receiver_name: tx.receiver_display_name,
            amount: tx.amount.value(),
            reward,
            balance: receipt.sender_balance,
            timestamp: tx.timestamp,
        }),
    ))
}

// =========================================================================
// GET /transactions, GET /spending-summary, GET /rewards
// =========================================================================

async fn get_transactions(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<StatementResponse>, AppError> {
    let transactions = StatementHandler::new(state)
        .get_statement(session.account_id())
        .await?;

    Ok(Json(StatementResponse {
        account_id: session.account_id().to_string(),
        transactions,
    }))
}

async fn get_spending_summary(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<SpendingSummary>, AppError> {
    let summary = StatementHandler::new(state)
        .get_spending_summary(session.account_id())
        .await?;
    Ok(Json(summary))
}

async fn get_customer_rewards(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<CustomerRewardsResponse>, AppError> {
    let merchants = StatementHandler::new(state)
        .get_customer_rewards(session.account_id())
        .await?;

    Ok(Json(CustomerRewardsResponse {
        account_id: session.account_id().to_string(),
        merchants,
    }))
}

async fn get_merchant_rewards(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<MerchantRewards>, AppError> {
    let rewards = StatementHandler::new(state)
        .get_merchant_rewards(&merchant_id)
        .await?;
    Ok(Json(rewards))
}

// =========================================================================
// POST /face, POST /face/verify
// =========================================================================

async fn enroll_face(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<FaceRequest>,
) -> Result<StatusCode, AppError> {
    SecurityHandler::new(state)
        .set_biometric_template(session.account_id(), request.embedding)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_face(
    State(state): State<AppState>,
    Json(request): Json<FaceRequest>,
) -> Result<Json<FaceMatchResponse>, AppError> {
    let (account, similarity) = SecurityHandler::new(state)
        .authenticate_by_face(request.embedding)
        .await?;

    Ok(Json(FaceMatchResponse {
        account_id: account.id().to_string(),
        display_name: account.display_name().to_string(),
        similarity,
    }))
}
