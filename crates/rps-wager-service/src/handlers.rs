//! HTTP API handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rps_wager_core::{amount_serde, Amount, Choice, Identity, LedgerSummary, Round, RoundId, WagerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

// ============ Error type ============

/// Application error type
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    Wager(WagerError),
}

impl From<WagerError> for ApiError {
    fn from(e: WagerError) -> Self {
        ApiError::Wager(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg.to_string()),
            ApiError::Wager(e) => {
                let status = match &e {
                    WagerError::RoundNotFound(_) => StatusCode::NOT_FOUND,
                    WagerError::NotInitiator(_)
                    | WagerError::NotCreator
                    | WagerError::ReservedIdentity(_) => StatusCode::FORBIDDEN,
                    WagerError::RoundAlreadySettled(_) | WagerError::AlreadyClaimed(_) => {
                        StatusCode::CONFLICT
                    }
                    WagerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.kind(), e.to_string())
            }
        };
        (
            status,
            Json(serde_json::json!({"error": message, "kind": kind})),
        )
            .into_response()
    }
}

// ============ Request/Response types ============

#[derive(Deserialize)]
pub struct TransferRequest {
    pub to: Identity,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct SetAirdropPoolRequest {
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct InitiateRoundRequest {
    #[serde(with = "amount_serde")]
    pub stake: Amount,
    /// 1 = rock, 2 = paper, 3 = scissors, or the choice name
    pub choice: Value,
}

#[derive(Deserialize)]
pub struct AcceptRoundRequest {
    pub choice: Value,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub identity: Identity,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
    pub has_claimed: bool,
}

#[derive(Serialize)]
pub struct ClaimResponse {
    #[serde(with = "amount_serde")]
    pub claimed: Amount,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct OpenRoundsResponse {
    pub rounds: Vec<Round>,
}

// ============ Helper to get caller from header ============

fn caller_from_headers(headers: &HeaderMap) -> Result<Identity, ApiError> {
    headers
        .get("X-User-Id")
        .ok_or(ApiError::Unauthorized("Missing X-User-Id header"))?
        .to_str()
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ApiError::Unauthorized("Malformed X-User-Id header"))
}

/// Decode a request choice; anything but 1..=3 or a choice name is `InvalidChoice`
fn choice_from_request(value: &Value) -> Result<Choice, WagerError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(n) => Choice::try_from(n),
            None => Err(WagerError::InvalidChoice(n.to_string())),
        },
        Value::String(s) => s.parse(),
        other => Err(WagerError::InvalidChoice(other.to_string())),
    }
}

fn account(state: &AppState, identity: Identity) -> AccountResponse {
    AccountResponse {
        identity,
        balance: state.house().balance_of(&identity),
        has_claimed: state.house().has_claimed(&identity),
    }
}

// ============ Ledger handlers ============

pub async fn ledger_summary(State(state): State<AppState>) -> Json<LedgerSummary> {
    Json(state.house().summary())
}

pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    Ok(Json(account(&state, caller)))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(identity): Path<Identity>,
) -> Json<AccountResponse> {
    Json(account(&state, identity))
}

pub async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    state.house().transfer(&caller, &req.to, req.amount)?;
    Ok(Json(account(&state, caller)))
}

pub async fn claim_airdrop(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClaimResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let claimed = state.house().claim_airdrop(&caller)?;
    Ok(Json(ClaimResponse {
        claimed,
        balance: state.house().balance_of(&caller),
    }))
}

pub async fn set_airdrop_pool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetAirdropPoolRequest>,
) -> Result<Json<LedgerSummary>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    state.house().set_airdrop_pool(&caller, req.amount)?;
    Ok(Json(state.house().summary()))
}

// ============ Round handlers ============

pub async fn initiate_round(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InitiateRoundRequest>,
) -> Result<(StatusCode, Json<Round>), ApiError> {
    let caller = caller_from_headers(&headers)?;
    let choice = choice_from_request(&req.choice)?;
    let round = state.house().initiate_round(&caller, req.stake, choice)?;
    Ok((StatusCode::CREATED, Json(round)))
}

pub async fn list_open_rounds(State(state): State<AppState>) -> Json<OpenRoundsResponse> {
    Json(OpenRoundsResponse {
        rounds: state.house().open_rounds(),
    })
}

pub async fn get_round(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
) -> Result<Json<Round>, ApiError> {
    let round_id = RoundId(round_id);
    state
        .house()
        .round(round_id)
        .map(Json)
        .ok_or(ApiError::Wager(WagerError::RoundNotFound(round_id)))
}

pub async fn accept_round(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(round_id): Path<u64>,
    Json(req): Json<AcceptRoundRequest>,
) -> Result<Json<Round>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let choice = choice_from_request(&req.choice)?;
    let round = state
        .house()
        .accept_round(&caller, RoundId(round_id), choice)?;
    Ok(Json(round))
}

pub async fn terminate_round(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(round_id): Path<u64>,
) -> Result<Json<Round>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let round = state.house().terminate_round(&caller, RoundId(round_id))?;
    Ok(Json(round))
}

// ============ System handlers ============

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}
