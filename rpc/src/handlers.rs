//! Request handlers and wire DTOs.
//!
//! Every response uses the `{success, message?, data?}` envelope. Records
//! that cross the wire are re-shaped into DTOs here; stored records never
//! serialize directly to clients except where the shapes coincide.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use ballot_engine::{
    CandidateUpdate, EngineError, NewCandidate, NewElection, NewVoter, OriginMetadata,
};
use ballot_store::voter::{VoterQuery, VoterRecord};
use ballot_store::BallotStore;
use ballot_types::{CandidateId, ElectionId, ElectionStatus, ReceiptHash, TimestampMs, VoterId};

use crate::error::ApiError;
use crate::server::AppState;

// ── Envelope ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: None,
        data: Some(data),
    })
}

fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
        }),
    )
}

// ── Auth plumbing ────────────────────────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ApiError::Engine(EngineError::Unauthenticated(
                "missing bearer token".to_string(),
            ))
        })
}

fn origin_from_headers(headers: &HeaderMap) -> OriginMetadata {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    OriginMetadata {
        // First hop of the forwarding chain when behind a proxy.
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: header_str(header::USER_AGENT),
    }
}

// ── Voter DTOs ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct VoterSummary {
    pub id: VoterId,
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    pub role: String,
    pub is_verified: bool,
    pub has_voted: bool,
    pub registered_at: TimestampMs,
}

impl From<VoterRecord> for VoterSummary {
    fn from(v: VoterRecord) -> Self {
        Self {
            id: v.id,
            email: v.email,
            full_name: v.full_name,
            national_id: v.national_id,
            role: if v.role.is_admin() { "admin" } else { "voter" }.to_string(),
            is_verified: v.is_verified,
            has_voted: v.has_voted,
            registered_at: v.registered_at,
        }
    }
}

#[derive(Serialize)]
pub struct VoterListResponse {
    pub voters: Vec<VoterSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

// ── Vote DTOs ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CastVoteRequest {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: ElectionStatus,
}

// ── Public: registration ─────────────────────────────────────────────────

pub async fn register<S: BallotStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<NewVoter>,
) -> Result<impl IntoResponse, ApiError> {
    let voter = state.registry.register_voter(req, TimestampMs::now())?;
    Ok(created(
        "registration successful; await verification",
        VoterSummary::from(voter),
    ))
}

// ── Public: elections ────────────────────────────────────────────────────

pub async fn list_elections<S: BallotStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.registry.list_elections()?))
}

pub async fn active_elections<S: BallotStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.registry.active_elections(TimestampMs::now())?))
}

pub async fn election_detail<S: BallotStore>(
    State(state): State<AppState<S>>,
    Path(election_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state
        .registry
        .election_detail(ElectionId::new(election_id))?))
}

// ── Votes ────────────────────────────────────────────────────────────────

pub async fn cast_vote<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = TimestampMs::now();
    let voter = state.gate.authenticate(bearer_token(&headers)?, now)?;
    state.gate.require_verified(&voter)?;
    let receipt = state.casting.cast_vote(
        voter.id,
        req.election_id,
        req.candidate_id,
        origin_from_headers(&headers),
        now,
    )?;
    Ok(created("vote recorded", receipt))
}

pub async fn vote_status<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(election_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let now = TimestampMs::now();
    let voter = state.gate.authenticate(bearer_token(&headers)?, now)?;
    Ok(ok(state
        .receipts
        .vote_status(voter.id, ElectionId::new(election_id))?))
}

pub async fn vote_history<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let now = TimestampMs::now();
    let voter = state.gate.authenticate(bearer_token(&headers)?, now)?;
    Ok(ok(state.receipts.vote_history(voter.id)?))
}

/// Public by design: anyone holding a receipt hash may confirm the vote
/// it references. The response never names the voter.
pub async fn verify_vote<S: BallotStore>(
    State(state): State<AppState<S>>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hash = ReceiptHash::parse_hex(&hash)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    Ok(ok(state.receipts.verify_vote(&hash)?))
}

// ── Admin ────────────────────────────────────────────────────────────────

pub async fn admin_dashboard<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(ok(state.tally.dashboard()?))
}

pub async fn admin_list_users<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Query(query): Query<VoterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let page = state.registry.list_voters(&query)?;
    let total_pages = page.total_pages();
    Ok(ok(VoterListResponse {
        voters: page.voters.into_iter().map(VoterSummary::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages,
    }))
}

pub async fn admin_verify_user<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(voter_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let voter = state.registry.verify_voter(VoterId::new(voter_id))?;
    Ok(ok(VoterSummary::from(voter)))
}

pub async fn admin_create_election<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<NewElection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let election = state.registry.create_election(req, TimestampMs::now())?;
    Ok(created("election created", election))
}

pub async fn admin_set_election_status<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(election_id): Path<u64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(ok(state
        .registry
        .set_election_status(ElectionId::new(election_id), req.status)?))
}

pub async fn admin_election_results<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(election_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(ok(state.tally.results(ElectionId::new(election_id))?))
}

pub async fn admin_add_candidate<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<NewCandidate>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let candidate = state.registry.add_candidate(req)?;
    Ok(created("candidate added", candidate))
}

pub async fn admin_update_candidate<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(candidate_id): Path<u64>,
    Json(req): Json<CandidateUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(ok(state
        .registry
        .update_candidate(CandidateId::new(candidate_id), req)?))
}

pub async fn admin_deactivate_candidate<S: BallotStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(candidate_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(ok(state
        .registry
        .deactivate_candidate(CandidateId::new(candidate_id))?))
}

fn require_admin<S: BallotStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let voter = state
        .gate
        .authenticate(bearer_token(headers)?, TimestampMs::now())?;
    state.gate.require_admin(&voter)?;
    Ok(())
}
