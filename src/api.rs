use crate::{
    error::ApiError,
    gateway::ApiGateway,
    models::{
        DeleteUserResponse, Feedback, FeedbackRequest, LoginRequest, LoginResponse, Proposal,
        ProposalRequest, RegisterRequest, Registration, ReviewRequest, Role, RoleUpdateRequest,
        Session, UpdateProfileRequest, User,
    },
};

// --- Auth ---

/// login
///
/// `POST /api/auth/login`. Returns the token and the user record; storing them is the
/// session store's job.
pub async fn login(
    gateway: &ApiGateway,
    username: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    let payload = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    gateway.post("/api/auth/login", Some(&payload)).await
}

/// register
///
/// `POST /api/auth/register`. Creates the account; does not sign in.
pub async fn register(gateway: &ApiGateway, request: &RegisterRequest) -> Result<User, ApiError> {
    gateway.post("/api/auth/register", Some(request)).await
}

// --- Sessions & registrations ---

pub async fn get_sessions(gateway: &ApiGateway) -> Result<Vec<Session>, ApiError> {
    gateway.get("/api/sessions").await
}

/// `DELETE /api/sessions/{id}` (coordinator dashboard).
pub async fn delete_session(gateway: &ApiGateway, session_id: i64) -> Result<(), ApiError> {
    gateway.delete(&format!("/api/sessions/{session_id}")).await
}

/// register_to_session
///
/// `POST /api/registrations/session/{sessionId}`, no body. The backend rejects a duplicate
/// or a full session with a 400 carrying the reason.
pub async fn register_to_session(
    gateway: &ApiGateway,
    session_id: i64,
) -> Result<Registration, ApiError> {
    gateway
        .post(&format!("/api/registrations/session/{session_id}"), None::<&()>)
        .await
}

pub async fn get_my_registrations(gateway: &ApiGateway) -> Result<Vec<Registration>, ApiError> {
    gateway.get("/api/registrations/my").await
}

// --- Proposals ---

pub async fn get_my_proposals(gateway: &ApiGateway) -> Result<Vec<Proposal>, ApiError> {
    gateway.get("/api/proposals/my").await
}

/// Loads one proposal to prefill the edit form.
pub async fn get_proposal(gateway: &ApiGateway, proposal_id: i64) -> Result<Proposal, ApiError> {
    gateway.get(&format!("/api/proposals/{proposal_id}")).await
}

pub async fn create_proposal(
    gateway: &ApiGateway,
    request: &ProposalRequest,
) -> Result<Proposal, ApiError> {
    gateway.post("/api/proposals", Some(request)).await
}

pub async fn update_proposal(
    gateway: &ApiGateway,
    proposal_id: i64,
    request: &ProposalRequest,
) -> Result<Proposal, ApiError> {
    gateway.put(&format!("/api/proposals/{proposal_id}"), request).await
}

pub async fn delete_proposal(gateway: &ApiGateway, proposal_id: i64) -> Result<(), ApiError> {
    gateway.delete(&format!("/api/proposals/{proposal_id}")).await
}

/// All proposals, for the review queue.
pub async fn get_all_proposals(gateway: &ApiGateway) -> Result<Vec<Proposal>, ApiError> {
    gateway.get("/api/proposals").await
}

/// review_proposal
///
/// `POST /api/proposals/{id}/review`. The request is normalized first, see
/// `ReviewRequest::normalized`.
pub async fn review_proposal(
    gateway: &ApiGateway,
    proposal_id: i64,
    status: Option<&str>,
    rejection_reason: Option<&str>,
) -> Result<Proposal, ApiError> {
    let payload = ReviewRequest::normalized(status, rejection_reason);
    gateway
        .post(&format!("/api/proposals/{proposal_id}/review"), Some(&payload))
        .await
}

// --- Feedback ---

pub async fn submit_feedback(
    gateway: &ApiGateway,
    request: &FeedbackRequest,
) -> Result<Feedback, ApiError> {
    request.validate()?;
    gateway.post("/api/feedback", Some(request)).await
}

pub async fn get_session_feedback(
    gateway: &ApiGateway,
    session_id: i64,
) -> Result<Vec<Feedback>, ApiError> {
    gateway.get(&format!("/api/feedback/session/{session_id}")).await
}

pub async fn delete_feedback(gateway: &ApiGateway, feedback_id: i64) -> Result<(), ApiError> {
    gateway.delete(&format!("/api/feedback/{feedback_id}")).await
}

// --- Users ---

pub async fn get_users(gateway: &ApiGateway) -> Result<Vec<User>, ApiError> {
    gateway.get("/api/users").await
}

/// `GET /api/users/{username}`; the username is percent-encoded into the path.
pub async fn get_user_profile(gateway: &ApiGateway, username: &str) -> Result<User, ApiError> {
    gateway
        .get(&format!("/api/users/{}", urlencoding::encode(username)))
        .await
}

pub async fn update_profile(
    gateway: &ApiGateway,
    request: &UpdateProfileRequest,
) -> Result<User, ApiError> {
    gateway.put("/api/users/profile", request).await
}

pub async fn update_user_role(
    gateway: &ApiGateway,
    user_id: i64,
    role: Role,
) -> Result<User, ApiError> {
    gateway
        .put(&format!("/api/users/{user_id}/role"), &RoleUpdateRequest { role })
        .await
}

/// `DELETE /api/users/{id}`. Older backends answer with an empty body, hence the `Option`.
pub async fn delete_user(
    gateway: &ApiGateway,
    user_id: i64,
) -> Result<Option<DeleteUserResponse>, ApiError> {
    gateway.delete_with(&format!("/api/users/{user_id}")).await
}
