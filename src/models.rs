use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// --- Identity ---

/// Role
///
/// The RBAC field carried by every account. Serialized in upper case, the way the
/// backend emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Coordinator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Coordinator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Coordinator => "COORDINATOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "COORDINATOR" => Ok(Role::Coordinator),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// Identity
///
/// The authenticated user as the client knows it: the opaque bearer token plus the user
/// record returned at login. Owned by the `SessionStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// UserRecord
///
/// The user half of the identity, as persisted next to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(token: impl Into<String>, user: UserRecord) -> Self {
        Self {
            token: token.into(),
            username: user.username,
            role: user.role,
        }
    }

    pub fn user(&self) -> UserRecord {
        UserRecord {
            username: self.username.clone(),
            role: self.role,
        }
    }
}

// --- Auth payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// SignupForm
///
/// What the sign-up screen collects. The confirmation never leaves the client.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<RegisterRequest, ApiError> {
        let fields = [
            &self.username,
            &self.email,
            &self.full_name,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ApiError::validation("All fields required"));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::validation("Passwords do not match"));
        }
        if self.password.chars().count() < 6 {
            return Err(ApiError::validation(
                "Password must be at least 6 characters",
            ));
        }

        Ok(RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

// --- Sessions & registrations ---

/// Session
///
/// A scheduled conference slot, as listed by `GET /api/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    #[serde(default)]
    pub proposal_id: Option<i64>,
    #[serde(default)]
    pub speaker_id: Option<i64>,
    #[serde(default)]
    pub speaker_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub session_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub room: String,
    // Unlimited when the backend leaves it out.
    #[serde(default)]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub current_participants: i32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Session {
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.current_participants >= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    pub session_id: i64,
    #[serde(default)]
    pub session_title: Option<String>,
    #[serde(default)]
    pub session_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub registered_at: Option<NaiveDateTime>,
}

// --- Proposals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Rejected => "REJECTED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reviewed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// ProposalRequest
///
/// Payload of both `POST /api/proposals` and `PUT /api/proposals/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProposalRequest {
    pub title: String,
    pub description: String,
}

impl ProposalRequest {
    /// Mirrors the backend's bean validation so obviously bad forms never hit the wire.
    pub fn validate(&self) -> Result<(), ApiError> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            return Err(ApiError::validation("Title is required"));
        }
        if !(5..=200).contains(&title_len) {
            return Err(ApiError::validation(
                "Title must be between 5 and 200 characters",
            ));
        }
        let description_len = self.description.trim().chars().count();
        if description_len == 0 {
            return Err(ApiError::validation("Description is required"));
        }
        if description_len < 20 {
            return Err(ApiError::validation(
                "Description must be at least 20 characters",
            ));
        }
        Ok(())
    }
}

/// ReviewRequest
///
/// Body of `POST /api/proposals/{id}/review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub status: ProposalStatus,
    pub rejection_reason: String,
}

impl ReviewRequest {
    /// normalized
    ///
    /// Any spelling of accepted/rejected is upper-cased; anything else, including a
    /// missing status, becomes a rejection. A missing reason is sent as an empty string.
    pub fn normalized(status: Option<&str>, rejection_reason: Option<&str>) -> Self {
        let status = match status.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("ACCEPTED") => ProposalStatus::Accepted,
            _ => ProposalStatus::Rejected,
        };
        Self {
            status,
            rejection_reason: rejection_reason.unwrap_or_default().to_string(),
        }
    }
}

// --- Feedback ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    pub session_id: i64,
    #[serde(default)]
    pub session_title: Option<String>,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub session_id: i64,
    pub rating: i32,
    pub comment: String,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.comment.trim().is_empty() {
            return Err(ApiError::validation("Please provide feedback"));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::validation("Rating must be between 1 and 5"));
        }
        Ok(())
    }
}

// --- Users ---

/// User
///
/// An account as returned by the `/api/users` resource and by registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// UpdateProfileRequest
///
/// Body of `PUT /api/users/profile`. The username is sent but is not editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

/// Body of `DELETE /api/users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeleteUserResponse {
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
