use std::future::Future;
use std::sync::Arc;

// --- Module Structure ---

// Identity, persistence and token inspection.
pub mod auth;
pub mod session;
pub mod storage;

// Transport and the typed endpoint layer on top of it.
pub mod api;
pub mod gateway;

// Data freshness.
pub mod cache;
pub mod invalidation;

// Navigation: the route table and the guard that reads it.
pub mod guard;
pub mod routes;

pub mod config;
pub mod error;
pub mod models;
pub mod views;

use cache::{Entry, QueryStatus, keys};
use guard::Navigation;
use invalidation::Mutation;
use models::{
    Feedback, FeedbackRequest, Identity, Proposal, ProposalRequest, Registration, Role, Session,
    SignupForm, UpdateProfileRequest, User, UserRecord,
};
use routes::MenuItem;
use views::SessionCard;

// --- Public Re-exports ---

pub use cache::QueryCache;
pub use config::{AppConfig, Env};
pub use error::{ApiError, ConferioError, ErrorKind, SessionError};
pub use gateway::ApiGateway;
pub use session::SessionStore;
pub use storage::{FileIdentityStorage, IdentityStorageState, MockIdentityStorage};

/// Conferio
///
/// The client context: one session store, one gateway and one query cache, constructed
/// together at startup and handed to every consumer. Cloning shares the same state.
///
/// Reads go through the cache; writes go through `Mutation`s so that the keys they affect
/// are invalidated, and only on success. A 401 from any call made here clears the identity
/// when `AppConfig::logout_on_unauthorized` is set.
#[derive(Clone)]
pub struct Conferio {
    pub config: AppConfig,
    pub session: SessionStore,
    pub gateway: ApiGateway,
    pub cache: QueryCache,
}

impl Conferio {
    /// Wires the components without touching storage. Call `session.initialize()` next.
    pub fn new(config: AppConfig, storage: IdentityStorageState) -> Self {
        let session = SessionStore::new(storage);
        let gateway = ApiGateway::new(&config.api_base_url, session.clone());
        Self {
            config,
            session,
            gateway,
            cache: QueryCache::new(),
        }
    }

    /// start
    ///
    /// The canonical startup: file-backed identity storage at `config.identity_path`,
    /// restored into memory.
    pub async fn start(config: AppConfig) -> Self {
        let storage = Arc::new(FileIdentityStorage::new(config.identity_path.clone()));
        let conferio = Self::new(config, storage);
        conferio.session.initialize().await;
        conferio
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    /// Runs the access guard for `path` against the live identity.
    pub fn navigate(&self, path: &str) -> Navigation {
        guard::resolve(path, self.identity().as_ref())
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        guard::visible_menu(self.identity().as_ref())
    }

    // --- Identity transitions ---

    /// login
    ///
    /// A 401 here means bad credentials, not an expired session, so it is returned as a
    /// plain API error. Cached data of any previous identity is dropped.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ConferioError> {
        let response = api::login(&self.gateway, username, password).await?;
        let identity = self
            .session
            .set_identity(
                response.token,
                UserRecord {
                    username: response.username,
                    role: response.role,
                },
            )
            .await?;
        self.cache.clear();
        Ok(identity)
    }

    /// Creates the account, then signs in with the same credentials.
    pub async fn signup(&self, form: &SignupForm) -> Result<Identity, ConferioError> {
        let request = form.validate()?;
        api::register(&self.gateway, &request).await?;
        self.login(&request.username, &request.password).await
    }

    pub async fn logout(&self) -> Result<(), ConferioError> {
        self.session.clear_identity().await?;
        self.cache.clear();
        Ok(())
    }

    // --- Reads ---

    pub async fn sessions(&self) -> Entry<Vec<Session>> {
        let gateway = self.gateway.clone();
        let entry = self
            .cache
            .read(
                keys::sessions(),
                move || async move { api::get_sessions(&gateway).await },
                true,
            )
            .await;
        self.observe(entry).await
    }

    /// Only fetched while signed in.
    pub async fn my_registrations(&self) -> Entry<Vec<Registration>> {
        let gateway = self.gateway.clone();
        let enabled = self.session.is_authenticated();
        let entry = self
            .cache
            .read(
                keys::my_registrations(),
                move || async move { api::get_my_registrations(&gateway).await },
                enabled,
            )
            .await;
        self.observe(entry).await
    }

    /// session_board
    ///
    /// Sessions joined with the caller's registrations. Fails only when the session list
    /// itself cannot be loaded; missing registrations just mean nothing is marked.
    pub async fn session_board(&self) -> Result<Vec<SessionCard>, ConferioError> {
        let (sessions, registrations) = tokio::join!(self.sessions(), self.my_registrations());
        let sessions = self.loaded(sessions)?;
        let registrations = registrations
            .ready_data()
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(views::session_board(
            &sessions,
            registrations,
            self.identity().as_ref(),
        ))
    }

    pub async fn my_proposals(&self) -> Entry<Vec<Proposal>> {
        let gateway = self.gateway.clone();
        let entry = self
            .cache
            .read(
                keys::my_proposals(),
                move || async move { api::get_my_proposals(&gateway).await },
                true,
            )
            .await;
        self.observe(entry).await
    }

    /// Every proposal, for reviewers.
    pub async fn all_proposals(&self) -> Entry<Vec<Proposal>> {
        let gateway = self.gateway.clone();
        let entry = self
            .cache
            .read(
                keys::proposals(),
                move || async move { api::get_all_proposals(&gateway).await },
                true,
            )
            .await;
        self.observe(entry).await
    }

    /// Uncached: the edit form always loads the latest version.
    pub async fn proposal(&self, proposal_id: i64) -> Result<Proposal, ConferioError> {
        let result = api::get_proposal(&self.gateway, proposal_id).await;
        self.settle(result).await
    }

    pub async fn admin_users(&self) -> Entry<Vec<User>> {
        let gateway = self.gateway.clone();
        let entry = self
            .cache
            .read(
                keys::admin_users(),
                move || async move { api::get_users(&gateway).await },
                true,
            )
            .await;
        self.observe(entry).await
    }

    /// Feedback of the selected session; idle while nothing is selected.
    pub async fn session_feedback(&self, session_id: Option<i64>) -> Entry<Vec<Feedback>> {
        let gateway = self.gateway.clone();
        let entry = self
            .cache
            .read(
                keys::feedback(session_id),
                move || async move {
                    match session_id {
                        Some(session_id) => api::get_session_feedback(&gateway, session_id).await,
                        None => Ok(Vec::new()),
                    }
                },
                session_id.is_some(),
            )
            .await;
        self.observe(entry).await
    }

    pub async fn user_profile(&self, username: &str) -> Entry<User> {
        let gateway = self.gateway.clone();
        let target = username.to_string();
        let entry = self
            .cache
            .read(
                keys::user_profile(username),
                move || async move { api::get_user_profile(&gateway, &target).await },
                true,
            )
            .await;
        self.observe(entry).await
    }

    // --- Mutations ---

    /// register_for_session
    ///
    /// Refused locally when the cached data already shows the caller registered or the
    /// session full, or when nobody is signed in.
    pub async fn register_for_session(
        &self,
        session_id: i64,
    ) -> Result<Registration, ConferioError> {
        if !self.session.is_authenticated() {
            return Err(ApiError::validation("Sign in to register for a session").into());
        }
        let registered = self
            .cache
            .peek::<Vec<Registration>>(&keys::my_registrations())
            .and_then(|entry| entry.ready_data().map(|r| views::registered_session_ids(r)))
            .unwrap_or_default();
        if registered.contains(&session_id) {
            return Err(ApiError::validation("Already registered for this session").into());
        }
        let full = self
            .cache
            .peek::<Vec<Session>>(&keys::sessions())
            .and_then(|entry| {
                entry.ready_data().and_then(|sessions| {
                    sessions
                        .iter()
                        .find(|s| s.id == session_id)
                        .map(Session::is_full)
                })
            })
            .unwrap_or(false);
        if full {
            return Err(ApiError::validation("Session is full").into());
        }

        self.run(
            Mutation::RegisterForSession,
            api::register_to_session(&self.gateway, session_id),
        )
        .await
    }

    pub async fn delete_session(&self, session_id: i64) -> Result<(), ConferioError> {
        self.run(
            Mutation::DeleteSession,
            api::delete_session(&self.gateway, session_id),
        )
        .await
    }

    pub async fn create_proposal(
        &self,
        request: &ProposalRequest,
    ) -> Result<Proposal, ConferioError> {
        request.validate()?;
        self.run(
            Mutation::CreateProposal,
            api::create_proposal(&self.gateway, request),
        )
        .await
    }

    pub async fn update_proposal(
        &self,
        proposal_id: i64,
        request: &ProposalRequest,
    ) -> Result<Proposal, ConferioError> {
        request.validate()?;
        self.run(
            Mutation::UpdateProposal,
            api::update_proposal(&self.gateway, proposal_id, request),
        )
        .await
    }

    pub async fn delete_proposal(&self, proposal_id: i64) -> Result<(), ConferioError> {
        self.run(
            Mutation::DeleteProposal,
            api::delete_proposal(&self.gateway, proposal_id),
        )
        .await
    }

    pub async fn review_proposal(
        &self,
        proposal_id: i64,
        status: Option<&str>,
        rejection_reason: Option<&str>,
    ) -> Result<Proposal, ConferioError> {
        self.run(
            Mutation::ReviewProposal,
            api::review_proposal(&self.gateway, proposal_id, status, rejection_reason),
        )
        .await
    }

    pub async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<Feedback, ConferioError> {
        request.validate()?;
        self.run(
            Mutation::SubmitFeedback,
            api::submit_feedback(&self.gateway, request),
        )
        .await
    }

    /// `session_id` names the feedback list the entry belongs to, so that list is refreshed.
    pub async fn delete_feedback(
        &self,
        feedback_id: i64,
        session_id: i64,
    ) -> Result<(), ConferioError> {
        self.run(
            Mutation::DeleteFeedback { session_id },
            api::delete_feedback(&self.gateway, feedback_id),
        )
        .await
    }

    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<User, ConferioError> {
        self.run(
            Mutation::UpdateProfile,
            api::update_profile(&self.gateway, request),
        )
        .await
    }

    pub async fn update_user_role(&self, user_id: i64, role: Role) -> Result<User, ConferioError> {
        self.run(
            Mutation::UpdateUserRole,
            api::update_user_role(&self.gateway, user_id, role),
        )
        .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ConferioError> {
        self.run(Mutation::DeleteUser, api::delete_user(&self.gateway, user_id))
            .await
            .map(|_| ())
    }

    // --- Error plumbing ---

    async fn run<T, Fut>(&self, mutation: Mutation, call: Fut) -> Result<T, ConferioError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = self.cache.mutate_and_invalidate(&mutation, call).await;
        self.settle(result).await
    }

    async fn settle<T>(&self, result: Result<T, ApiError>) -> Result<T, ConferioError> {
        match result {
            Ok(value) => Ok(value),
            Err(error) if error.is_unauthorized() && self.config.logout_on_unauthorized => {
                self.expire_session().await;
                Err(ConferioError::SessionExpired(error))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn observe<T>(&self, entry: Entry<T>) -> Entry<T> {
        let unauthorized = entry.error.as_ref().is_some_and(ApiError::is_unauthorized);
        if unauthorized && self.config.logout_on_unauthorized {
            self.expire_session().await;
        }
        entry
    }

    /// loaded
    ///
    /// The ready data of a read, or the error that kept it from loading. A 401 comes back
    /// as `SessionExpired` (with its login redirect) exactly like it does for mutations.
    pub fn loaded<T>(&self, entry: Entry<T>) -> Result<Arc<T>, ConferioError> {
        if entry.status == QueryStatus::Ready
            && let Some(data) = entry.data
        {
            return Ok(data);
        }
        Err(match entry.error {
            Some(error) if error.is_unauthorized() && self.config.logout_on_unauthorized => {
                ConferioError::SessionExpired(error)
            }
            Some(error) => error.into(),
            None => ApiError::network("data not loaded").into(),
        })
    }

    async fn expire_session(&self) {
        tracing::info!("backend rejected the token; signing out");
        if let Err(error) = self.logout().await {
            tracing::warn!(%error, "could not clear the expired identity");
        }
    }
}
