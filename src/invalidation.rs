use crate::cache::{QueryKey, keys};

/// Mutation
///
/// Every write the client performs. The keys a mutation invalidates are a fixed table,
/// not inferred from what the views happen to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    RegisterForSession,
    DeleteSession,
    CreateProposal,
    UpdateProposal,
    DeleteProposal,
    ReviewProposal,
    SubmitFeedback,
    DeleteFeedback { session_id: i64 },
    UpdateProfile,
    UpdateUserRole,
    DeleteUser,
}

impl Mutation {
    /// Keys to invalidate once the mutation has succeeded.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match self {
            // Seat counts and membership both change.
            Mutation::RegisterForSession => vec![keys::sessions(), keys::my_registrations()],
            Mutation::DeleteSession => vec![keys::sessions()],
            Mutation::CreateProposal | Mutation::UpdateProposal | Mutation::DeleteProposal => {
                vec![keys::my_proposals()]
            }
            Mutation::ReviewProposal => vec![keys::proposals()],
            Mutation::DeleteFeedback { session_id } => vec![keys::feedback(Some(*session_id))],
            Mutation::UpdateUserRole | Mutation::DeleteUser => vec![keys::admin_users()],
            Mutation::SubmitFeedback | Mutation::UpdateProfile => Vec::new(),
        }
    }
}
