//! Derived view state: the small computations screens make on top of cached data.

use std::collections::HashSet;

use crate::models::{Identity, Proposal, ProposalStatus, Registration, Role, Session, User};

/// Ids of the sessions the caller is registered for.
pub fn registered_session_ids(registrations: &[Registration]) -> HashSet<i64> {
    registrations.iter().map(|registration| registration.session_id).collect()
}

/// SessionCard
///
/// One row of the session board with its registration affordance.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub session: Session,
    pub is_registered: bool,
    pub is_full: bool,
    /// `!is_registered && !is_full && signed in`
    pub can_register: bool,
}

pub fn session_card(
    session: &Session,
    registered: &HashSet<i64>,
    identity: Option<&Identity>,
) -> SessionCard {
    let is_registered = registered.contains(&session.id);
    let is_full = session.is_full();
    SessionCard {
        session: session.clone(),
        is_registered,
        is_full,
        can_register: !is_registered && !is_full && identity.is_some(),
    }
}

pub fn session_board(
    sessions: &[Session],
    registrations: &[Registration],
    identity: Option<&Identity>,
) -> Vec<SessionCard> {
    let registered = registered_session_ids(registrations);
    sessions
        .iter()
        .map(|session| session_card(session, &registered, identity))
        .collect()
}

/// ReviewQueue
///
/// Proposals split the way the review screen shows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQueue {
    pub pending: Vec<Proposal>,
    pub reviewed: Vec<Proposal>,
}

pub fn review_queue(proposals: &[Proposal]) -> ReviewQueue {
    let (pending, reviewed) = proposals
        .iter()
        .cloned()
        .partition(|proposal| proposal.status == ProposalStatus::Pending);
    ReviewQueue { pending, reviewed }
}

/// Only pending proposals may still be edited or withdrawn by their author.
pub fn is_editable(proposal: &Proposal) -> bool {
    proposal.status == ProposalStatus::Pending
}

/// The rejection reason, shown only on rejected proposals that have one.
pub fn rejection_note(proposal: &Proposal) -> Option<&str> {
    match proposal.status {
        ProposalStatus::Rejected => proposal
            .rejection_reason
            .as_deref()
            .filter(|reason| !reason.trim().is_empty()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

pub fn filter_users(users: &[User], filter: RoleFilter) -> Vec<User> {
    match filter {
        RoleFilter::All => users.to_vec(),
        RoleFilter::Only(role) => users.iter().filter(|user| user.role == role).cloned().collect(),
    }
}

/// Headline numbers of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleCounts {
    pub total: usize,
    pub admins: usize,
    pub coordinators: usize,
}

pub fn role_counts(users: &[User]) -> RoleCounts {
    RoleCounts {
        total: users.len(),
        admins: users.iter().filter(|user| user.role == Role::Admin).count(),
        coordinators: users.iter().filter(|user| user.role == Role::Coordinator).count(),
    }
}

/// A role change is only offered when it actually changes something.
pub fn role_change(user: &User, selected: Role) -> Option<Role> {
    (selected != user.role).then_some(selected)
}
