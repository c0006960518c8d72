use super::{Access, AccessRule, RouteId};

/// Authenticated Routes
///
/// Views open to any signed-in identity. A missing identity is sent to `/login`.
pub fn authenticated_routes() -> Vec<AccessRule> {
    vec![
        // /sessions
        // The session board; also the landing view after login and after a role denial.
        AccessRule {
            id: RouteId::Sessions,
            pattern: "/sessions",
            access: Access::Authenticated,
        },
        // /profile
        // The caller's own editable profile.
        AccessRule {
            id: RouteId::Profile,
            pattern: "/profile",
            access: Access::Authenticated,
        },
        // /profile/:username
        // Read-only view of somebody else's profile.
        AccessRule {
            id: RouteId::OtherProfile,
            pattern: "/profile/:username",
            access: Access::Authenticated,
        },
        AccessRule {
            id: RouteId::MyProposals,
            pattern: "/my-proposals",
            access: Access::Authenticated,
        },
        // /feedback/session/:sessionId
        // Feedback form for one session.
        AccessRule {
            id: RouteId::SessionFeedback,
            pattern: "/feedback/session/:sessionId",
            access: Access::Authenticated,
        },
    ]
}
