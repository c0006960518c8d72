use super::{Access, AccessRule, RouteId};

/// Public Routes
///
/// Reachable without an identity. Nothing here redirects a signed-in user away.
pub fn public_routes() -> Vec<AccessRule> {
    vec![
        // /login
        // Credential form. Target of every unauthenticated redirect.
        AccessRule {
            id: RouteId::Login,
            pattern: "/login",
            access: Access::Public,
        },
        // /signup
        // Account creation, followed by an automatic login.
        AccessRule {
            id: RouteId::Signup,
            pattern: "/signup",
            access: Access::Public,
        },
    ]
}
