use super::{Access, AccessRule, RouteId};
use crate::models::Role;

/// Privileged Routes
///
/// Review and administration views. Each rule names the exact roles it admits; a signed-in
/// identity without one of them is sent back to `/sessions`, never shown a 403.
pub fn privileged_routes() -> Vec<AccessRule> {
    vec![
        // /proposals
        // The review queue, shared by coordinators and admins.
        AccessRule {
            id: RouteId::Proposals,
            pattern: "/proposals",
            access: Access::Roles(&[Role::Coordinator, Role::Admin]),
        },
        // /coordinator-dashboard
        // Session and feedback moderation. Coordinators only: admins are NOT admitted.
        AccessRule {
            id: RouteId::CoordinatorDashboard,
            pattern: "/coordinator-dashboard",
            access: Access::Roles(&[Role::Coordinator]),
        },
        // /admin-dashboard
        // User management.
        AccessRule {
            id: RouteId::AdminDashboard,
            pattern: "/admin-dashboard",
            access: Access::Roles(&[Role::Admin]),
        },
    ]
}
