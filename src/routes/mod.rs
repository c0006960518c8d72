/// Route Table Index
///
/// The navigable views of the client, split by who may enter them. Each module returns
/// the `AccessRule`s for its tier; `route_table()` stitches them together in match order.

/// Views anyone may open (sign-in and sign-up).
pub mod public;

/// Views open to any signed-in identity, whatever its role.
pub mod authenticated;

/// Views restricted to coordinators and/or admins.
pub mod privileged;

use std::sync::LazyLock;

use crate::models::Role;

/// RouteId
///
/// Stable identifier of a view, independent of its path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteId {
    Login,
    Signup,
    Sessions,
    Profile,
    OtherProfile,
    MyProposals,
    SessionFeedback,
    Proposals,
    CoordinatorDashboard,
    AdminDashboard,
}

/// Access
///
/// Who may enter a route. `Roles` with an empty slice admits nobody, admins included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No identity needed.
    Public,
    /// Any identity, whatever its role.
    Authenticated,
    /// Only identities holding one of these roles.
    Roles(&'static [Role]),
}

/// AccessRule
///
/// Static configuration binding a path pattern (`:name` segments capture parameters) to
/// the roles allowed through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    pub id: RouteId,
    pub pattern: &'static str,
    pub access: Access,
}

/// MenuItem
///
/// An entry of the navigation bar. Visibility follows the access rule of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
}

pub const MENU: [MenuItem; 6] = [
    MenuItem {
        label: "Sessions",
        path: "/sessions",
    },
    MenuItem {
        label: "My Proposals",
        path: "/my-proposals",
    },
    MenuItem {
        label: "Profile",
        path: "/profile",
    },
    MenuItem {
        label: "Proposals Review",
        path: "/proposals",
    },
    MenuItem {
        label: "Coordinator Dashboard",
        path: "/coordinator-dashboard",
    },
    MenuItem {
        label: "Admin Dashboard",
        path: "/admin-dashboard",
    },
];

static ROUTE_TABLE: LazyLock<Vec<AccessRule>> = LazyLock::new(|| {
    public::public_routes()
        .into_iter()
        .chain(authenticated::authenticated_routes())
        .chain(privileged::privileged_routes())
        .collect()
});

/// Every known route, public first.
pub fn route_table() -> &'static [AccessRule] {
    &ROUTE_TABLE
}
