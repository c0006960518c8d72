use std::collections::BTreeMap;

use crate::{
    models::Identity,
    routes::{Access, AccessRule, MENU, MenuItem, RouteId, route_table},
};

/// Where unauthenticated callers are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated callers land after login, after a role denial and for unknown paths.
pub const LANDING_PATH: &str = "/sessions";

/// Navigation
///
/// Outcome of a navigation attempt. Denials always redirect; there is no error view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow {
        route: RouteId,
        params: BTreeMap<String, String>,
    },
    Redirect {
        to: &'static str,
    },
}

/// can_enter
///
/// 1. Public routes admit everyone, signed in or not.
/// 2. Everything else needs an identity.
/// 3. Role-restricted routes need the identity's role in the set; an empty set admits
///    nobody.
pub fn can_enter(rule: &AccessRule, identity: Option<&Identity>) -> bool {
    match (rule.access, identity) {
        (Access::Public, _) => true,
        (_, None) => false,
        (Access::Authenticated, Some(_)) => true,
        (Access::Roles(roles), Some(identity)) => roles.contains(&identity.role),
    }
}

/// Redirect target for a denied navigation.
pub fn denial_redirect(identity: Option<&Identity>) -> &'static str {
    match identity {
        None => LOGIN_PATH,
        Some(_) => LANDING_PATH,
    }
}

/// match_route
///
/// Finds the rule whose pattern matches `path` and extracts its `:name` parameters
/// (percent-decoded). The query string and a trailing slash are ignored.
pub fn match_route(path: &str) -> Option<(&'static AccessRule, BTreeMap<String, String>)> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    route_table()
        .iter()
        .find_map(|rule| match_pattern(rule.pattern, path).map(|params| (rule, params)))
}

/// resolve
///
/// The guard proper: decides whether `identity` may open `path`. Unknown paths go to the
/// landing view (which itself sends a signed-out caller on to `/login`).
pub fn resolve(path: &str, identity: Option<&Identity>) -> Navigation {
    let Some((rule, params)) = match_route(path) else {
        tracing::debug!(path, "unknown path");
        return Navigation::Redirect { to: LANDING_PATH };
    };

    if can_enter(rule, identity) {
        Navigation::Allow {
            route: rule.id,
            params,
        }
    } else {
        let to = denial_redirect(identity);
        tracing::info!(path, redirect = to, "navigation denied");
        Navigation::Redirect { to }
    }
}

/// Menu entries the identity may follow. Nothing is shown while signed out.
pub fn visible_menu(identity: Option<&Identity>) -> Vec<MenuItem> {
    if identity.is_none() {
        return Vec::new();
    }
    MENU.iter()
        .filter(|item| match_route(item.path).is_some_and(|(rule, _)| can_enter(rule, identity)))
        .copied()
        .collect()
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        match expected.strip_prefix(':') {
            Some(name) => {
                let value = urlencoding::decode(actual)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| actual.to_string());
                params.insert(name.to_string(), value);
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}
