use conferio_client::{
    guard::{self, LANDING_PATH, LOGIN_PATH, Navigation},
    models::{Identity, Role, UserRecord},
    routes::{Access, AccessRule, RouteId, route_table},
};

fn identity(role: Role) -> Identity {
    Identity::new(
        "token",
        UserRecord {
            username: "someone".to_string(),
            role,
        },
    )
}

fn allowed(path: &str, who: Option<Role>) -> bool {
    let who = who.map(identity);
    matches!(guard::resolve(path, who.as_ref()), Navigation::Allow { .. })
}

fn redirect(path: &str, who: Option<Role>) -> Option<&'static str> {
    let who = who.map(identity);
    match guard::resolve(path, who.as_ref()) {
        Navigation::Redirect { to } => Some(to),
        Navigation::Allow { .. } => None,
    }
}

#[test]
fn test_public_routes_admit_everyone() {
    for path in ["/login", "/signup"] {
        assert!(allowed(path, None), "{path} signed out");
        for role in Role::ALL {
            assert!(allowed(path, Some(role)), "{path} as {role}");
        }
    }
}

#[test]
fn test_authenticated_routes_need_identity() {
    for path in ["/sessions", "/profile", "/profile/bob", "/my-proposals", "/feedback/session/3"] {
        assert_eq!(redirect(path, None), Some(LOGIN_PATH), "{path} signed out");
        for role in Role::ALL {
            assert!(allowed(path, Some(role)), "{path} as {role}");
        }
    }
}

#[test]
fn test_role_matrix() {
    // (path, USER, COORDINATOR, ADMIN)
    let table = [
        ("/proposals", false, true, true),
        ("/coordinator-dashboard", false, true, false),
        ("/admin-dashboard", false, false, true),
    ];

    for (path, user, coordinator, admin) in table {
        assert_eq!(redirect(path, None), Some(LOGIN_PATH), "{path} signed out");
        assert_eq!(allowed(path, Some(Role::User)), user, "{path} as USER");
        assert_eq!(allowed(path, Some(Role::Coordinator)), coordinator, "{path} as COORDINATOR");
        assert_eq!(allowed(path, Some(Role::Admin)), admin, "{path} as ADMIN");
    }
}

#[test]
fn test_role_denial_lands_on_sessions() {
    assert_eq!(redirect("/admin-dashboard", Some(Role::User)), Some(LANDING_PATH));
    // Admins are not coordinators
    assert_eq!(redirect("/coordinator-dashboard", Some(Role::Admin)), Some(LANDING_PATH));
    assert_eq!(redirect("/admin-dashboard", Some(Role::Coordinator)), Some(LANDING_PATH));
}

#[test]
fn test_unknown_path_goes_to_landing() {
    assert_eq!(redirect("/does-not-exist", Some(Role::Admin)), Some(LANDING_PATH));
    assert_eq!(redirect("/", None), Some(LANDING_PATH));
    // ...which then sends a signed-out caller to /login
    assert_eq!(redirect(LANDING_PATH, None), Some(LOGIN_PATH));
}

#[test]
fn test_empty_role_set_admits_nobody() {
    let rule = AccessRule {
        id: RouteId::AdminDashboard,
        pattern: "/locked",
        access: Access::Roles(&[]),
    };
    assert!(!guard::can_enter(&rule, None));
    for role in Role::ALL {
        assert!(!guard::can_enter(&rule, Some(&identity(role))), "{role}");
    }
}

#[test]
fn test_route_parameters_are_extracted() {
    let who = identity(Role::User);
    match guard::resolve("/feedback/session/42?from=board", Some(&who)) {
        Navigation::Allow { route, params } => {
            assert_eq!(route, RouteId::SessionFeedback);
            assert_eq!(params.get("sessionId").map(String::as_str), Some("42"));
        }
        other => panic!("expected allow, got {other:?}"),
    }

    match guard::resolve("/profile/jane%40conf", Some(&who)) {
        Navigation::Allow { route, params } => {
            assert_eq!(route, RouteId::OtherProfile);
            assert_eq!(params["username"], "jane@conf");
        }
        other => panic!("expected allow, got {other:?}"),
    }
}

#[test]
fn test_every_route_has_a_unique_pattern() {
    let table = route_table();
    assert_eq!(table.len(), 10);
    for (index, rule) in table.iter().enumerate() {
        assert!(
            table[index + 1..].iter().all(|other| other.pattern != rule.pattern),
            "duplicate pattern {}",
            rule.pattern
        );
    }
}

#[test]
fn test_menu_follows_access() {
    let labels = |who: Option<Role>| -> Vec<&'static str> {
        let who = who.map(identity);
        guard::visible_menu(who.as_ref()).iter().map(|item| item.label).collect()
    };

    assert!(labels(None).is_empty());
    assert_eq!(labels(Some(Role::User)), vec!["Sessions", "My Proposals", "Profile"]);
    assert_eq!(
        labels(Some(Role::Coordinator)),
        vec!["Sessions", "My Proposals", "Profile", "Proposals Review", "Coordinator Dashboard"]
    );
    assert_eq!(
        labels(Some(Role::Admin)),
        vec!["Sessions", "My Proposals", "Profile", "Proposals Review", "Admin Dashboard"]
    );
}
