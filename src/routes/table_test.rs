use super::*;

#[test]
fn normalize_strips_query_fragment_and_slashes() {
    assert_eq!(normalize("/courses/?tab=mine"), "/courses");
    assert_eq!(normalize("dashboard#top"), "/dashboard");
    assert_eq!(normalize("//assignments//"), "/assignments");
    assert_eq!(normalize(""), "/");
}

#[test]
fn login_is_a_top_level_public_route() {
    let m = resolve(ROUTES, "/login").unwrap();
    assert_eq!(m.name(), Some("Login"));
    assert_eq!(m.matched.len(), 1);
    assert!(!m.requires_auth());
}

#[test]
fn child_route_inherits_parent_in_chain() {
    let m = resolve(ROUTES, "/dashboard").unwrap();
    assert_eq!(m.name(), Some("Dashboard"));
    assert_eq!(m.matched.len(), 2);
    assert_eq!(m.matched[0].path, "/");
    assert!(m.requires_auth());
    assert_eq!(m.redirect(), None);
}

#[test]
fn root_matches_parent_with_redirect() {
    let m = resolve(ROUTES, "/").unwrap();
    assert_eq!(m.matched.len(), 1);
    assert_eq!(m.redirect(), Some("/dashboard"));
}

#[test]
fn dynamic_segment_captures_param() {
    let m = resolve(ROUTES, "/assignment-submissions/42").unwrap();
    assert_eq!(m.name(), Some("AssignmentSubmissions"));
    assert_eq!(m.param("id"), Some("42"));
    assert_eq!(m.matched.last().unwrap().roles, Some(&[Role::Teacher][..]));
}

#[test]
fn unknown_paths_do_not_match() {
    assert!(resolve(ROUTES, "/nope").is_none());
    assert!(resolve(ROUTES, "/assignment-submissions").is_none());
    assert!(resolve(ROUTES, "/dashboard/extra").is_none());
}

#[test]
fn every_role_route_sits_under_an_authenticated_parent() {
    for child in ROUTES[1].children {
        let m = resolve(ROUTES, &format!("/{}", child.path.replace(":id", "1"))).unwrap();
        assert!(m.requires_auth(), "{} should require auth", child.path);
    }
}
