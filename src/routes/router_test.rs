use super::*;
use crate::net::error::ApiError;
use crate::net::types::{Credentials, Envelope, LoginPayload};
use crate::state::session::AuthBackend;
use crate::util::storage::MemoryStore;

struct RoleAuth(&'static str);

#[async_trait::async_trait]
impl AuthBackend for RoleAuth {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError> {
        let reply = serde_json::json!({
            "code": 200,
            "data": { "token": "T", "user": { "id": 1, "username": "u", "role": self.0 } }
        });
        serde_json::from_value(reply).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn anonymous_router() -> (Arc<SessionStore>, Router) {
    let session = Arc::new(SessionStore::anonymous(Arc::new(MemoryStore::new())));
    let router = Router::new(session.clone());
    (session, router)
}

async fn router_as(role: &'static str) -> (Arc<SessionStore>, Router) {
    let (session, router) = anonymous_router();
    let creds = Credentials { username: "u".into(), password: "p".into() };
    session.login(&RoleAuth(role), &creds).await.unwrap();
    (session, router)
}

static LOOPING: &[RouteRecord] = &[
    RouteRecord { path: "/a", name: None, requires_auth: false, roles: None, redirect: Some("/b"), children: &[] },
    RouteRecord { path: "/b", name: None, requires_auth: false, roles: None, redirect: Some("/a"), children: &[] },
];

#[test]
fn anonymous_navigation_to_protected_route_lands_on_login() {
    let (_session, router) = anonymous_router();
    let nav = router.navigate("/assignments").unwrap();
    assert_eq!(nav.route.path, "/login");
    assert!(nav.redirected());
    assert_eq!(router.current_path().as_deref(), Some("/login"));
}

#[test]
fn root_redirects_then_guard_applies() {
    let (_session, router) = anonymous_router();
    let nav = router.navigate("/").unwrap();
    assert_eq!(nav.requested, "/");
    assert_eq!(nav.route.path, "/login");
}

#[tokio::test]
async fn authenticated_login_visit_lands_on_dashboard() {
    let (_session, router) = router_as("TEACHER").await;
    let nav = router.navigate("/login").unwrap();
    assert_eq!(nav.route.path, "/dashboard");
    assert_eq!(nav.route.name(), Some("Dashboard"));
}

#[tokio::test]
async fn student_is_turned_away_from_teacher_route() {
    let (_session, router) = router_as("STUDENT").await;
    let nav = router.navigate("/assignment-submissions/7").unwrap();
    assert!(nav.redirected());
    assert_eq!(nav.route.path, "/dashboard");
}

#[tokio::test]
async fn teacher_enters_teacher_route() {
    let (_session, router) = router_as("TEACHER").await;
    let nav = router.navigate("/assignment-submissions/7?tab=ungraded").unwrap();
    assert!(!nav.redirected());
    assert_eq!(nav.route.param("id"), Some("7"));
    assert_eq!(router.current().and_then(|r| r.name()), Some("AssignmentSubmissions"));
}

#[tokio::test]
async fn redirect_to_login_after_logout() {
    let (session, router) = router_as("ADMIN").await;
    router.navigate("/courses").unwrap();

    session.logout();
    router.redirect_to_login();

    assert_eq!(router.current_path().as_deref(), Some("/login"));
}

#[test]
fn unknown_path_fails_and_keeps_current_route() {
    let (_session, router) = anonymous_router();
    router.navigate("/login").unwrap();

    let err = router.navigate("/does-not-exist").unwrap_err();

    assert_eq!(err, NavigationError::NotFound("/does-not-exist".into()));
    assert_eq!(router.current_path().as_deref(), Some("/login"));
}

#[test]
fn redirect_cycles_are_reported() {
    let session = Arc::new(SessionStore::anonymous(Arc::new(MemoryStore::new())));
    let router = Router::with_routes(LOOPING, session);
    let err = router.navigate("/a").unwrap_err();
    assert_eq!(err, NavigationError::RedirectLoop { path: "/a".into() });
    assert!(router.current().is_none());
}
