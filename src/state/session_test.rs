use super::*;
use crate::util::storage::{FileStore, MemoryStore};
use serde_json::json;

struct FakeAuth {
    reply: serde_json::Value,
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError> {
        serde_json::from_value(self.reply.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

struct DownAuth;

#[async_trait]
impl AuthBackend for DownAuth {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError> {
        Err(ApiError::Network("connection refused".into()))
    }
}

struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn write_batch(&self, _batch: Vec<Write>) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }
}

fn creds() -> Credentials {
    Credentials { username: "lwang".into(), password: "secret".into() }
}

fn teacher_reply() -> FakeAuth {
    FakeAuth { reply: json!({ "code": 200, "data": { "token": "T", "user": { "role": "TEACHER" } } }) }
}

fn store() -> (Arc<MemoryStore>, SessionStore) {
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::anonymous(storage.clone());
    (storage, session)
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_sets_session_and_persists() {
    let (storage, session) = store();

    let user = session.login(&teacher_reply(), &creds()).await.unwrap();

    assert_eq!(user.role, Role::Teacher);
    assert!(session.is_authenticated());
    assert_eq!(session.role(), Some(Role::Teacher));
    assert_eq!(session.token().as_deref(), Some("T"));
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T"));
    let stored: User = load_json(storage.as_ref(), USER_KEY).unwrap().unwrap();
    assert_eq!(stored.role, Role::Teacher);
}

#[tokio::test]
async fn login_non_200_code_fails_and_leaves_session_unchanged() {
    let (storage, session) = store();
    let backend = FakeAuth { reply: json!({ "code": 500, "message": "bad password" }) };

    let err = session.login(&backend, &creds()).await.unwrap_err();

    assert!(matches!(err, SessionError::Rejected { code: 500, .. }));
    assert!(!session.is_authenticated());
    assert_eq!(session.role(), None);
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn failed_login_keeps_existing_session() {
    let (_storage, session) = store();
    session.login(&teacher_reply(), &creds()).await.unwrap();
    let before = session.snapshot();

    let backend = FakeAuth { reply: json!({ "code": 401, "message": "nope", "data": { "token": "X" } }) };
    assert!(session.login(&backend, &creds()).await.is_err());

    assert_eq!(session.snapshot(), before);
}

#[tokio::test]
async fn login_without_user_is_incomplete() {
    let (storage, session) = store();
    let backend = FakeAuth { reply: json!({ "code": 200, "data": { "token": "T" } }) };

    let err = session.login(&backend, &creds()).await.unwrap_err();

    assert!(matches!(err, SessionError::Incomplete));
    assert!(!session.is_authenticated());
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn login_with_empty_token_is_incomplete() {
    let (_storage, session) = store();
    let backend = FakeAuth { reply: json!({ "code": 200, "data": { "token": "", "user": { "role": "STUDENT" } } }) };

    assert!(matches!(session.login(&backend, &creds()).await, Err(SessionError::Incomplete)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn login_transport_error_propagates() {
    let (_storage, session) = store();
    let err = session.login(&DownAuth, &creds()).await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Network(_))));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn login_storage_failure_leaves_memory_unchanged() {
    let session = SessionStore::anonymous(Arc::new(ReadOnlyStore));
    let err = session.login(&teacher_reply(), &creds()).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert!(!session.is_authenticated());
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_twice_leaves_storage_clear_both_times() {
    let (storage, session) = store();
    session.login(&teacher_reply(), &creds()).await.unwrap();

    assert!(session.logout());
    assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());

    assert!(!session.logout());
    assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn concurrent_logout_clears_exactly_once() {
    let (_storage, session) = store();
    session.login(&teacher_reply(), &creds()).await.unwrap();
    let session = Arc::new(session);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            std::thread::spawn(move || session.logout())
        })
        .collect();
    let cleared = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|cleared| *cleared)
        .count();

    assert_eq!(cleared, 1);
    assert_eq!(session.epoch(), 2);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn epoch_counts_only_real_transitions() {
    let (_storage, session) = store();
    assert_eq!(session.epoch(), 0);

    session.logout();
    assert_eq!(session.epoch(), 0);

    session.login(&teacher_reply(), &creds()).await.unwrap();
    let _ = session.login(&DownAuth, &creds()).await;
    assert_eq!(session.epoch(), 1);
}

#[test]
fn logout_survives_storage_failure() {
    let session = SessionStore::anonymous(Arc::new(ReadOnlyStore));
    assert!(!session.logout());
}

// =============================================================================
// restore
// =============================================================================

#[test]
fn restore_reads_persisted_session() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(TOKEN_KEY, "T").unwrap();
    storage
        .set(USER_KEY, r#"{"id":3,"username":"amy","role":"STUDENT"}"#)
        .unwrap();

    let session = SessionStore::restore(storage);
    assert!(session.is_authenticated());
    assert_eq!(session.role(), Some(Role::Student));
    assert_eq!(session.user().map(|u| u.username), Some("amy".to_owned()));
}

#[test]
fn restore_empty_storage_is_anonymous() {
    let session = SessionStore::restore(Arc::new(MemoryStore::new()));
    assert_eq!(session.snapshot(), Session::Anonymous);
}

#[test]
fn restore_corrupt_user_falls_back_to_logged_out() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(TOKEN_KEY, "T").unwrap();
    storage.set(USER_KEY, "{broken").unwrap();

    let session = SessionStore::restore(storage.clone());

    assert!(!session.is_authenticated());
    assert_eq!(session.role(), None);
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn corrupt_session_file_does_not_block_next_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    let storage = Arc::new(FileStore::new(&path));

    let session = SessionStore::restore(storage.clone());
    assert!(!session.is_authenticated());

    session.login(&teacher_reply(), &creds()).await.unwrap();

    assert!(session.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T"));
    assert!(SessionStore::restore(storage).is_authenticated());
}

#[test]
fn restore_token_without_user_is_discarded() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(TOKEN_KEY, "T").unwrap();

    let session = SessionStore::restore(storage.clone());

    assert!(!session.is_authenticated());
    assert!(storage.get(TOKEN_KEY).unwrap().is_none());
}

#[test]
fn session_accessors_on_anonymous() {
    let session = Session::Anonymous;
    assert!(!session.is_authenticated());
    assert_eq!(session.token(), None);
    assert_eq!(session.user(), None);
    assert_eq!(session.role(), None);
}
