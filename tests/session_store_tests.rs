mod common;

use common::{jwt, record, user};
use conferio_client::{
    FileIdentityStorage, IdentityStorageState, MockIdentityStorage, SessionStore,
    models::Role,
    storage::IdentityStorage,
};
use std::sync::Arc;

fn store_with(storage: &Arc<MockIdentityStorage>) -> SessionStore {
    SessionStore::new(storage.clone() as IdentityStorageState)
}

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_signed_out() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);

        assert_eq!(store.initialize().await, None);
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[tokio::test]
    async fn test_restores_persisted_identity() {
        let token = jwt("alice", 3600);
        let storage = Arc::new(MockIdentityStorage::with_record(record(
            &token,
            "alice",
            Role::Coordinator,
        )));
        let store = store_with(&storage);

        let restored = store.initialize().await.expect("identity should be restored");
        assert_eq!(restored.username, "alice");
        assert_eq!(restored.role, Role::Coordinator);
        assert_eq!(store.token().as_deref(), Some(token.as_str()));
        // Restoring is a read: nothing is written back
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn test_opaque_token_is_restored() {
        let storage = Arc::new(MockIdentityStorage::with_record(record(
            "opaque-token",
            "bob",
            Role::User,
        )));
        let store = store_with(&storage);

        assert!(store.initialize().await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_record_fails_open() {
        let storage = Arc::new(MockIdentityStorage::with_record("{ not json"));
        let store = store_with(&storage);

        assert_eq!(store.initialize().await, None);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_record_without_user_is_ignored() {
        let storage = Arc::new(MockIdentityStorage::with_record(r#"{"token":"abc"}"#));
        let store = store_with(&storage);

        assert_eq!(store.initialize().await, None);
    }

    #[tokio::test]
    async fn test_expired_token_is_dropped() {
        let token = jwt("carol", -60);
        let storage = Arc::new(MockIdentityStorage::with_record(record(
            &token,
            "carol",
            Role::Admin,
        )));
        let store = store_with(&storage);

        assert_eq!(store.initialize().await, None);
        assert!(!store.is_authenticated());
        // Startup never writes, so the expired record stays until the next transition
        assert_eq!(storage.writes(), 0);
        assert!(storage.snapshot().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_storage_fails_open() {
        let storage = Arc::new(MockIdentityStorage::new_failing());
        let store = store_with(&storage);

        assert_eq!(store.initialize().await, None);
    }

    #[tokio::test]
    async fn test_set_identity_persists_one_record() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);

        store
            .set_identity("tok-1", user("dave", Role::User))
            .await
            .unwrap();

        let persisted: serde_json::Value =
            serde_json::from_str(&storage.snapshot().unwrap()).unwrap();
        assert_eq!(persisted["token"], "tok-1");
        assert_eq!(persisted["user"]["username"], "dave");
        assert_eq!(persisted["user"]["role"], "USER");
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test]
    async fn test_set_identity_replaces_previous() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);

        store.set_identity("tok-1", user("dave", Role::User)).await.unwrap();
        store.set_identity("tok-2", user("erin", Role::Admin)).await.unwrap();

        let current = store.current_identity().unwrap();
        assert_eq!(current.token, "tok-2");
        assert_eq!(current.username, "erin");
        assert_eq!(current.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_untouched() {
        let storage = Arc::new(MockIdentityStorage::new_failing());
        let store = store_with(&storage);

        let result = store.set_identity("tok", user("frank", Role::User)).await;
        assert!(result.is_err());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_clear_identity_clears_both_copies() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);
        store.set_identity("tok", user("gina", Role::User)).await.unwrap();

        store.clear_identity().await.unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), None);

        // A fresh store over the same storage stays signed out
        let reopened = store_with(&storage);
        assert_eq!(reopened.initialize().await, None);
    }

    #[tokio::test]
    async fn test_clear_when_signed_out_is_harmless() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);

        assert!(store.clear_identity().await.is_ok());
    }

    #[tokio::test]
    async fn test_reads_never_write() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);
        store.set_identity("tok", user("hank", Role::User)).await.unwrap();
        let writes = storage.writes();

        for _ in 0..10 {
            let _ = store.current_identity();
            let _ = store.token();
            let _ = store.is_authenticated();
        }

        assert_eq!(storage.writes(), writes);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);
        let mut feed = store.subscribe();
        assert!(feed.borrow_and_update().is_none());

        store.set_identity("tok", user("ivy", Role::User)).await.unwrap();
        feed.changed().await.unwrap();
        assert_eq!(
            feed.borrow_and_update().as_ref().map(|i| i.username.clone()),
            Some("ivy".into())
        );

        store.clear_identity().await.unwrap();
        feed.changed().await.unwrap();
        assert!(feed.borrow().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_the_identity() {
        let storage = Arc::new(MockIdentityStorage::new());
        let store = store_with(&storage);
        let other = store.clone();

        store.set_identity("tok", user("jo", Role::User)).await.unwrap();
        assert!(other.is_authenticated());
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[tokio::test]
    async fn test_file_roundtrip_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("identity.json");

        let first = SessionStore::new(Arc::new(FileIdentityStorage::new(&path)));
        first.initialize().await;
        first.set_identity("file-token", user("kim", Role::Admin)).await.unwrap();
        assert!(path.exists());

        // Simulates a process restart
        let second = SessionStore::new(Arc::new(FileIdentityStorage::new(&path)));
        let restored = second.initialize().await.unwrap();
        assert_eq!(restored.token, "file-token");
        assert_eq!(restored.role, Role::Admin);

        second.clear_identity().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        let storage = FileIdentityStorage::new(&path);

        storage.save("one").await.unwrap();
        storage.save("two").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("identity.json")]);
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("two"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        FileIdentityStorage::new(&path).save("secret").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_missing_or_blank_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        let storage = FileIdentityStorage::new(&path);
        assert_eq!(storage.load().await.unwrap(), None);

        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
        assert!(storage.remove().await.is_ok());
        assert!(storage.remove().await.is_ok());
    }
}
