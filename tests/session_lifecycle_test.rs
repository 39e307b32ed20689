use std::sync::Arc;
use std::time::Duration;
use tidemark::testing::{FlakyStore, TestSession, sample_record};
use tidemark::{
    InMemorySessionStore, SessionConfig, SessionManager, SessionPatch, SessionStore,
};

fn config(max_sessions: usize) -> SessionConfig {
    SessionConfig {
        max_sessions,
        ..Default::default()
    }
}

fn manager(max_sessions: usize) -> SessionManager<InMemorySessionStore> {
    SessionManager::new(InMemorySessionStore::new(), &config(max_sessions)).unwrap()
}

async fn session_ids(manager: &SessionManager<InMemorySessionStore>, principal: &str) -> Vec<String> {
    manager
        .get_user_sessions(principal)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.session_id)
        .collect()
}

#[tokio::test]
async fn test_two_session_limit_walkthrough() {
    let manager = manager(2);

    let s1 = manager.create_session(sample_record("u1")).await.unwrap().session_id;
    let s2 = manager.create_session(sample_record("u1")).await.unwrap().session_id;
    let created = manager.create_session(sample_record("u1")).await.unwrap();
    let s3 = created.session_id;

    assert_eq!(created.evicted, vec![s1.clone()]);
    assert!(manager.validate_session(&s1).await.is_none());
    assert_eq!(session_ids(&manager, "u1").await, vec![s2.clone(), s3.clone()]);

    assert!(manager.revoke_session(&s2).await);
    assert_eq!(session_ids(&manager, "u1").await, vec![s3.clone()]);

    let s4 = manager.create_session(sample_record("u1")).await.unwrap();
    assert!(s4.evicted.is_empty());
    assert_eq!(session_ids(&manager, "u1").await, vec![s3, s4.session_id]);
}

#[tokio::test]
async fn test_keeps_most_recent_sessions() {
    let max = 3;
    let manager = manager(max);

    let mut created = Vec::new();
    for _ in 0..8 {
        created.push(manager.create_session(sample_record("u1")).await.unwrap().session_id);
    }

    let expected: Vec<String> = created[created.len() - max..].to_vec();
    assert_eq!(session_ids(&manager, "u1").await, expected);

    for (i, session_id) in created.iter().enumerate() {
        let valid = manager.validate_session(session_id).await.is_some();
        assert_eq!(valid, i >= created.len() - max, "session {}", i);
    }
}

#[tokio::test]
async fn test_concurrent_creates_respect_limit() {
    let max = 5;
    let manager = manager(max);

    let handles: Vec<_> = (0..max + 5)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.create_session(sample_record("u1")).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let created: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().session_id)
        .collect();

    let mut valid = Vec::new();
    for session_id in &created {
        if manager.validate_session(session_id).await.is_some() {
            valid.push(session_id.clone());
        }
    }
    assert_eq!(valid.len(), max);

    // Every valid session is indexed
    let indexed = session_ids(&manager, "u1").await;
    for session_id in &valid {
        assert!(indexed.contains(session_id));
    }
}

#[tokio::test]
async fn test_validate_is_idempotent() {
    let manager = manager(5);
    let record = TestSession::builder().with_principal("u1").build();
    let created = manager.create_session(record.clone()).await.unwrap();

    let first = manager.validate_session(&created.session_id).await.unwrap();
    let second = manager.validate_session(&created.session_id).await.unwrap();

    assert_eq!(first, record);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_sessions_vanish() {
    let manager = manager(5).with_ttl(Duration::from_millis(50));
    let created = manager.create_session(sample_record("u1")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(manager.validate_session(&created.session_id).await.is_none());
    assert!(manager.get_user_sessions("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_revoked_session_is_not_resurrected_by_update() {
    let manager = manager(5);
    let created = manager.create_session(sample_record("u1")).await.unwrap();

    manager.revoke_session(&created.session_id).await;
    let updated = manager
        .update_session_user(&created.session_id, SessionPatch::new().username("late"))
        .await
        .unwrap();

    assert!(updated.is_none());
    assert!(manager.validate_session(&created.session_id).await.is_none());
}

#[tokio::test]
async fn test_rotation_then_sign_out_everywhere() {
    let manager = manager(5);
    let laptop = manager
        .create_session(TestSession::builder().with_principal("u1").with_connection().build())
        .await
        .unwrap();
    let phone = manager.create_session(sample_record("u1")).await.unwrap();

    let rotated = manager
        .regenerate_session(&laptop.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(manager.validate_session(&laptop.session_id).await.is_none());

    let sessions = manager.get_user_sessions("u1").await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, phone.session_id);
    assert_eq!(sessions[1].session_id, rotated.session_id);
    assert!(sessions[1].record.connection.is_some());

    assert_eq!(manager.revoke_all_sessions("u1").await.unwrap(), 2);
    assert!(manager.validate_session(&rotated.session_id).await.is_none());
    assert!(manager.validate_session(&phone.session_id).await.is_none());
}

#[tokio::test]
async fn test_outage_fails_closed_and_recovers() {
    let store = Arc::new(FlakyStore::new(InMemorySessionStore::new()));
    let manager = SessionManager::from_arc(Arc::clone(&store), &config(5)).unwrap();
    let created = manager.create_session(sample_record("u1")).await.unwrap();

    store.set_available(false);
    assert!(!manager.is_healthy().await);
    assert!(manager.validate_session(&created.session_id).await.is_none());
    assert!(manager.get_user_sessions("u1").await.unwrap_err().is_store_unavailable());
    assert!(manager.create_session(sample_record("u1")).await.is_err());
    assert!(!manager.revoke_session(&created.session_id).await);

    store.set_available(true);
    assert!(manager.is_healthy().await);
    assert!(manager.validate_session(&created.session_id).await.is_some());
    assert_eq!(manager.get_user_sessions("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_index_trimmed_after_eviction_cleanup() {
    let manager = manager(2);
    let s1 = manager.create_session(sample_record("u1")).await.unwrap();
    let s2 = manager.create_session(sample_record("u1")).await.unwrap();

    // Record gone, index entry left behind
    manager.invalidate_session(&s1.session_id).await;

    let index_key = manager.keys().principal_index("u1");
    assert_eq!(manager.store().list_members(&index_key).await.unwrap().len(), 2);

    assert_eq!(session_ids(&manager, "u1").await, vec![s2.session_id.clone()]);
    assert_eq!(
        manager.store().list_members(&index_key).await.unwrap(),
        vec![s2.session_id]
    );
}
