//! Engine scenario tests
//!
//! Drives the full stack (session manager -> stores -> hub) over the
//! in-memory backend, covering ordering, cursors, presence, typing expiry,
//! and authentication outcomes.

use classchat_common::AppError;
use classchat_core::{ChannelId, DomainError, Message, OrderKey, Role};
use classchat_session::{LoginRequest, RegisterRequest};
use integration_tests::fixtures::{fast_reaper_config, fast_typing_config, unique_username};
use integration_tests::TestEngine;

fn channel(id: &str) -> ChannelId {
    ChannelId::from(id)
}

/// Collect `n` non-system messages from a subscription, driving it as a
/// `Stream`
async fn collect_chat(
    sub: &mut classchat_engine::Subscription<Message>,
    n: usize,
) -> Vec<Message> {
    use futures_util::StreamExt;

    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let msg = tokio::time::timeout(std::time::Duration::from_secs(5), sub.next())
            .await
            .expect("timed out waiting for message")
            .expect("subscription ended early");
        if !msg.is_system() {
            out.push(msg);
        }
    }
    out
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_two_appends_arrive_in_order() {
    let engine = TestEngine::start().await;
    let u1 = engine.join_student("Uma").await;
    let u2 = engine.join_student("Ursula").await;
    let science = channel("science");

    u1.send_message(&science, "hello").await.unwrap();
    u2.send_message(&science, "hi").await.unwrap();

    let mut sub = u1.subscribe_channel(&science, OrderKey::ZERO).await.unwrap();
    let messages = collect_chat(&mut sub, 2).await;

    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].sender_name, "Uma");
    assert_eq!(messages[1].content, "hi");
    assert_eq!(messages[1].sender_name, "Ursula");
}

#[tokio::test]
async fn test_every_subscriber_observes_the_same_total_order() {
    let engine = TestEngine::start().await;
    let observer_a = engine.join_student("ObsA").await;
    let observer_b = engine.join_student("ObsB").await;
    let physics = channel("physics");

    let mut sub_a = observer_a
        .subscribe_channel(&physics, OrderKey::ZERO)
        .await
        .unwrap();
    let mut sub_b = observer_b
        .subscribe_channel(&physics, OrderKey::ZERO)
        .await
        .unwrap();

    // Four senders appending concurrently
    let mut writers = Vec::new();
    for w in 0..4 {
        let session = engine.join_student(&format!("Writer{w}")).await;
        let physics = physics.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..20 {
                session
                    .send_message(&physics, &format!("w{w}-{i}"))
                    .await
                    .unwrap();
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    let seen_a = collect_chat(&mut sub_a, 80).await;
    let seen_b = collect_chat(&mut sub_b, 80).await;

    // Identical order for every subscriber, strictly increasing keys
    let keys_a: Vec<OrderKey> = seen_a.iter().map(|m| m.id).collect();
    let keys_b: Vec<OrderKey> = seen_b.iter().map(|m| m.id).collect();
    assert_eq!(keys_a, keys_b);
    for pair in keys_a.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[tokio::test]
async fn test_cursor_resume_never_skips_or_redelivers() {
    let engine = TestEngine::start().await;
    let reader = engine.join_student("Reader").await;
    let writer = engine.join_student("Writer").await;
    let biology = channel("biology");

    for i in 0..10 {
        writer.send_message(&biology, &format!("m{i}")).await.unwrap();
    }

    let mut first = reader
        .subscribe_channel(&biology, OrderKey::ZERO)
        .await
        .unwrap();
    let head = collect_chat(&mut first, 5).await;
    let cursor = head.last().unwrap().id;
    first.cancel();

    // Resume from the last delivered key; more traffic arrives meanwhile
    let mut resumed = reader.subscribe_channel(&biology, cursor).await.unwrap();
    for i in 10..13 {
        writer.send_message(&biology, &format!("m{i}")).await.unwrap();
    }

    let tail = collect_chat(&mut resumed, 8).await;
    let contents: Vec<&str> = tail.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["m5", "m6", "m7", "m8", "m9", "m10", "m11", "m12"]
    );
    for m in &tail {
        assert!(m.id > cursor, "cursor resume must not re-deliver");
    }
}

#[tokio::test]
async fn test_read_your_writes_on_own_subscription() {
    let engine = TestEngine::start().await;
    let session = engine.join_student("Selma").await;
    let math = channel("math");

    let mut sub = session.subscribe_channel(&math, OrderKey::ZERO).await.unwrap();
    let sent = session.send_message(&math, "my own message").await.unwrap();

    // Visible on the sender's subscription as soon as the send returns
    let mut found = None;
    while let Some(msg) = sub.try_recv() {
        if msg.id == sent.id {
            found = Some(msg);
            break;
        }
    }
    assert!(found.is_some());
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_join_then_leave_removes_from_online_set() {
    let engine = TestEngine::start().await;
    let session = engine.join_student("Flora").await;
    let identity = session.identity().await.unwrap();

    assert!(engine.ctx.presence().is_online(&identity.session_id));

    session.logout().await.unwrap();
    assert!(!engine.ctx.presence().is_online(&identity.session_id));
    assert_eq!(engine.ctx.presence().online_count(), 0);
}

#[tokio::test]
async fn test_presence_updates_flow_to_watchers() {
    let engine = TestEngine::start().await;
    let watcher = engine.join_student("Watcher").await;

    let mut sub = watcher.subscribe_presence().await.unwrap();
    let snapshot = sub.recv().await.unwrap();
    assert_eq!(snapshot.online_count(), 1);

    let newcomer = engine.join_student("Newcomer").await;
    let update = sub.recv().await.unwrap();
    assert_eq!(update.online_count(), 2);

    newcomer.logout().await.unwrap();
    let update = sub.recv().await.unwrap();
    assert_eq!(update.online_count(), 1);
}

#[tokio::test]
async fn test_silent_session_is_reaped_within_grace_period() {
    let engine = TestEngine::start_with_config(fast_reaper_config()).await;
    let quiet = engine.join_student("Quiet").await;
    let identity = quiet.identity().await.unwrap();

    assert!(engine.ctx.presence().is_online(&identity.session_id));

    // No heartbeats: grace (1s) plus one reaper tick (1s) must remove it
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert!(!engine.ctx.presence().is_online(&identity.session_id));
}

#[tokio::test]
async fn test_heartbeats_keep_a_session_alive() {
    let engine = TestEngine::start_with_config(fast_reaper_config()).await;
    let live = engine.join_student("Live").await;
    let identity = live.identity().await.unwrap();

    for _ in 0..5 {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        live.heartbeat().await.unwrap();
    }
    assert!(engine.ctx.presence().is_online(&identity.session_id));
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_entry_gone_after_ttl() {
    let engine = TestEngine::start_with_config(fast_typing_config()).await;
    let typist = engine.join_student("Typist").await;
    let observer = engine.join_student("Observer").await;
    let english = channel("english");

    typist.set_typing(&english).await.unwrap();
    assert_eq!(
        observer.active_typers(&english).await.unwrap(),
        vec!["Typist"]
    );

    // TTL is 1s; at TTL + epsilon the entry must be gone
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    assert!(observer.active_typers(&english).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_typing_updates_flow_to_watchers() {
    let engine = TestEngine::start().await;
    let typist = engine.join_student("Typist").await;
    let observer = engine.join_student("Observer").await;
    let chemistry = channel("chemistry");

    let mut sub = observer.subscribe_typing(&chemistry).await.unwrap();
    assert!(sub.recv().await.unwrap().is_empty());

    typist.set_typing(&chemistry).await.unwrap();
    let update = sub.recv().await.unwrap();
    assert_eq!(update.typers, vec!["Typist".to_string()]);

    typist.clear_typing().await.unwrap();
    assert!(sub.recv().await.unwrap().is_empty());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_wrong_password_never_logs_in() {
    let engine = TestEngine::start().await;
    let username = unique_username("carol");

    let registrar = engine.session();
    registrar
        .register(RegisterRequest::new(&username, "abc123", "Carol", Role::Student))
        .await
        .unwrap();

    let intruder = engine.session();
    for attempt in ["abc124", "ABC123", ""] {
        let result = intruder.login(&username, attempt).await;
        assert!(result.is_err(), "password {attempt:?} must not log in");
        assert!(intruder.identity().await.is_none());
    }
}

#[tokio::test]
async fn test_duplicate_registration_fails_with_username_taken() {
    let engine = TestEngine::start().await;
    let username = unique_username("bob");

    engine
        .session()
        .register(RegisterRequest::new(&username, "abc123", "Bob", Role::Student))
        .await
        .unwrap();

    let result = engine
        .session()
        .register(RegisterRequest::new(&username, "other9", "Bobby", Role::Teacher))
        .await;
    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::UsernameTaken(_)))
    ));
}

#[tokio::test]
async fn test_anonymous_sessions_are_rejected() {
    let engine = TestEngine::start().await;
    let anonymous = engine.session();

    let result = anonymous.send_message(&channel("general"), "hi").await;
    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::NotAuthenticated))
    ));
}

// ============================================================================
// Degraded transport
// ============================================================================

#[tokio::test]
async fn test_backend_outage_fails_sends_loudly() {
    let engine = TestEngine::start().await;
    let session = engine.join_student("Dana").await;
    let general = channel("general");

    engine.backend.set_online(false);
    assert!(!session.connection_ok().await);

    // Message sends surface the outage synchronously
    let result = session.send_message(&general, "anyone there?").await;
    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::TransportUnavailable(_)))
    ));

    // Ephemeral state stays usable; typing never aborts
    session.set_typing(&general).await.unwrap();

    engine.backend.set_online(true);
    assert!(session.connection_ok().await);
    session.send_message(&general, "back again").await.unwrap();
}

#[tokio::test]
async fn test_subscription_cancel_leaves_other_subscribers_running() {
    let engine = TestEngine::start().await;
    let a = engine.join_student("Anna").await;
    let b = engine.join_student("Ben").await;
    let math = channel("math");

    let sub_a = a.subscribe_channel(&math, OrderKey::ZERO).await.unwrap();
    let mut sub_b = b.subscribe_channel(&math, OrderKey::ZERO).await.unwrap();

    sub_a.cancel();

    a.send_message(&math, "still flowing").await.unwrap();
    let received = collect_chat(&mut sub_b, 1).await;
    assert_eq!(received[0].content, "still flowing");
}

// ============================================================================
// Counts
// ============================================================================

#[tokio::test]
async fn test_message_counts_per_channel() {
    let engine = TestEngine::start().await;
    let session = engine.join_student("Counter").await;

    session.send_message(&channel("math"), "one").await.unwrap();
    session.send_message(&channel("math"), "two").await.unwrap();

    let store = engine.ctx.store();
    assert_eq!(store.message_count(&channel("math")).await.unwrap(), 2);
    assert_eq!(store.message_count(&channel("physics")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_shared_engine_multiple_sessions() {
    let engine = TestEngine::start().await;
    let teacher = engine.join_teacher("Ms. Kim").await;
    let student = engine.join_student("Joon").await;

    assert_eq!(engine.ctx.presence().online_count(), 2);

    let general = channel("general");
    let mut sub = student
        .subscribe_channel(&general, OrderKey::ZERO)
        .await
        .unwrap();

    teacher
        .send_announcement(&general, "Quiz on Friday")
        .await
        .unwrap();

    let messages = collect_chat(&mut sub, 1).await;
    assert_eq!(messages[0].content, "Quiz on Friday");
    assert_eq!(messages[0].role, Role::Teacher);
}

#[tokio::test]
async fn test_login_after_logout_round_trip() {
    let engine = TestEngine::start().await;
    let username = unique_username("dora");

    let session = engine.session();
    session
        .register(RegisterRequest::new(&username, "abc123", "Dora", Role::Student))
        .await
        .unwrap();
    session.logout().await.unwrap();

    let request = LoginRequest::new(&username, "abc123");
    // LoginRequest field validation happens inside login(); drive it via the
    // facade to mirror the UI flow
    let identity = session
        .login(&request.username, &request.password)
        .await
        .unwrap();
    assert_eq!(identity.display_name, "Dora");
}
