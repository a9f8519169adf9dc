use std::time::Duration;

use super::*;
use crate::config::{Settings, MISSING_BACKEND_MESSAGE};
use crate::middleware::guards::{protected_guard, GuardOutcome};
use crate::testing::{session_for, user, Harness, Recovery, PASSWORD};

#[tokio::test]
async fn stored_session_is_recovered_with_profile_and_gym() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.tables.add_gym(&owner, "Iron Pulse");
    h.auth.store_session(&owner);

    h.state.session.initialize();
    let state = h.settled().await;

    assert_eq!(state.error, None);
    assert_eq!(state.user.as_ref().map(|u| u.id), Some(owner.id));
    assert_eq!(state.role(), Some(&Role::GymOwner));
    assert_eq!(state.gym.as_ref().map(|g| g.name.as_str()), Some("Iron Pulse"));
    assert!(state.session.is_some());
    assert!(h.state.session.has_valid_role());
}

#[tokio::test]
async fn no_stored_session_settles_signed_out() {
    let h = Harness::new();
    h.state.session.initialize();
    let state = h.settled().await;

    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.user, None);
    assert_eq!(state.profile, None);
}

#[tokio::test]
async fn missing_profile_is_not_an_error() {
    let h = Harness::new();
    let newcomer = user("new@example.com");
    h.auth.store_session(&newcomer);

    h.state.session.initialize();
    let state = h.settled().await;

    assert!(state.user.is_some());
    assert_eq!(state.profile, None);
    assert_eq!(state.gym, None);
    assert_eq!(state.lookup_error, None);
    assert!(!state.has_valid_role());
}

#[tokio::test]
async fn gym_is_only_fetched_for_valid_roles() {
    let h = Harness::new();
    let member = user("member@example.com");
    h.tables.add_profile(&member, "member");
    h.tables.add_gym(&member, "Not Theirs");
    h.auth.store_session(&member);

    h.state.session.initialize();
    let state = h.settled().await;

    assert_eq!(state.role(), Some(&Role::Member));
    assert_eq!(state.gym, None);
}

#[tokio::test]
async fn failed_profile_fetch_degrades_to_absent_and_is_recorded() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.tables.fail_selects(true);
    h.auth.store_session(&owner);

    h.state.session.initialize();
    let state = h.settled().await;

    assert!(!state.loading);
    assert_eq!(state.profile, None);
    assert!(state.lookup_error.is_some());
    assert_eq!(state.error, None);
}

#[tokio::test(start_paused = true)]
async fn initialization_timeout_is_a_terminal_configuration_error() {
    let h = Harness::new();
    h.auth.set_recovery(Recovery::Hang);

    h.state.session.initialize();
    let state = h.settled().await;

    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(TIMEOUT_MESSAGE));
    assert_eq!(state.user, None);
}

#[tokio::test(start_paused = true)]
async fn recovery_finishing_after_the_timeout_is_discarded() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.auth.store_session(&owner);
    h.auth.set_recovery(Recovery::Delayed(Duration::from_secs(15)));

    h.state.session.initialize();
    let state = h.settled().await;
    assert_eq!(state.error.as_deref(), Some(TIMEOUT_MESSAGE));

    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = h.state.session.snapshot();
    assert_eq!(state.error.as_deref(), Some(TIMEOUT_MESSAGE));
    assert_eq!(state.user, None);
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn slow_recovery_does_not_replace_a_newer_sign_in() {
    let h = Harness::new();
    let old_owner = user("old-owner@example.com");
    h.tables.add_profile(&old_owner, "gym_owner");
    h.auth.store_session(&old_owner);
    h.auth.set_recovery(Recovery::Stale(Duration::from_secs(2)));

    let admin = user("admin@example.com");
    h.auth.add_account(&admin);
    h.tables.add_profile(&admin, "admin");

    h.state.session.initialize();
    tokio::time::sleep(Duration::from_millis(500)).await;
    h.state
        .session
        .sign_in("admin@example.com", PASSWORD)
        .await
        .expect("valid credentials");
    let state = h
        .state
        .session
        .wait_for_identity(admin.id, Duration::from_secs(1))
        .await
        .expect("identity settles");
    assert_eq!(state.role(), Some(&Role::Admin));

    // A recuperação devolve a sessão antiga aos 2s
    tokio::time::sleep(Duration::from_secs(3)).await;
    let state = h.state.session.snapshot();
    assert_eq!(state.user.as_ref().map(|u| u.id), Some(admin.id));
    assert_eq!(state.role(), Some(&Role::Admin));
    assert_eq!(state.error, None);

    // Nem o timeout publica depois disso
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.state.session.snapshot().error, None);
}

#[tokio::test(start_paused = true)]
async fn auth_events_after_the_timeout_are_ignored() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.auth.set_recovery(Recovery::Hang);

    h.state.session.initialize();
    h.settled().await;

    h.auth.emit(AuthEvent::SignedIn(session_for(&owner)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = h.state.session.snapshot();
    assert_eq!(state.user, None);
    assert!(state.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn event_before_the_timeout_cancels_it() {
    let h = Harness::new();
    let admin = user("admin@example.com");
    h.tables.add_profile(&admin, "admin");
    h.auth.set_recovery(Recovery::Hang);

    h.state.session.initialize();
    tokio::task::yield_now().await;
    h.auth.emit(AuthEvent::SignedIn(session_for(&admin)));
    let settled = h
        .state
        .session
        .wait_for_identity(admin.id, Duration::from_secs(5))
        .await
        .expect("sign-in event settles the context");
    assert_eq!(settled.role(), Some(&Role::Admin));

    tokio::time::sleep(Duration::from_secs(20)).await;
    let state = h.state.session.snapshot();
    assert_eq!(state.error, None);
    assert!(state.user.is_some());
}

#[tokio::test]
async fn recovery_failure_surfaces_as_error() {
    let h = Harness::new();
    h.auth.set_recovery(Recovery::Fail("network unreachable".into()));

    h.state.session.initialize();
    let state = h.settled().await;

    let error = state.error.expect("recovery failure is reported");
    assert!(error.starts_with("Failed to initialize authentication"), "{error}");
}

#[tokio::test]
async fn missing_backend_configuration_fails_fast() {
    let h = Harness::with_settings(Settings::from_lookup(|_| None));
    h.state.session.initialize();

    let state = h.state.session.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(MISSING_BACKEND_MESSAGE));
}

#[tokio::test]
async fn sign_in_populates_identity_through_the_subscription() {
    let h = Harness::new();
    let admin = user("admin@example.com");
    h.auth.add_account(&admin);
    h.tables.add_profile(&admin, "admin");

    h.state.session.initialize();
    h.settled().await;

    let signed_in = h
        .state
        .session
        .sign_in("admin@example.com", PASSWORD)
        .await
        .expect("valid credentials");
    assert_eq!(signed_in.id, admin.id);

    let state = h
        .state
        .session
        .wait_for_identity(admin.id, Duration::from_secs(5))
        .await
        .expect("identity settles");
    assert_eq!(state.role(), Some(&Role::Admin));
    assert!(!state.loading);
}

#[tokio::test]
async fn wrong_password_is_rejected_without_touching_state() {
    let h = Harness::new();
    let admin = user("admin@example.com");
    h.auth.add_account(&admin);

    h.state.session.initialize();
    let before = h.settled().await;

    let result = h.state.session.sign_in("admin@example.com", "nope").await;
    assert!(matches!(result, Err(AppError::InvalidCredentials(_))));
    assert_eq!(h.state.session.snapshot(), before);
}

#[tokio::test]
async fn sign_out_clears_every_identity_field_at_once() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.tables.add_gym(&owner, "Iron Pulse");
    h.auth.store_session(&owner);

    h.state.session.initialize();
    h.settled().await;

    let mut rx = h.state.session.watch();
    rx.borrow_and_update();
    h.state.session.sign_out().await;

    // Primeira mudança observada já vem completamente limpa
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.session, None);
    assert_eq!(state.user, None);
    assert_eq!(state.profile, None);
    assert_eq!(state.gym, None);
    assert!(!state.loading);
    assert_eq!(protected_guard(&state), GuardOutcome::RedirectSignIn);
    assert_eq!(h.auth.sign_out_calls(), 1);
}

#[tokio::test]
async fn token_refresh_for_the_same_user_keeps_the_page_rendered() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.tables.add_gym(&owner, "Iron Pulse");
    h.auth.store_session(&owner);

    h.state.session.initialize();
    h.settled().await;

    let mut rx = h.state.session.watch();
    rx.borrow_and_update();
    h.auth.emit(AuthEvent::TokenRefreshed(session_for(&owner)));

    rx.changed().await.expect("context alive");
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.profile.is_some());
    assert!(state.gym.is_some());
}

#[tokio::test]
async fn refresh_gym_picks_up_a_new_gym() {
    let h = Harness::new();
    let owner = user("owner@ironpulse.fit");
    h.tables.add_profile(&owner, "gym_owner");
    h.auth.store_session(&owner);

    h.state.session.initialize();
    assert_eq!(h.settled().await.gym, None);

    h.tables.add_gym(&owner, "Iron Pulse");
    h.state.session.refresh_gym().await;

    assert!(h.state.session.snapshot().gym.is_some());
}

#[tokio::test]
async fn fetch_profile_without_a_session_returns_nothing() {
    let h = Harness::new();
    let lookup = h.state.session.fetch_profile(Uuid::new_v4()).await;
    assert_eq!(lookup, IdentityLookup::default());
    assert_eq!(h.state.session.fetch_gym(Uuid::new_v4()).await, None);
}

#[tokio::test]
async fn disposed_context_ignores_late_events() {
    let h = Harness::new();
    let admin = user("admin@example.com");
    h.tables.add_profile(&admin, "admin");

    h.state.session.initialize();
    h.settled().await;
    h.state.session.dispose();

    h.auth.emit(AuthEvent::SignedIn(session_for(&admin)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.state.session.snapshot().user, None);
}
