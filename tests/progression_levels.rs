/// Tests for passive message XP: cooldown windows, level-curve boundaries,
/// and the level ratchet.
use chrono::Duration;

use autoecon::econ::{level_for_experience, Response};

mod common;
use common::{harness, invocation};

#[tokio::test]
async fn first_message_creates_profile_with_xp() {
    let h = harness(1);
    let inv = invocation("42", "Alice", "hello there");
    assert!(h.dispatcher.handle_message(&inv).await.is_none());

    let profile = h.store.get_profile("42").expect("profile");
    assert_eq!(profile.experience, 20);
    assert_eq!(profile.level, 1);
    assert_eq!(profile.coins, 0);
    assert_eq!(profile.tag(), "Alice#0001");
}

#[tokio::test]
async fn messages_inside_cooldown_earn_nothing() {
    let h = harness(1);
    let inv = invocation("42", "Alice", "hello");
    h.dispatcher.handle_message(&inv).await;

    h.clock.advance(Duration::seconds(30));
    h.dispatcher.handle_message(&inv).await;
    assert_eq!(h.store.get_profile("42").expect("profile").experience, 20);

    h.clock.advance(Duration::seconds(31));
    h.dispatcher.handle_message(&inv).await;
    assert_eq!(h.store.get_profile("42").expect("profile").experience, 40);
}

#[tokio::test]
async fn level_up_notice_fires_once_at_the_boundary() {
    let h = harness(1);
    let inv = invocation("42", "Alice", "chatting");

    // 20 XP per grant; level 2 needs 400 XP, so the 20th grant crosses it.
    let mut notices = Vec::new();
    for _ in 0..25 {
        if let Some(notice) = h.dispatcher.handle_message(&inv).await {
            notices.push(notice);
        }
        h.clock.advance(Duration::seconds(61));
    }
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("Alice"));
    assert!(notices[0].contains("level 2"));
}

#[tokio::test]
async fn xp_grant_completes_within_deadline_and_releases_lock() {
    let h = harness(1);
    let inv = invocation("42", "Alice", "hello");
    let granted = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        h.dispatcher.handle_message(&inv),
    )
    .await;
    assert!(granted.is_ok());

    // The participant's lock must be free again for the next command.
    let followup = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        h.dispatcher.handle(&invocation("42", "Alice", "bal")),
    )
    .await;
    assert_eq!(
        followup.expect("command blocked after xp grant"),
        Response::Text("You have 0 coins.".to_string())
    );
}

#[tokio::test]
async fn level_command_reflects_current_level() {
    let h = harness(1);
    let inv = invocation("42", "Alice", "hi");
    h.dispatcher.handle_message(&inv).await;

    let response = h.dispatcher.handle(&invocation("42", "Alice", "level")).await;
    assert_eq!(response, Response::Text("You are level 1.".to_string()));
}

#[test]
fn level_curve_boundaries() {
    assert_eq!(level_for_experience(0), 0);
    assert_eq!(level_for_experience(99), 0);
    assert_eq!(level_for_experience(100), 1);
    assert_eq!(level_for_experience(399), 1);
    assert_eq!(level_for_experience(400), 2);
    assert_eq!(level_for_experience(10_000), 10);
}
