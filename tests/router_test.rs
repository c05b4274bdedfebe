use chrono::{TimeZone, Utc};
use push_delivery::notification::channel::{DEFAULT_CHANNEL, HIGH_IMPORTANCE_CHANNEL};
use push_delivery::{ChannelPolicy, ChannelRouter, DeliveryDispatcher, MessageNormalizer, RawPushPayload};
use std::time::{Duration, Instant};

fn router(capacity: usize) -> ChannelRouter {
    ChannelRouter::new(ChannelPolicy::default(), Duration::from_secs(30), capacity)
}

fn normalizer() -> MessageNormalizer {
    MessageNormalizer::new("Notification", "New notification")
}

fn message(id: &str) -> RawPushPayload {
    RawPushPayload::new()
        .with_message_id(id)
        .with_notification("Hi", "Hello")
}

#[test]
fn test_redelivery_five_seconds_later_is_suppressed() {
    let router = router(200);
    let normalizer = normalizer();
    let t0 = Instant::now();

    let intent = normalizer.normalize(&message("m1")).unwrap();
    assert!(router.route_at(intent.clone(), t0).is_some());
    assert!(router.route_at(intent, t0 + Duration::from_secs(5)).is_none());
}

#[test]
fn test_redelivery_after_window_is_accepted() {
    let router = router(200);
    let intent = normalizer().normalize(&message("m1")).unwrap();
    let t0 = Instant::now();

    assert!(router.route_at(intent.clone(), t0).is_some());
    assert!(router.route_at(intent, t0 + Duration::from_secs(31)).is_some());
}

#[test]
fn test_redispatch_after_window_reuses_notification_id() {
    let router = router(200);
    let dispatcher = DeliveryDispatcher::new();
    let intent = normalizer().normalize(&message("m1")).unwrap();
    let t0 = Instant::now();

    let (first, assignment) = router.route_at(intent.clone(), t0).unwrap();
    let first = dispatcher.dispatch(&first, &assignment);
    let (second, assignment) = router.route_at(intent, t0 + Duration::from_secs(60)).unwrap();
    let second = dispatcher.dispatch(&second, &assignment);

    assert_eq!(first.notification_id, second.notification_id);
}

#[test]
fn test_suppressed_repeat_does_not_extend_window() {
    let router = router(200);
    let intent = normalizer().normalize(&message("m1")).unwrap();
    let t0 = Instant::now();

    assert!(router.route_at(intent.clone(), t0).is_some());
    assert!(router.route_at(intent.clone(), t0 + Duration::from_secs(20)).is_none());
    // measured from the accepted delivery, not the suppressed one
    assert!(router.route_at(intent, t0 + Duration::from_secs(35)).is_some());
}

#[test]
fn test_capacity_evicts_least_recently_seen() {
    let router = router(2);
    let normalizer = normalizer();
    let t0 = Instant::now();

    let a = normalizer.normalize(&message("a")).unwrap();
    let b = normalizer.normalize(&message("b")).unwrap();
    let c = normalizer.normalize(&message("c")).unwrap();

    assert!(router.route_at(a.clone(), t0).is_some());
    assert!(router.route_at(b.clone(), t0 + Duration::from_secs(1)).is_some());
    assert!(router.route_at(c, t0 + Duration::from_secs(2)).is_some());
    assert_eq!(router.cached_len(), 2);

    // "a" was evicted, so it is no longer remembered
    assert!(router.route_at(a, t0 + Duration::from_secs(3)).is_some());
    // "b" was evicted by "a"; "c" is still cached
    assert!(router.route_at(b, t0 + Duration::from_secs(4)).is_some());
}

#[test]
fn test_channel_follows_priority() {
    let router = router(200);
    let normalizer = normalizer();

    let high = normalizer
        .normalize(&message("h").with_data("priority", " High "))
        .unwrap();
    let (_, assignment) = router.route(high).unwrap();
    assert_eq!(assignment.channel_id, HIGH_IMPORTANCE_CHANNEL);

    let normal = normalizer
        .normalize(&message("n").with_data("priority", "normal"))
        .unwrap();
    let (_, assignment) = router.route(normal).unwrap();
    assert_eq!(assignment.channel_id, DEFAULT_CHANNEL);
}

#[test]
fn test_same_content_in_same_bucket_is_one_intent() {
    let normalizer = normalizer().with_id_bucket_secs(10);
    let payload = RawPushPayload::new().with_data("title", "T").with_data("body", "B");

    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 8).unwrap();
    let next_bucket = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 11).unwrap();

    let first = normalizer.normalize_at(&payload, at).unwrap();
    let second = normalizer.normalize_at(&payload, later).unwrap();
    let third = normalizer.normalize_at(&payload, next_bucket).unwrap();

    assert_eq!(first.id, second.id);
    assert_ne!(first.id, third.id);
}
