//! End-to-end tests: bridge against a fake PubSub edge
//!
//! These tests verify the LISTEN/PING sequence, event forwarding, and how
//! each control frame affects the reconnect-allowed flag.

mod common;

use common::{
    test_config, wait_until, FakePubSubEdge, RecordingRefresher, RecordingSink, AUTH_TOKEN,
    CHANNEL_ID,
};
use hypersockets::ConnectionState;
use serde_json::json;
use std::time::Duration;
use twitch_pubsub::PubSubBridge;

/// Macro for verbose test output
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

const WAIT: Duration = Duration::from_secs(5);

fn bits_topic() -> String {
    format!("channel-bits-events-v2.{}", CHANNEL_ID)
}

fn subs_topic() -> String {
    format!("channel-subscribe-events-v1.{}", CHANNEL_ID)
}

fn bits_message() -> serde_json::Value {
    json!({
        "data": {
            "user_name": "dallasnchains",
            "channel_name": "dallas",
            "user_id": "129454141",
            "bits_used": 10000,
            "total_bits_used": 25000
        },
        "version": "1.0",
        "message_type": "bits_event",
        "message_id": "8145728a4-35f0-4cf7-9dc0-f2ef24de1eb6"
    })
}

fn sub_message() -> serde_json::Value {
    json!({
        "user_name": "tww2",
        "display_name": "TWW2",
        "channel_name": "mr_woodchuck",
        "user_id": "13405587",
        "channel_id": "89614178",
        "time": "2015-12-19T16:39:57-08:00",
        "sub_plan": "1000",
        "sub_plan_name": "Channel Subscription (mr_woodchuck)",
        "cumulative_months": 9,
        "streak_months": 3,
        "context": "resub",
        "is_gift": false,
        "multi_month_duration": 6
    })
}

#[tokio::test]
async fn test_listen_then_ping_on_open() {
    let edge = FakePubSubEdge::start().await;
    let bridge = PubSubBridge::new(
        &test_config(&edge),
        RecordingSink::new(),
        RecordingRefresher::new(),
    )
    .unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| edge.received().len() >= 2, WAIT).await);
    let received = edge.received();
    verbose_println!("  Received: {:?}", received);

    assert_eq!(
        received[0],
        json!({
            "type": "LISTEN",
            "data": {
                "topics": [
                    format!("channel-bits-events-v2.{}", CHANNEL_ID),
                    format!("channel-bits-badge-unlocks.{}", CHANNEL_ID),
                    format!("channel-points-channel-v1.{}", CHANNEL_ID),
                    format!("channel-subscribe-events-v1.{}", CHANNEL_ID),
                ],
                "auth_token": AUTH_TOKEN
            }
        })
    );
    assert_eq!(received[1], json!({"type": "PING"}));

    handle.shutdown().unwrap();
    let result = tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_bits_and_subscriptions_are_uploaded() {
    let edge = FakePubSubEdge::start().await;
    let sink = RecordingSink::new();
    let bridge =
        PubSubBridge::new(&test_config(&edge), sink.clone(), RecordingRefresher::new()).unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| handle.is_open(), WAIT).await);
    edge.notify(&bits_topic(), &bits_message());
    edge.notify(&subs_topic(), &sub_message());

    assert!(wait_until(|| sink.posts().len() == 2, WAIT).await);
    let mut posts = sink.posts();
    posts.sort_by(|a, b| a.0.cmp(&b.0));
    verbose_println!("  Posts: {:?}", posts);

    assert_eq!(posts[0].0, "/rest/v1/Bits");
    assert_eq!(
        posts[0].1,
        json!({
            "user_name": "dallasnchains",
            "user_id": 129454141,
            "channel_name": "dallas",
            "bits_used": 10000,
            "total_bits_used": 25000
        })
    );

    assert_eq!(posts[1].0, "/rest/v1/Subs");
    assert_eq!(posts[1].1["user_id"], 13405587);
    assert_eq!(posts[1].1["multi_month_duration"], 6);
    assert_eq!(posts[1].1["is_gift"], false);
    assert!(posts[1].1.get("display_name").is_none());

    handle.shutdown().unwrap();
    let _ = tokio::time::timeout(WAIT, task).await;
}

#[tokio::test]
async fn test_bad_frames_leave_connection_open() {
    let edge = FakePubSubEdge::start().await;
    let sink = RecordingSink::new();
    let bridge =
        PubSubBridge::new(&test_config(&edge), sink.clone(), RecordingRefresher::new()).unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| handle.is_open(), WAIT).await);
    edge.push_raw("{not json");
    edge.notify(
        &format!("channel-points-channel-v1.{}", CHANNEL_ID),
        &json!({"type": "reward-redeemed"}),
    );
    edge.notify(&subs_topic(), &json!({"channel_name": "missing_everything"}));
    edge.push(json!({
        "type": "MESSAGE",
        "data": {"topic": subs_topic(), "message": "{truncated"}
    }));
    edge.notify(&subs_topic(), &sub_message());

    // Only the last, valid notification is forwarded
    assert!(wait_until(|| sink.posts().len() == 1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.posts().len(), 1);
    assert_eq!(handle.connection_state(), ConnectionState::Open);
    assert!(handle.reconnect_allowed());
    assert_eq!(edge.connection_count(), 1);

    handle.shutdown().unwrap();
    let _ = tokio::time::timeout(WAIT, task).await;
}

#[tokio::test]
async fn test_bad_auth_disables_reconnect_and_requests_refresh() {
    for code in ["bad authorization", "ERR_BADAUTH"] {
        verbose_println!("  LISTEN error: {}", code);
        let edge = FakePubSubEdge::start_with_listen_errors(vec![code]).await;
        let refresher = RecordingRefresher::new();
        let bridge =
            PubSubBridge::new(&test_config(&edge), RecordingSink::new(), refresher.clone())
                .unwrap();
        let handle = bridge.handle();

        // Ends by itself once the RESPONSE arrives
        let result = tokio::time::timeout(WAIT, bridge.run()).await.unwrap();
        assert!(result.is_ok());

        assert_eq!(refresher.calls(), vec![AUTH_TOKEN.to_string()]);
        assert!(!handle.reconnect_allowed());
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(edge.connection_count(), 1);
    }
}

#[tokio::test]
async fn test_listen_error_other_than_bad_auth_is_tolerated() {
    let edge = FakePubSubEdge::start_with_listen_errors(vec!["ERR_BADTOPIC"]).await;
    let refresher = RecordingRefresher::new();
    let bridge =
        PubSubBridge::new(&test_config(&edge), RecordingSink::new(), refresher.clone()).unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| edge.received_of_type("PING").len() == 1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.is_open());
    assert!(refresher.calls().is_empty());

    handle.shutdown().unwrap();
    let _ = tokio::time::timeout(WAIT, task).await;
}

#[tokio::test]
async fn test_reconnect_frame_cycles_connection() {
    let edge = FakePubSubEdge::start().await;
    let bridge = PubSubBridge::new(
        &test_config(&edge),
        RecordingSink::new(),
        RecordingRefresher::new(),
    )
    .unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| handle.is_open(), WAIT).await);
    edge.push(json!({"type": "RECONNECT"}));

    assert!(wait_until(|| edge.received_of_type("LISTEN").len() == 2, WAIT).await);
    assert_eq!(edge.connection_count(), 2);
    assert!(handle.reconnect_allowed());
    assert_eq!(handle.metrics().reconnect_count, 1);

    handle.shutdown().unwrap();
    let _ = tokio::time::timeout(WAIT, task).await;
}

#[tokio::test]
async fn test_fatal_frames_end_the_bridge() {
    for frame in [json!({"type": "FOO"}), json!({"type": "AUTH_REVOKED"})] {
        verbose_println!("  Fatal frame: {}", frame);
        let edge = FakePubSubEdge::start().await;
        let refresher = RecordingRefresher::new();
        let bridge =
            PubSubBridge::new(&test_config(&edge), RecordingSink::new(), refresher.clone())
                .unwrap();
        let handle = bridge.handle();
        let task = tokio::spawn(bridge.run());

        assert!(wait_until(|| handle.is_open(), WAIT).await);
        edge.push(frame);

        let result = tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
        assert!(result.is_ok());
        assert!(!handle.reconnect_allowed());
        assert!(refresher.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(edge.connection_count(), 1);
    }
}

#[tokio::test]
async fn test_run_waits_for_pending_uploads() {
    let edge = FakePubSubEdge::start().await;
    let sink = RecordingSink::failing_first(2);
    let bridge =
        PubSubBridge::new(&test_config(&edge), sink.clone(), RecordingRefresher::new()).unwrap();
    let handle = bridge.handle();
    let task = tokio::spawn(bridge.run());

    assert!(wait_until(|| handle.is_open(), WAIT).await);
    // The upload is spawned before the fatal frame is handled
    edge.notify(&bits_topic(), &bits_message());
    edge.push(json!({"type": "FOO"}));

    let result = tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(sink.posts().len(), 3, "two failures then a delivery");
}
