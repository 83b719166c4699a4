//! Dashboard Hub integration tests
//!
//! Exercise the hub actor through `HubHandle` only: filtered fanout, fault
//! isolation, and consistency of the session set under concurrent
//! connect/disconnect/publish.

use plate_sentinel::hub::{BroadcastEnvelope, DashboardHub, FanoutReport, HubHandle, PONG_FRAME};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn start_hub() -> (HubHandle, CancellationToken) {
    let (hub, handle) = DashboardHub::new(64);
    let token = CancellationToken::new();
    tokio::spawn(hub.run(token.clone()));
    (handle, token)
}

fn alert_for(vehicle_id: &str) -> BroadcastEnvelope {
    BroadcastEnvelope::new(
        "watchlist_alert",
        json!({ "plate": "ABC123", "vehicle_id": vehicle_id }),
    )
}

async fn subscribe(hub: &HubHandle, vehicle_id: &str) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let id = hub.connect(tx).await.unwrap();
    hub.inbound(id, json!({"type": "subscribe", "vehicle_id": vehicle_id}).to_string())
        .await
        .unwrap();
    rx
}

/// Scenario 5: filtered and unfiltered viewers.
#[tokio::test]
async fn filtered_and_unfiltered_viewers() {
    let (hub, _token) = start_hub();
    let mut filtered = subscribe(&hub, "car-42").await;
    let (tx, mut unfiltered) = mpsc::channel(16);
    hub.connect(tx).await.unwrap();

    let report = hub.publish(alert_for("car-42")).await.unwrap();
    assert_eq!(report, FanoutReport { delivered: 2, filtered: 0, dropped: 0 });
    assert!(filtered.try_recv().unwrap().contains("car-42"));
    assert!(unfiltered.try_recv().unwrap().contains("car-42"));

    let report = hub.publish(alert_for("car-7")).await.unwrap();
    assert_eq!(report, FanoutReport { delivered: 1, filtered: 1, dropped: 0 });
    assert!(filtered.try_recv().is_err());
    assert!(unfiltered.try_recv().unwrap().contains("car-7"));
}

#[tokio::test]
async fn untargeted_message_reaches_every_session() {
    let (hub, _token) = start_hub();
    let mut a = subscribe(&hub, "car-1").await;
    let mut b = subscribe(&hub, "car-2").await;

    let report = hub
        .publish(BroadcastEnvelope::new("system_notice", json!({"msg": "maintenance at 02:00"})))
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);

    for rx in [&mut a, &mut b] {
        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["type"], "system_notice");
        assert_eq!(frame["data"]["msg"], "maintenance at 02:00");
    }
}

#[tokio::test]
async fn fanout_matches_filters_exactly() {
    let (hub, _token) = start_hub();
    let filters = ["car-1", "car-2", "car-1", "car-3"];
    let mut viewers = Vec::new();
    for f in filters {
        viewers.push((f, subscribe(&hub, f).await));
    }

    let report = hub.publish(alert_for("car-1")).await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.filtered, 2);

    for (filter, rx) in &mut viewers {
        assert_eq!(rx.try_recv().is_ok(), *filter == "car-1", "filter {filter}");
    }
}

#[tokio::test]
async fn broken_viewer_does_not_block_others() {
    let (hub, _token) = start_hub();
    let mut healthy = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel(16);
        hub.connect(tx).await.unwrap();
        healthy.push(rx);
    }
    // Gone without disconnecting
    let (tx, rx) = mpsc::channel(16);
    hub.connect(tx).await.unwrap();
    drop(rx);
    // Stuck: queue already full
    let (tx, _stuck_rx) = mpsc::channel(1);
    hub.connect(tx).await.unwrap();
    hub.publish(alert_for("car-0")).await.unwrap();
    for rx in &mut healthy {
        rx.try_recv().unwrap();
    }

    let report = hub.publish(alert_for("car-0")).await.unwrap();
    assert_eq!(report.delivered, 3);
    assert_eq!(report.dropped, 1);
    for rx in &mut healthy {
        assert!(rx.try_recv().is_ok());
    }
    assert_eq!(hub.session_count().await.unwrap(), 3);
}

#[tokio::test]
async fn ping_and_garbage_from_same_viewer() {
    let (hub, _token) = start_hub();
    let (tx, mut rx) = mpsc::channel(16);
    let id = hub.connect(tx).await.unwrap();

    hub.inbound(id, "garbage".to_string()).await.unwrap();
    hub.inbound(id, r#"{"type":"ping"}"#.to_string()).await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), PONG_FRAME);
    assert_eq!(hub.session_count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connect_disconnect_publish_stays_consistent() {
    let (hub, _token) = start_hub();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let hub = hub.clone();
        tasks.push(tokio::spawn(async move {
            let (tx, rx) = mpsc::channel(64);
            let id = hub.connect(tx).await.unwrap();
            hub.publish(alert_for(&format!("car-{i}"))).await.unwrap();
            if i % 2 == 0 {
                hub.disconnect(id).await.unwrap();
            }
            // Keep the receiver alive until our own work is done
            drop(rx);
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    // Odd sessions dropped their receivers without disconnecting. Whatever
    // concurrent publishes did not already prune goes now.
    let report = hub.publish(alert_for("car-x")).await.unwrap();
    assert_eq!(report.delivered, 0);
    assert!(report.dropped <= 10);
    assert_eq!(hub.session_count().await.unwrap(), 0);
}

#[tokio::test]
async fn vehicle_targets_follow_dashboard_rules() {
    let (hub, _token) = start_hub();
    let mut numeric = subscribe(&hub, "42").await;
    let mut named = subscribe(&hub, "car-1").await;

    // Numeric ids compare by their decimal form
    let report = hub
        .publish(BroadcastEnvelope::new("watchlist_alert", json!({"vehicle_id": 42})))
        .await
        .unwrap();
    assert_eq!(report, FanoutReport { delivered: 1, filtered: 1, dropped: 0 });
    assert!(numeric.try_recv().is_ok());
    assert!(named.try_recv().is_err());

    // An empty id targets nobody in particular
    let report = hub
        .publish(BroadcastEnvelope::new("watchlist_alert", json!({"vehicle_id": ""})))
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);
}
