use std::time::Duration;

use tokio_util::sync::CancellationToken;

use corelink_maintenance::{
    wait_for_height, FlagDecision, MaintenanceConfig, MaintenanceError, ShutdownController,
    ShutdownListener, TssListener,
};
use corelink_nullables::{fast_config, NullHarness};
use corelink_types::{Keygen, KeygenStatus, OperationalFlags, TssInfo};

fn harness() -> NullHarness {
    NullHarness::new(fast_config()).unwrap()
}

fn fast() -> MaintenanceConfig {
    MaintenanceConfig {
        poll_interval_ms: 5,
    }
}

fn flags(restart_height: i64, minimum_version: Option<&str>) -> OperationalFlags {
    OperationalFlags {
        restart_height,
        minimum_version: minimum_version.map(str::to_string),
    }
}

/// Keep producing blocks at `height` until the controller fires or 2s pass.
async fn drive_until_shutdown(h: &NullHarness, controller: &ShutdownController, height: i64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if controller.is_shutdown() {
            return true;
        }
        h.chain.emit_block(height);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    controller.is_shutdown()
}

async fn stays_up(controller: &ShutdownController) -> bool {
    tokio::time::timeout(Duration::from_millis(100), controller.cancelled())
        .await
        .is_err()
}

// ── wait_for_height ───────────────────────────────────────────────────

#[tokio::test]
async fn wait_for_height_returns_immediately_when_reached() {
    let h = harness();
    h.chain.set_height(50);
    let token = CancellationToken::new();
    wait_for_height(&h.client, &token, 40).await.unwrap();
}

#[tokio::test]
async fn wait_for_height_follows_new_blocks() {
    let h = harness();
    h.chain.set_height(10);
    let token = CancellationToken::new();
    let client = h.client.clone();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { wait_for_height(&client, &token, 12).await })
    };

    for height in 11..=13 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.chain.emit_block(height);
    }
    let res = tokio::time::timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
    assert!(res.is_ok());
}

#[tokio::test]
async fn wait_for_height_stops_on_cancel() {
    let h = harness();
    h.chain.set_height(1);
    let token = CancellationToken::new();
    let client = h.client.clone();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { wait_for_height(&client, &token, 1_000).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, MaintenanceError::Context(_)));
}

#[tokio::test]
async fn wait_for_height_reports_closed_stream() {
    let h = harness();
    h.chain.set_height(1);
    let token = CancellationToken::new();
    let client = h.client.clone();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { wait_for_height(&client, &token, 1_000).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.chain.close_block_subscriptions();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, MaintenanceError::StreamClosed(1_000)));
}

// ── ShutdownListener ──────────────────────────────────────────────────

#[test]
fn decide_covers_version_and_restart_heights() {
    let h = harness();
    let listener = ShutdownListener::new(h.client.clone(), fast(), "1.4.0").unwrap();

    assert!(matches!(
        listener.decide(&flags(0, Some("2.0.0")), 10, None),
        FlagDecision::Shutdown { .. }
    ));
    assert_eq!(listener.decide(&flags(0, Some("1.4.0")), 10, None), FlagDecision::Nothing);
    assert_eq!(listener.decide(&flags(0, Some("not-a-version")), 10, None), FlagDecision::Nothing);
    assert_eq!(listener.decide(&flags(20, None), 10, None), FlagDecision::ArmRestart(20));
    assert_eq!(listener.decide(&flags(20, None), 10, Some(20)), FlagDecision::Nothing);
    assert_eq!(listener.decide(&flags(25, None), 10, Some(20)), FlagDecision::ArmRestart(25));
    assert_eq!(listener.decide(&flags(5, None), 10, None), FlagDecision::Nothing);
    assert_eq!(listener.decide(&flags(0, None), 10, Some(20)), FlagDecision::Disarm);
    assert_eq!(listener.decide(&flags(20, None), 20, Some(20)), FlagDecision::RestartReached(20));
    assert_eq!(listener.decide(&flags(20, None), 35, Some(20)), FlagDecision::RestartReached(20));
    assert_eq!(listener.decide(&flags(15, None), 35, Some(20)), FlagDecision::Disarm);
}

#[test]
fn invalid_running_version_is_rejected() {
    let h = harness();
    let err = ShutdownListener::new(h.client.clone(), fast(), "v1").err().unwrap();
    assert!(matches!(err, MaintenanceError::Version { .. }));
}

#[tokio::test]
async fn minimum_version_above_running_triggers_shutdown() {
    let h = harness();
    h.chain.set_operational_flags(flags(0, Some("2.0.0")));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    tokio::time::timeout(Duration::from_secs(2), controller.cancelled())
        .await
        .unwrap();
}

#[tokio::test]
async fn satisfied_version_keeps_running() {
    let h = harness();
    h.chain.set_operational_flags(flags(0, Some("1.0.0")));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.2.3")
        .unwrap()
        .listen(&token, controller.clone());

    assert!(stays_up(&controller).await);
    token.cancel();
}

#[tokio::test]
async fn restart_height_shuts_down_once_reached() {
    let h = harness();
    h.chain.set_height(10);
    h.chain.set_operational_flags(flags(15, None));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    assert!(stays_up(&controller).await);
    assert!(drive_until_shutdown(&h, &controller, 15).await);
}

#[tokio::test]
async fn restart_survives_a_dropped_block_stream() {
    let h = harness();
    h.chain.set_height(10);
    h.chain.set_operational_flags(flags(100, None));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    assert!(stays_up(&controller).await);
    h.chain.close_block_subscriptions();
    assert!(stays_up(&controller).await);

    for height in 150..170 {
        h.chain.emit_block(height);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::timeout(Duration::from_secs(2), controller.cancelled())
        .await
        .unwrap();
}

#[tokio::test]
async fn restart_waiter_is_rearmed_after_its_stream_drops() {
    let h = harness();
    h.chain.set_height(10);
    h.chain.set_operational_flags(flags(100, None));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    assert!(stays_up(&controller).await);
    h.chain.close_block_subscriptions();
    assert!(stays_up(&controller).await);
    assert!(h.chain.subscriptions() >= 2);

    assert!(drive_until_shutdown(&h, &controller, 100).await);
}

#[tokio::test]
async fn past_restart_height_is_ignored() {
    let h = harness();
    h.chain.set_height(30);
    h.chain.set_operational_flags(flags(15, None));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    h.chain.emit_block(31);
    assert!(stays_up(&controller).await);
    token.cancel();
}

#[tokio::test]
async fn withdrawn_restart_height_is_disarmed() {
    let h = harness();
    h.chain.set_height(10);
    h.chain.set_operational_flags(flags(15, None));
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    tokio::time::sleep(Duration::from_millis(30)).await;
    h.chain.set_operational_flags(flags(0, None));
    tokio::time::sleep(Duration::from_millis(30)).await;
    h.chain.emit_block(15);
    assert!(stays_up(&controller).await);
    token.cancel();
}

// ── TssListener ───────────────────────────────────────────────────────

#[tokio::test]
async fn tss_rotation_triggers_shutdown() {
    let h = harness();
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    TssListener::new(h.client.clone(), fast()).listen(&token, controller.clone());
    assert!(stays_up(&controller).await);

    h.chain.set_tss(TssInfo {
        pubkey: "corepub1rotated".to_string(),
        finalized_height: 2,
    });
    tokio::time::timeout(Duration::from_secs(2), controller.cancelled())
        .await
        .unwrap();
}

#[tokio::test]
async fn pending_keygen_shuts_down_at_its_height() {
    let h = harness();
    h.chain.set_height(100);
    h.chain.set_keygen(Keygen {
        status: KeygenStatus::Pending,
        block_number: 110,
        pubkeys: vec!["corepub1a".to_string(), "corepub1b".to_string()],
    });
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    TssListener::new(h.client.clone(), fast()).listen(&token, controller.clone());

    assert!(stays_up(&controller).await);
    assert!(drive_until_shutdown(&h, &controller, 110).await);
}

#[tokio::test]
async fn cancelled_listeners_leave_controller_untouched() {
    let h = harness();
    let controller = ShutdownController::new();
    let token = CancellationToken::new();

    TssListener::new(h.client.clone(), fast()).listen(&token, controller.clone());
    ShutdownListener::new(h.client.clone(), fast(), "1.0.0")
        .unwrap()
        .listen(&token, controller.clone());

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    assert!(stays_up(&controller).await);
}
