#![allow(clippy::unwrap_used)]
// Engine lifecycle tests against a scripted `DeviceClient`, on paused time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_test::{assert_pending, assert_ready};

use smartsec_core::{
    ArmingState, ConnectionState, CoreError, DeviceClient, FaultStatus, LowBatteryStatus,
    SecuritySystemAccessory, StateSyncEngine, StatusSnapshot, TargetState,
};

const TTL: Duration = Duration::from_secs(5);

// ── Scripted device ─────────────────────────────────────────────────

#[derive(Default)]
struct Script {
    logins: AtomicUsize,
    fetches: AtomicUsize,
    logouts: AtomicUsize,
    fail_login: AtomicBool,
    fail_changes: AtomicBool,
    /// One-off responses consumed before falling back to `status`.
    queued: Mutex<VecDeque<Result<StatusSnapshot, CoreError>>>,
    status: Mutex<Option<StatusSnapshot>>,
    changes: Mutex<Vec<TargetState>>,
}

impl Script {
    fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn changes(&self) -> Vec<TargetState> {
        self.changes.lock().unwrap().clone()
    }

    fn report(&self, snapshot: StatusSnapshot) {
        *self.status.lock().unwrap() = Some(snapshot);
    }

    fn fail_next_fetch(&self) {
        self.queued.lock().unwrap().push_back(Err(CoreError::Fetch {
            message: "session expired".into(),
        }));
    }
}

struct ScriptedDevice(Arc<Script>);

impl DeviceClient for ScriptedDevice {
    async fn login(&self) -> Result<(), CoreError> {
        self.0.logins.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_login.load(Ordering::SeqCst) {
            return Err(CoreError::AuthenticationFailed {
                message: "invalid credentials".into(),
            });
        }
        Ok(())
    }

    async fn current_status(&self) -> Result<StatusSnapshot, CoreError> {
        self.0.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(queued) = self.0.queued.lock().unwrap().pop_front() {
            return queued;
        }
        self.0
            .status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::Fetch {
                message: "no status scripted".into(),
            })
    }

    async fn change_state(&self, target: TargetState) -> Result<(), CoreError> {
        self.0.changes.lock().unwrap().push(target);
        if self.0.fail_changes.load(Ordering::SeqCst) {
            return Err(CoreError::Rejected {
                message: "panel busy".into(),
            });
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), CoreError> {
        self.0.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn snapshot(arming_state: ArmingState, fault_status: FaultStatus) -> StatusSnapshot {
    StatusSnapshot {
        arming_state,
        target_state: TargetState::Disarmed,
        fault_status,
        battery_level: 87,
        low_battery_status: LowBatteryStatus::Normal,
        fetched_at: Utc::now(),
    }
}

fn setup(initial: StatusSnapshot) -> (Arc<Script>, StateSyncEngine<ScriptedDevice>) {
    let script = Arc::new(Script::default());
    script.report(initial);
    let engine =
        StateSyncEngine::with_ttl("Test Panel", ScriptedDevice(Arc::clone(&script)), TTL).unwrap();
    (script, engine)
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

// ── Initialization ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn init_seeds_cache_and_reports_ready() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    engine.init().await.unwrap();

    assert_eq!(script.logins(), 1);
    assert_eq!(script.fetches(), 1);
    assert_eq!(
        engine.cached_state().unwrap().arming_state,
        ArmingState::Disarmed
    );
    assert_eq!(*engine.connection_state().borrow(), ConnectionState::Ready);
    assert!(engine.is_refreshing().await);
}

#[tokio::test(start_paused = true)]
async fn zero_ttl_is_rejected_before_any_device_call() {
    let script = Arc::new(Script::default());
    script.report(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    let result = StateSyncEngine::with_ttl(
        "Test Panel",
        ScriptedDevice(Arc::clone(&script)),
        Duration::ZERO,
    );

    assert!(matches!(result, Err(CoreError::Config { .. })));
    settle().await;
    assert_eq!(script.logins(), 0);
    assert_eq!(script.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn init_login_failure_leaves_engine_failed() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    script.fail_login.store(true, Ordering::SeqCst);

    let err = engine.init().await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert_eq!(script.fetches(), 0);
    assert!(engine.cached_state().is_none());
    assert!(!engine.is_refreshing().await);
    assert_eq!(*engine.connection_state().borrow(), ConnectionState::Failed);

    // No automatic retry.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(script.logins(), 1);
}

#[tokio::test(start_paused = true)]
async fn init_twice_keeps_latest_snapshot_and_one_listener() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    engine.init().await.unwrap();
    script.report(snapshot(ArmingState::ArmedStay, FaultStatus::NoFault));
    engine.init().await.unwrap();

    assert_eq!(
        engine.cached_state().unwrap().arming_state,
        ArmingState::ArmedStay
    );

    tokio::time::sleep(TTL + Duration::from_millis(100)).await;
    // Two seeding fetches plus exactly one refresh.
    assert_eq!(script.fetches(), 3);
}

// ── Refresh scheduling ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn expiry_triggers_exactly_one_fetch() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();

    tokio::time::sleep(Duration::from_millis(4_900)).await;
    assert_eq!(script.fetches(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(script.fetches(), 2);
    assert!(engine.cached_state().is_some());

    tokio::time::sleep(TTL).await;
    assert_eq!(script.fetches(), 3);
}

#[tokio::test(start_paused = true)]
async fn refresh_failure_reinitializes_once() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();
    script.fail_next_fetch();

    tokio::time::sleep(TTL + Duration::from_millis(100)).await;

    assert_eq!(script.logins(), 2);
    assert_eq!(script.fetches(), 3);
    assert!(engine.cached_state().is_some());
    assert!(engine.is_refreshing().await);
    assert_eq!(*engine.connection_state().borrow(), ConnectionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn failed_relogin_stops_refreshing() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();
    script.fail_next_fetch();
    script.fail_login.store(true, Ordering::SeqCst);

    tokio::time::sleep(TTL + Duration::from_millis(100)).await;

    assert_eq!(script.logins(), 2);
    assert_eq!(script.fetches(), 2);
    assert!(engine.cached_state().is_none());
    assert!(!engine.is_refreshing().await);
    assert_eq!(*engine.connection_state().borrow(), ConnectionState::Failed);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(script.fetches(), 2);
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn get_state_waits_for_first_set() {
    let (_script, engine) = setup(snapshot(ArmingState::ArmedAway, FaultStatus::NoFault));

    let mut pending = tokio_test::task::spawn(engine.get_state());
    assert_pending!(pending.poll());

    engine.init().await.unwrap();

    assert!(pending.is_woken());
    let value = assert_ready!(pending.poll());
    assert_eq!(value.arming_state, ArmingState::ArmedAway);
}

#[tokio::test(start_paused = true)]
async fn concurrent_readers_share_one_snapshot() {
    let (_script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.get_state().await })
        })
        .collect();
    settle().await;

    engine.init().await.unwrap();
    let seeded = engine.cached_state().unwrap();

    for reader in readers {
        assert!(Arc::ptr_eq(&reader.await.unwrap(), &seeded));
    }
}

#[tokio::test(start_paused = true)]
async fn get_state_timeout_without_init() {
    let (_script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    let err = engine
        .get_state_timeout(Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Timeout { timeout_secs: 2 }));
}

#[tokio::test(start_paused = true)]
async fn sub_second_timeout_reports_whole_seconds_rounded_up() {
    let (_script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    let err = engine
        .get_state_timeout(Duration::from_millis(500))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Timeout { timeout_secs: 1 }));
    assert_eq!(err.to_string(), "Timed out after 1s waiting for status");
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn not_ready_rejects_without_device_call() {
    let (script, engine) = setup(snapshot(ArmingState::Triggered, FaultStatus::Fault));
    engine.init().await.unwrap();

    let err = engine
        .request_target_state(TargetState::ArmedAway)
        .unwrap_err();
    settle().await;

    assert!(err.is_policy_rejection());
    assert_eq!(engine.pending_target(), None);
    assert!(script.changes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn ready_request_forwards_one_change() {
    let (script, engine) = setup(snapshot(ArmingState::Triggered, FaultStatus::NoFault));
    engine.init().await.unwrap();

    engine.request_target_state(TargetState::Disarmed).unwrap();
    settle().await;

    assert_eq!(script.changes(), vec![TargetState::Disarmed]);
}

#[tokio::test(start_paused = true)]
async fn failed_change_is_logged_and_refresh_continues() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();
    script.fail_changes.store(true, Ordering::SeqCst);

    engine.request_target_state(TargetState::ArmedAway).unwrap();
    settle().await;

    assert_eq!(script.changes(), vec![TargetState::ArmedAway]);
    assert_eq!(*engine.connection_state().borrow(), ConnectionState::Ready);
    assert!(engine.is_refreshing().await);

    tokio::time::sleep(TTL + Duration::from_millis(100)).await;
    assert_eq!(script.fetches(), 2);
    assert_eq!(script.logins(), 1);
    assert!(engine.cached_state().is_some());
}

#[tokio::test(start_paused = true)]
async fn empty_cache_request_is_accepted() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));

    engine.request_target_state(TargetState::ArmedStay).unwrap();
    settle().await;

    assert_eq!(engine.pending_target(), Some(TargetState::ArmedStay));
    assert_eq!(script.changes(), vec![TargetState::ArmedStay]);
}

#[tokio::test(start_paused = true)]
async fn pending_target_clears_when_device_reports_it() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();
    let accessory = SecuritySystemAccessory::new(engine.clone());

    accessory.set_target_state(TargetState::ArmedAway).unwrap();
    assert_eq!(accessory.target_state().await, TargetState::ArmedAway);

    let mut armed = snapshot(ArmingState::ArmedAway, FaultStatus::NoFault);
    armed.target_state = TargetState::ArmedAway;
    script.report(armed);
    tokio::time::sleep(TTL + Duration::from_millis(100)).await;

    assert_eq!(engine.pending_target(), None);
    assert_eq!(accessory.current_state().await, ArmingState::ArmedAway);
    assert_eq!(accessory.target_state().await, TargetState::ArmedAway);
}

// ── Accessory bridge ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn state_changed_callback_sees_refreshes() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    let accessory = SecuritySystemAccessory::new(engine.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _listener = accessory.on_state_changed(move |snap| {
        let _ = tx.send(snap.arming_state);
    });

    engine.init().await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), ArmingState::Disarmed);

    script.report(snapshot(ArmingState::Triggered, FaultStatus::NoFault));
    tokio::time::sleep(TTL + Duration::from_millis(100)).await;
    assert_eq!(rx.recv().await.unwrap(), ArmingState::Triggered);
}

#[tokio::test(start_paused = true)]
async fn accessory_getters_read_cached_snapshot() {
    let (_script, engine) = setup(snapshot(ArmingState::ArmedStay, FaultStatus::Fault));
    engine.init().await.unwrap();
    let accessory = SecuritySystemAccessory::new(engine);

    assert_eq!(accessory.battery_level().await, 87);
    assert_eq!(accessory.low_battery_status().await, LowBatteryStatus::Normal);
    assert_eq!(accessory.fault_status().await, FaultStatus::Fault);
    assert_eq!(accessory.current_state().await, ArmingState::ArmedStay);

    let info = accessory.accessory_information();
    assert_eq!(info.name, "Test Panel");
    assert_eq!(info.manufacturer, "ADT");
}

// ── Shutdown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_stops_refresh_and_logs_out() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();

    engine.shutdown().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(script.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(script.fetches(), 1);
    assert!(!engine.is_refreshing().await);
    assert_eq!(
        *engine.connection_state().borrow(),
        ConnectionState::Uninitialized
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_in_flight_request() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();

    engine.request_target_state(TargetState::ArmedAway).unwrap();
    engine.shutdown().await;

    assert_eq!(script.changes(), vec![TargetState::ArmedAway]);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_refresh_and_listeners() {
    let (script, engine) = setup(snapshot(ArmingState::Disarmed, FaultStatus::NoFault));
    engine.init().await.unwrap();
    let accessory = SecuritySystemAccessory::new(engine.clone());
    let listener = accessory.on_state_changed(|_| {});

    drop(accessory);
    drop(engine);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(script.fetches(), 1);
    assert!(listener.is_finished());
}
