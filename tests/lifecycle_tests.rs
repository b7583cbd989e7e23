// Lifecycle controller: confirmed-only transitions, timeouts, events, logs, per-id locking

mod common;

use common::{Behavior, FakeController, lifecycle_fixture, running, stopped};
use stackwatch::lifecycle::{ControlFailureReason, LifecycleError};
use stackwatch::models::*;
use tokio::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn kafka_stopped() -> NewComponent {
    NewComponent {
        name: "kafka".into(),
        display_name: "Apache Kafka".into(),
        order: 6,
        ..Default::default()
    }
}

#[tokio::test]
async fn enabling_a_component_marks_it_running_on_success() {
    let f = lifecycle_fixture(
        vec![stopped("spark", 1)],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );

    let updated = f.lifecycle.set_enabled(1, true).await.unwrap();
    assert_eq!(updated.status, ComponentStatus::Running);
    assert!(updated.enabled);
    assert_eq!(updated.container_id.as_deref(), Some("ctr-spark"));
    assert!(updated.created_at.is_some());
    assert_eq!(updated.uptime.as_deref(), Some("0m"));
    assert_eq!(f.registry.get(1).unwrap(), updated);
    assert_eq!(f.controller.calls(), ["start:spark"]);
}

#[tokio::test]
async fn rejected_start_leaves_record_unchanged() {
    let f = lifecycle_fixture(
        vec![stopped("spark", 1)],
        FakeController::new(Behavior::Reject),
        TIMEOUT,
    );
    let before = f.registry.get(1).unwrap();

    let err = f.lifecycle.set_enabled(1, true).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::ControlFailure {
            id: 1,
            action: "start",
            reason: ControlFailureReason::Rejected(_),
        }
    ));
    assert_eq!(f.registry.get(1).unwrap(), before);
}

#[tokio::test]
async fn disabling_a_component_stops_it_and_clears_container() {
    let f = lifecycle_fixture(
        vec![running("minio", 2)],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );

    let updated = f.lifecycle.set_enabled(1, false).await.unwrap();
    assert_eq!(updated.status, ComponentStatus::Stopped);
    assert!(!updated.enabled);
    assert_eq!(updated.container_id, None);
    assert_eq!(updated.uptime, None);
    assert_eq!(f.controller.calls(), ["stop:minio"]);
}

#[tokio::test]
async fn failed_stop_never_shows_stopped() {
    let f = lifecycle_fixture(
        vec![running("minio", 2)],
        FakeController::new(Behavior::Reject),
        TIMEOUT,
    );
    let before = f.registry.get(1).unwrap();

    let err = f.lifecycle.set_enabled(1, false).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ControlFailure { action: "stop", .. }));
    let after = f.registry.get(1).unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, ComponentStatus::Running);
}

#[tokio::test]
async fn restart_of_stopped_kafka_succeeds() {
    let f = lifecycle_fixture(
        vec![kafka_stopped()],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );

    let updated = f.lifecycle.restart(1).await.unwrap();
    assert_eq!(updated.status, ComponentStatus::Running);
    assert!(updated.enabled);
    assert_eq!(f.controller.calls(), ["restart:kafka"]);
}

#[tokio::test]
async fn failed_restart_of_stopped_kafka_is_a_control_failure() {
    let f = lifecycle_fixture(
        vec![kafka_stopped()],
        FakeController::new(Behavior::Reject),
        TIMEOUT,
    );
    let before = f.registry.get(1).unwrap();

    let err = f.lifecycle.restart(1).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::ControlFailure {
            id: 1,
            action: "restart",
            ..
        }
    ));
    let after = f.registry.get(1).unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, ComponentStatus::Stopped);
    assert!(!after.enabled);
}

#[tokio::test]
async fn unknown_component_is_not_found_without_calling_controller() {
    let f = lifecycle_fixture(vec![], FakeController::new(Behavior::Succeed), TIMEOUT);

    assert_eq!(
        f.lifecycle.set_enabled(999, true).await.unwrap_err(),
        LifecycleError::NotFound(999)
    );
    assert_eq!(
        f.lifecycle.restart(999).await.unwrap_err(),
        LifecycleError::NotFound(999)
    );
    assert_eq!(
        f.lifecycle.logs(999).await.unwrap_err(),
        LifecycleError::NotFound(999)
    );
    assert!(f.controller.calls().is_empty());
}

#[tokio::test]
async fn unknown_ids_leave_no_control_lock_behind() {
    let f = lifecycle_fixture(vec![], FakeController::new(Behavior::Succeed), TIMEOUT);

    for id in 1..=10_000 {
        assert_eq!(
            f.lifecycle.restart(id).await.unwrap_err(),
            LifecycleError::NotFound(id)
        );
    }
    f.lifecycle.set_enabled(42, true).await.unwrap_err();

    assert!(f.registry.is_empty());
    assert!(f.registry.control_lock(42).is_err());
    assert!(f.registry.control_lock(10_000).is_err());
}

#[tokio::test]
async fn deleting_a_component_drops_its_control_lock() {
    let f = lifecycle_fixture(
        vec![running("kafka", 6)],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );
    f.lifecycle.restart(1).await.unwrap();
    assert!(f.registry.control_lock(1).is_ok());

    assert!(f.registry.delete(1));
    assert!(f.registry.control_lock(1).is_err());
    assert_eq!(
        f.lifecycle.restart(1).await.unwrap_err(),
        LifecycleError::NotFound(1)
    );
    assert_eq!(f.controller.calls(), ["restart:kafka"]);
}

#[tokio::test]
async fn controller_timeout_is_a_control_failure_and_changes_nothing() {
    let f = lifecycle_fixture(
        vec![stopped("hive", 3)],
        FakeController::new(Behavior::Hang),
        Duration::from_millis(50),
    );
    let before = f.registry.get(1).unwrap();

    let err = f.lifecycle.set_enabled(1, true).await.unwrap_err();
    assert_eq!(
        err,
        LifecycleError::ControlFailure {
            id: 1,
            action: "start",
            reason: ControlFailureReason::Timeout(50),
        }
    );
    assert_eq!(f.registry.get(1).unwrap(), before);
}

#[tokio::test]
async fn missing_container_maps_to_container_missing() {
    let f = lifecycle_fixture(
        vec![running("hbase", 4)],
        FakeController::new(Behavior::Missing),
        TIMEOUT,
    );

    let err = f.lifecycle.restart(1).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::ControlFailure {
            reason: ControlFailureReason::ContainerMissing(_),
            ..
        }
    ));
    assert!(err.to_string().contains("failed to restart component 1"));
}

#[tokio::test]
async fn events_are_published_for_success_and_failure() {
    let mut f = lifecycle_fixture(
        vec![stopped("flink", 7)],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );

    f.lifecycle.set_enabled(1, true).await.unwrap();
    let ok = f.events.recv().await.unwrap();
    assert_eq!(ok.component_id, 1);
    assert_eq!(ok.action, LifecycleAction::Start);
    assert!(ok.succeeded);
    assert_eq!(ok.status, ComponentStatus::Running);
    assert_eq!(ok.reason, None);

    f.controller.set_behavior(Behavior::Reject);
    f.lifecycle.set_enabled(1, false).await.unwrap_err();
    let failed = f.events.recv().await.unwrap();
    assert_eq!(failed.action, LifecycleAction::Stop);
    assert!(!failed.succeeded);
    assert_eq!(failed.status, ComponentStatus::Running);
    assert!(failed.reason.unwrap().contains("refused"));
}

#[tokio::test]
async fn logs_require_a_running_container() {
    let f = lifecycle_fixture(
        vec![stopped("hive", 3), running("kafka", 6)],
        FakeController::new(Behavior::Succeed),
        TIMEOUT,
    );

    assert_eq!(
        f.lifecycle.logs(1).await.unwrap_err(),
        LifecycleError::NotRunning(1)
    );
    let lines = f.lifecycle.logs(2).await.unwrap();
    assert_eq!(lines, ["[ctr-kafka] line 1", "[ctr-kafka] line 2"]);
    assert_eq!(f.controller.calls(), ["logs:ctr-kafka"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn operations_on_the_same_component_are_serialized() {
    let f = lifecycle_fixture(
        vec![stopped("spark", 1)],
        FakeController::with_delay(Behavior::Succeed, Duration::from_millis(20)),
        TIMEOUT,
    );

    let mut handles = Vec::new();
    for i in 0..6 {
        let lifecycle = f.lifecycle.clone();
        handles.push(tokio::spawn(async move {
            lifecycle.set_enabled(1, i % 2 == 0).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(f.controller.max_in_flight(), 1);
    let last_call = f.controller.calls().last().cloned().unwrap();
    let c = f.registry.get(1).unwrap();
    match last_call.as_str() {
        "start:spark" => assert_eq!(c.status, ComponentStatus::Running),
        "stop:spark" => assert_eq!(c.status, ComponentStatus::Stopped),
        other => panic!("unexpected call {other}"),
    }
    assert_eq!(c.enabled, c.status == ComponentStatus::Running);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn operations_on_different_components_run_in_parallel() {
    let f = lifecycle_fixture(
        vec![stopped("a", 1), stopped("b", 2)],
        FakeController::with_delay(Behavior::Succeed, Duration::from_millis(100)),
        TIMEOUT,
    );

    let (a, b) = tokio::join!(
        f.lifecycle.set_enabled(1, true),
        f.lifecycle.set_enabled(2, true)
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(f.controller.max_in_flight(), 2);
}
