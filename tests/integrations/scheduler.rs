#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::fake_api::FakeApi;
use mailcow_exporter::{scheduler::Scheduler, GaugeId, GaugeRegistry, MetricsCollector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

const INTERVAL: Duration = Duration::from_secs(1800);

fn scheduler_with(api: Arc<FakeApi>) -> (Scheduler, Arc<GaugeRegistry>) {
    let registry = Arc::new(GaugeRegistry::new());
    let collector = Arc::new(MetricsCollector::new(api, registry.clone()));
    (Scheduler::new(collector, INTERVAL), registry)
}

#[tokio::test(start_paused = true)]
async fn test_runs_immediately_then_once_per_interval() {
    let api = Arc::new(FakeApi::healthy());
    let (scheduler, _registry) = scheduler_with(api.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(api.calls("status/containers"), 1);

    sleep(Duration::from_secs(1798)).await;
    assert_eq!(api.calls("status/containers"), 1, "no pass before the interval elapses");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(api.calls("status/containers"), 2);

    sleep(INTERVAL).await;
    assert_eq!(api.calls("status/containers"), 3);
    assert_eq!(api.total_calls(), 30);

    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stops_on_shutdown_signal() {
    let api = Arc::new(FakeApi::healthy());
    let (scheduler, _registry) = scheduler_with(api.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    sleep(Duration::from_secs(1)).await;
    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    sleep(INTERVAL * 2).await;
    assert_eq!(api.calls("status/containers"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_sender_is_dropped() {
    let api = Arc::new(FakeApi::healthy());
    let (scheduler, _registry) = scheduler_with(api);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    sleep(Duration::from_secs(1)).await;
    drop(shutdown_tx);
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_keeps_running_through_failed_passes() {
    let api = Arc::new(FakeApi::new());
    let (scheduler, registry) = scheduler_with(api.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.value(GaugeId::CollectionFailedFetches), Some(10.0));

    for (path, payload) in helpers::fixtures::healthy() {
        api.respond(path, payload);
    }
    sleep(INTERVAL).await;

    assert_eq!(api.calls("fwdhost/all"), 2);
    assert_eq!(registry.value(GaugeId::CollectionFailedFetches), Some(0.0));
    assert_eq!(registry.value(GaugeId::ForwardingHosts), Some(1.0));
    assert!(!handle.is_finished());

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
