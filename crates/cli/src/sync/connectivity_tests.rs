// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::super::test_helpers::ScriptedProbe;
use super::*;
use std::sync::atomic::AtomicUsize;
use yare::parameterized;

fn recorder(monitor: &ConnectivityMonitor) -> (Arc<Mutex<Vec<bool>>>, ListenerHandle) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handle = monitor.add_connectivity_listener(move |online| {
        sink.lock().unwrap().push(online);
    });
    (seen, handle)
}

#[test]
fn test_starts_offline() {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(true));
    assert!(!monitor.get_is_online());
}

#[tokio::test]
async fn test_check_updates_last_known_value() {
    let probe = ScriptedProbe::new(true);
    let monitor = ConnectivityMonitor::new(probe.clone());

    assert!(monitor.check_network_status().await);
    assert!(monitor.get_is_online());

    probe.set_online(false);
    assert!(!monitor.check_network_status().await);
    assert!(!monitor.get_is_online());
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_listener_fires_on_transitions_only() {
    let probe = ScriptedProbe::new(true);
    let monitor = ConnectivityMonitor::new(probe.clone());
    let (seen, _handle) = recorder(&monitor);

    monitor.check_network_status().await;
    monitor.check_network_status().await;
    probe.set_online(false);
    monitor.check_network_status().await;
    monitor.check_network_status().await;
    probe.set_online(true);
    monitor.check_network_status().await;

    assert_eq!(*seen.lock().unwrap(), vec![true, false, true]);
}

#[parameterized(
    repeated_offline = { &[false, false, false], &[] },
    one_flap = { &[true, false], &[true, false] },
    steady_online = { &[true, true, true], &[true] },
    mixed = { &[false, true, true, false, false, true], &[true, false, true] },
)]
fn test_record_transitions(events: &[bool], expected: &[bool]) {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(false));
    let (seen, _handle) = recorder(&monitor);
    for online in events {
        monitor.record(*online);
    }
    assert_eq!(seen.lock().unwrap().as_slice(), expected);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(false));
    let (seen, handle) = recorder(&monitor);

    monitor.record(true);
    handle.unsubscribe();
    handle.unsubscribe();
    monitor.record(false);

    assert_eq!(*seen.lock().unwrap(), vec![true]);
    assert_eq!(monitor.listener_count(), 0);
}

#[test]
fn test_listener_can_unsubscribe_itself() {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

    let counter = Arc::clone(&calls);
    let own = Arc::clone(&slot);
    let handle = monitor.add_connectivity_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = own.lock().unwrap().as_ref() {
            handle.unsubscribe();
        }
    });
    *slot.lock().unwrap() = Some(handle);

    monitor.record(true);
    monitor.record(false);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_multiple_listeners_each_notified() {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(false));
    let (first, _h1) = recorder(&monitor);
    let (second, _h2) = recorder(&monitor);

    monitor.record(true);
    assert_eq!(*first.lock().unwrap(), vec![true]);
    assert_eq!(*second.lock().unwrap(), vec![true]);
}

#[test]
fn test_handle_outliving_monitor_is_harmless() {
    let monitor = ConnectivityMonitor::new(ScriptedProbe::new(false));
    let (_, handle) = recorder(&monitor);
    drop(monitor);
    handle.unsubscribe();
}

#[parameterized(
    ws_explicit_port = { "ws://127.0.0.1:7890", "127.0.0.1:7890" },
    ws_default_port = { "ws://example.com/api", "example.com:80" },
    wss_default_port = { "wss://example.com", "example.com:443" },
)]
fn test_tcp_probe_from_url(url: &str, expected: &str) {
    let probe = TcpProbe::from_url(url, Duration::from_secs(1)).unwrap();
    assert_eq!(probe.address(), expected);
}

#[test]
fn test_tcp_probe_rejects_bad_url() {
    assert!(TcpProbe::from_url("not a url", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn test_tcp_probe_reaches_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(2));
    assert!(probe.probe().await);
}

#[tokio::test]
async fn test_tcp_probe_closed_port_is_offline() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(2));
    assert!(!probe.probe().await);
}

#[tokio::test]
async fn test_polling_detects_change_and_stops_on_cancel() {
    let probe = ScriptedProbe::new(true);
    let monitor = Arc::new(ConnectivityMonitor::new(probe.clone()));
    let cancel = CancellationToken::new();

    let handle = monitor.spawn_polling(Duration::from_millis(10), cancel.clone());

    for _ in 0..100 {
        if monitor.get_is_online() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(monitor.get_is_online());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[test]
fn test_concurrent_records_deliver_transitions_in_order() {
    let monitor = Arc::new(ConnectivityMonitor::new(ScriptedProbe::new(false)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _handle = monitor.add_connectivity_listener(move |online| sink.lock().unwrap().push(online));

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || {
                for i in 0..200 {
                    monitor.record((i + t) % 3 != 0);
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    // Every delivery is a real transition, and the last one is current
    assert!(seen.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(seen.last().copied(), Some(monitor.get_is_online()));
}
