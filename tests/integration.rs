//! End to end tests of the registry and the scan session, without any bluetooth hardware.

use std::thread;
use futures::SinkExt;
use futures::channel::mpsc::channel;
use tokio_util::sync::CancellationToken;

use ble_device_list::config::types::Config;
use ble_device_list::device::registry::DeviceRegistry;
use ble_device_list::device::session::ScanSession;
use ble_device_list::device::types::{ScanEvent, SessionEvent, Sighting};
use ble_device_list::error::ScanError;

#[test]
fn readers_never_see_partial_updates() {
    const DEVICES: usize = 200;
    let registry = DeviceRegistry::new();

    let producer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..DEVICES {
                let address = format!("10:00:00:00:{:02X}:{:02X}", i / 256, i % 256);
                registry.observe(&address, Some("Sensor"), -30);
                registry.observe(&address, Some("Sensor"), -31);
            }
        })
    };

    let reader = {
        let registry = registry.clone();
        thread::spawn(move || {
            let mut previous = 0;
            for i in 0..500 {
                let query = if i % 2 == 0 { "" } else { "10:00" };
                let view = registry.search(query);

                assert!(view.len() >= previous, "devices are never removed");
                assert!(view.iter().all(|d| d.signal_strength == -30 || d.signal_strength == -31));
                previous = view.len();
            }
        })
    };

    producer.join().expect("producer panicked");
    reader.join().expect("reader panicked");

    assert_eq!(registry.search("").len(), DEVICES);
}

#[test]
fn search_results_keep_insertion_order_under_concurrent_updates() {
    let registry = DeviceRegistry::new();
    for address in ["A1", "B2", "C3"] {
        registry.observe(address, None, -50);
    }

    let handles: Vec<_> = ["C3", "A1", "B2"]
        .into_iter()
        .map(|address| {
            let registry = registry.clone();
            thread::spawn(move || {
                for rssi in 0..100 {
                    registry.observe(address, None, -rssi);
                }
                registry.set_connection_state(address, true);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("updater panicked");
    }

    let view = registry.search("");
    let addresses: Vec<_> = view.iter().map(|d| d.address.as_str()).collect();
    assert_eq!(addresses, vec!["A1", "B2", "C3"]);
    assert!(view.iter().all(|d| d.connected && d.signal_strength == -99));
}

#[tokio::test]
async fn session_feeds_registry_from_a_channel() {
    let registry = DeviceRegistry::new();
    let session = ScanSession::new(registry.clone(), &Config::default());
    let (mut scan_sender, scan_receiver) = channel::<ScanEvent>(16);
    let (session_sender, _session_receiver) = channel::<SessionEvent>(1);

    let handle = tokio::spawn(async move {
        session.run(CancellationToken::new(), scan_receiver, vec![session_sender]).await
    });

    scan_sender.send(ScanEvent::Sighting(Sighting::new("AA:11", Some("Kitchen Sensor"), -50))).await.unwrap();
    scan_sender.send(ScanEvent::Batch(vec![
        Sighting::new("BB:22", Some("Garage"), -70),
        Sighting::new("CC:33", None, -80),
    ])).await.unwrap();
    scan_sender.send(ScanEvent::ConnectionStateChange { address: "BB:22".to_string(), connected: true }).await.unwrap();
    scan_sender.send(ScanEvent::ConnectionStateChange { address: "ZZ:99".to_string(), connected: true }).await.unwrap();
    drop(scan_sender);

    handle.await.unwrap().expect("session should end when the stream ends");

    assert_eq!(registry.search("kitchen").len(), 1);
    assert!(registry.search("hello").is_empty());

    let all = registry.search("");
    assert_eq!(all.len(), 3);
    assert!(all[1].connected);
    assert!(registry.get("ZZ:99").is_none());
}

#[tokio::test]
async fn scan_failure_ends_the_session_once() {
    let registry = DeviceRegistry::new();
    let session = ScanSession::new(registry.clone(), &Config::default());
    let (mut scan_sender, scan_receiver) = channel::<ScanEvent>(16);

    scan_sender.send(ScanEvent::Sighting(Sighting::new("AA:11", None, -50))).await.unwrap();
    scan_sender.send(ScanEvent::Failed(1)).await.unwrap();

    let result = session.run(CancellationToken::new(), scan_receiver, vec![]).await;

    assert!(matches!(result, Err(ScanError::Transient { code: 1 })));
    assert_eq!(registry.len(), 1);
    assert!(scan_sender.send(ScanEvent::Failed(1)).await.is_err(), "the session no longer listens");
}
