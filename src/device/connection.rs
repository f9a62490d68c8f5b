use std::fmt::Display;
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use futures::stream::select_all;
use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::device::constants::{CONNECT_DEADLINE, DISCONNECT_DEADLINE, DISCOVER_DEADLINE};
use crate::device::types::{ScanEvent, ServiceSummary, Sighting};
use crate::error::{DeviceError, ScanError};

pub async fn start_scanning(manager: &Manager, services: &[Uuid]) -> Result<Vec<Adapter>, ScanError> {
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(ScanError::NoAdapter);
    }

    let filter = ScanFilter {
        services: services.to_vec(),
    };

    for adapter in &adapters {
        info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        adapter.start_scan(filter.clone()).await?;
    }

    Ok(adapters)
}

pub async fn stop_scanning(adapters: &[Adapter]) {
    for adapter in adapters {
        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scanning: {:?}", err);
        }
    }
}

/// The registry key of a peripheral: its hardware address, or the platform peripheral id where the
/// platform hides the address (CoreBluetooth reports 00:00:00:00:00:00 for every peripheral).
pub fn device_identity<I: Display>(address: BDAddr, id: &I) -> String {
    if address == BDAddr::default() {
        id.to_string().to_uppercase()
    } else {
        address.to_string()
    }
}

fn peripheral_identity(peripheral: &Peripheral) -> String {
    device_identity(peripheral.address(), &peripheral.id())
}

fn sighting_from_properties(identity: String, properties: PeripheralProperties) -> Option<Sighting> {
    let signal_strength = match properties.rssi {
        Some(v) => v,
        None => {
            debug!("Peripheral {} has no signal strength yet", identity);
            return None;
        },
    };

    Some(Sighting {
        address: identity,
        display_name: properties.local_name,
        signal_strength,
    })
}

async fn translate_event(adapter: &Adapter, event: CentralEvent) -> Option<ScanEvent> {
    let (id, connected): (PeripheralId, Option<bool>) = match event {
        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => (id, None),
        CentralEvent::DeviceConnected(id) => (id, Some(true)),
        CentralEvent::DeviceDisconnected(id) => (id, Some(false)),
        _ => return None,
    };

    let peripheral = match adapter.peripheral(&id).await {
        Ok(v) => v,
        Err(err) => {
            warn!("Could not look up peripheral {:?}: {:?}", id, err);
            return None;
        },
    };
    let identity = peripheral_identity(&peripheral);

    if let Some(connected) = connected {
        if connected {
            info!("Connected to {}", identity);
        } else {
            info!("Disconnected from {}", identity);
        }
        return Some(ScanEvent::ConnectionStateChange { address: identity, connected });
    }

    match peripheral.properties().await {
        Err(err) => {
            warn!("Could not query peripheral for properties: {:?}", err);
            None
        },
        Ok(None) => {
            warn!("Peripheral has no properties");
            None
        },
        Ok(Some(properties)) => sighting_from_properties(identity, properties).map(ScanEvent::Sighting),
    }
}

async fn forward_events(cancel: &CancellationToken, adapters: &[Adapter], sender: &mut Sender<ScanEvent>) -> Result<(), ScanError> {
    let mut streams = Vec::with_capacity(adapters.len());
    for (index, adapter) in adapters.iter().enumerate() {
        let events = adapter.events().await?;
        streams.push(events.map(move |event| (index, event)).boxed());
    }
    let mut events = select_all(streams);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(());
            },
            next = events.next() => {
                let (index, event) = match next {
                    Some(v) => v,
                    None => return Err(ScanError::EventsEnded),
                };

                if let Some(scan_event) = translate_event(&adapters[index], event).await {
                    if sender.send(scan_event).await.is_err() {
                        debug!("Scan session is gone, no longer forwarding events");
                        return Ok(());
                    }
                }
            },
        }
    }
}

/// Pass a failure of the event producer on to the session, which reports it like any other scan
/// failure. The result is returned unchanged.
pub async fn report_producer_result(sender: &mut Sender<ScanEvent>, result: Result<(), ScanError>) -> Result<(), ScanError> {
    if let Err(err) = &result {
        warn!("Scan event producer stopped: {}", err);
        if sender.send(ScanEvent::Interrupted(err.to_string())).await.is_err() {
            debug!("Scan session is gone, the failure is not forwarded");
        }
    }

    result
}

/// Forward the central events of every adapter to `sender` as `ScanEvent`s until cancelled.
pub fn scan_events_task(cancel: CancellationToken, adapters: Vec<Adapter>, mut sender: Sender<ScanEvent>) -> JoinHandle<Result<(), ScanError>> {
    spawn(async move {
        let result = forward_events(&cancel, &adapters, &mut sender).await;
        stop_scanning(&adapters).await;
        report_producer_result(&mut sender, result).await
    })
}

async fn find_peripheral(adapters: &[Adapter], address: &str) -> Result<Peripheral, DeviceError> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        if let Some(peripheral) = peripherals.into_iter().find(|p| peripheral_identity(p).eq_ignore_ascii_case(address)) {
            return Ok(peripheral);
        }
    }

    Err(DeviceError::UnknownDevice { address: address.to_string() })
}

async fn with_deadline<T, F>(deadline: u64, fut: F) -> Result<T, DeviceError>
    where F: std::future::Future<Output = Result<T, btleplug::Error>>
{
    tokio::select! {
        _ = sleep(Duration::from_millis(deadline)) => Err(DeviceError::Timeout),
        result = fut => Ok(result?),
    }
}

fn summarize_services(peripheral: &Peripheral) -> Vec<ServiceSummary> {
    peripheral.services()
        .into_iter()
        .map(|service| {
            let characteristics = service.characteristics.iter().map(|c| c.uuid).collect::<Vec<_>>();
            info!("Service {}", service.uuid);
            for characteristic in &characteristics {
                info!("  Characteristic {}", characteristic);
            }

            ServiceSummary { uuid: service.uuid, characteristics }
        })
        .collect()
}

/// Connect to the device with `address` and enumerate its GATT services.
///
/// The resulting connection state reaches the registry through the adapter events, not from here.
pub async fn connect_device(adapters: &[Adapter], address: &str) -> Result<Vec<ServiceSummary>, DeviceError> {
    let peripheral = find_peripheral(adapters, address).await?;

    info!("Connecting to peripheral {}...", address);
    with_deadline(CONNECT_DEADLINE, peripheral.connect()).await?;

    info!("Connected; Discovering services...");
    with_deadline(DISCOVER_DEADLINE, peripheral.discover_services()).await?;

    Ok(summarize_services(&peripheral))
}

pub async fn disconnect_device(adapters: &[Adapter], address: &str) -> Result<(), DeviceError> {
    let peripheral = find_peripheral(adapters, address).await?;
    with_deadline(DISCONNECT_DEADLINE, peripheral.disconnect()).await
}
