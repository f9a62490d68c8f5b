use futures::{Stream, StreamExt};
use futures::channel::mpsc::Sender;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::types::Config;
use crate::device::registry::DeviceRegistry;
use crate::device::types::{ScanEvent, SessionEvent, Sighting};
use crate::error::{ScanError, SightingError};

fn normalize_sighting(mut sighting: Sighting) -> Result<Sighting, SightingError> {
    if sighting.address.trim().is_empty() {
        return Err(SightingError::MalformedSighting);
    }

    if sighting.display_name.as_deref().map(str::trim).map(str::is_empty).unwrap_or(false) {
        sighting.display_name = None;
    }

    Ok(sighting)
}

/// Feeds scan events into a `DeviceRegistry`.
///
/// The registry keeps the name of the first sighting. Platforms often report a peripheral before
/// its scan response arrives, so with unnamed devices included such a device stays unnamed even
/// once its name is advertised.
#[derive(Clone)]
pub struct ScanSession {
    registry: DeviceRegistry,
    include_unnamed_devices: bool,
}

impl ScanSession {
    pub fn new(registry: DeviceRegistry, config: &Config) -> Self {
        ScanSession {
            registry,
            include_unnamed_devices: config.include_unnamed_devices,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Returns `true` if the sighting reached the registry.
    pub fn observe(&self, sighting: Sighting) -> bool {
        let sighting = match normalize_sighting(sighting) {
            Ok(v) => v,
            Err(err) => {
                warn!("Dropping sighting: {}", err);
                return false;
            },
        };

        if sighting.display_name.is_none() && !self.include_unnamed_devices {
            debug!("Skipping unnamed device {}", sighting.address);
            return false;
        }

        self.registry.observe(&sighting.address, sighting.display_name.as_deref(), sighting.signal_strength);
        true
    }

    /// Apply a single event. Returns whether the registry may have changed.
    pub fn apply(&self, event: ScanEvent) -> Result<bool, ScanError> {
        match event {
            ScanEvent::Sighting(sighting) => Ok(self.observe(sighting)),
            ScanEvent::Batch(sightings) => {
                let mut changed = false;
                for sighting in sightings {
                    changed |= self.observe(sighting);
                }
                Ok(changed)
            },
            ScanEvent::ConnectionStateChange { address, connected } => {
                let known = self.registry.set_connection_state(&address, connected);
                if !known {
                    debug!("Ignoring connection state of unknown device {}", address);
                }
                Ok(known)
            },
            ScanEvent::Failed(code) => Err(ScanError::Transient { code }),
            ScanEvent::Interrupted(reason) => Err(ScanError::Interrupted { reason }),
        }
    }

    /// Consume `events` until the stream ends, `cancel` fires or the scan fails.
    ///
    /// Every change is announced to `senders` without waiting; a full channel already has a
    /// redraw pending.
    pub async fn run<S>(&self, cancel: CancellationToken, mut events: S, mut senders: Vec<Sender<SessionEvent>>) -> Result<(), ScanError>
        where S: Stream<Item = ScanEvent> + Unpin
    {
        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scan session cancelled");
                    break 'mainloop;
                },
                event = events.next() => {
                    let event = match event {
                        Some(v) => v,
                        None => {
                            info!("Scan event stream ended");
                            break 'mainloop;
                        },
                    };

                    let changed = match self.apply(event) {
                        Ok(v) => v,
                        Err(err) => {
                            error!("{}", err);
                            return Err(err);
                        },
                    };

                    if changed {
                        senders.retain_mut(|sender| match sender.try_send(SessionEvent::RegistryChanged) {
                            Ok(_) => true,
                            Err(err) => !err.is_disconnected(),
                        });
                    }
                },
            }
        }

        Ok(())
    }
}
