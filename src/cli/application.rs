use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::{channel, Sender};
use btleplug::platform::{Adapter, Manager};
use log::{debug, error, info, warn};
use tokio::io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::signal;
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::cli::render::render_view;
use crate::cli::types::{Message, Options};
use crate::config::io::ConfigIO;
use crate::device::connection::{connect_device, disconnect_device, scan_events_task, start_scanning};
use crate::device::constants::SESSION_EVENT_CHANNEL_SIZE;
use crate::device::registry::DeviceRegistry;
use crate::device::session::ScanSession;
use crate::device::types::{Device, ScanEvent, SessionEvent};
use crate::error::AppRunError;

async fn write_view(out: &mut Stdout, query: &str, devices: &[Device]) -> Result<(), AppRunError> {
    out.write_all(render_view(query, devices).as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

// every line typed on stdin replaces the current query
fn read_queries_task(cancel: CancellationToken, mut sender: Sender<Message>) -> JoinHandle<()> {
    spawn(async move {
        let mut lines = BufReader::new(stdin()).lines();

        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if sender.send(Message::QueryChanged(line.trim().to_string())).await.is_err() {
                            break 'mainloop;
                        }
                    },
                    Ok(None) => {
                        debug!("stdin closed, the query can no longer change");
                        break 'mainloop;
                    },
                    Err(err) => {
                        warn!("Failed to read query from stdin: {:?}", err);
                        break 'mainloop;
                    },
                },
            }
        }
    })
}

fn connect_task(adapters: Vec<Adapter>, address: String, mut sender: Sender<Message>) -> JoinHandle<()> {
    spawn(async move {
        let result = connect_device(&adapters, &address).await;
        let _ = sender.send(Message::ConnectComplete(address, result)).await;
    })
}

pub async fn run_application(options: Options) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new(options.config.clone())?;
    let mut config = config_io.read_or_default().await?;
    options.apply_to(&mut config);

    if options.save_config {
        config_io.save(&config).await?;
        info!("Saved config to {}", config_io.path().to_string_lossy());
    }

    // this token is cancelled upon exit
    let app_cancel = CancellationToken::new();
    let registry = DeviceRegistry::new();
    let mut out = stdout();

    write_view(&mut out, &options.query, &registry.search(&options.query)).await?;

    let manager = Manager::new().await?;
    let adapters = start_scanning(&manager, &config.service_filter).await?;

    let (scan_sender, scan_receiver) = channel::<ScanEvent>(config.event_channel_capacity);
    let (session_sender, mut session_receiver) = channel::<SessionEvent>(SESSION_EVENT_CHANNEL_SIZE);
    let (message_sender, mut message_receiver) = channel::<Message>(8);

    let source_handle = scan_events_task(app_cancel.child_token(), adapters.clone(), scan_sender);

    let session = ScanSession::new(registry.clone(), &config);
    let session_handle = {
        let cancel = app_cancel.child_token();
        let mut message_sender = message_sender.clone();

        spawn(async move {
            let result = session.run(cancel, scan_receiver, vec![session_sender]).await;
            let _ = message_sender.send(Message::ScanEnded(result)).await;
        })
    };

    let stdin_handle = read_queries_task(app_cancel.child_token(), message_sender.clone());

    // device identities are upper case
    let mut connect_target = options.connect.as_ref().map(|address| address.to_uppercase());
    let mut connected_address: Option<String> = None;
    let deadline = sleep(options.duration.unwrap_or(Duration::MAX));
    tokio::pin!(deadline);

    'mainloop: loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break 'mainloop;
            },
            _ = &mut deadline, if options.duration.is_some() => {
                info!("Scan duration elapsed, stopping");
                break 'mainloop;
            },
            Some(_) = session_receiver.next() => {
                write_view(&mut out, &registry.current_query(), &registry.current_view()).await?;

                let target_seen = connect_target.as_deref()
                    .map(|address| registry.get(address).is_some())
                    .unwrap_or(false);

                if target_seen {
                    if let Some(address) = connect_target.take() {
                        connect_task(adapters.clone(), address, message_sender.clone());
                    }
                }
            },
            Some(message) = message_receiver.next() => match message {
                Message::QueryChanged(query) => {
                    let devices = registry.search(&query);
                    write_view(&mut out, &query, &devices).await?;
                },
                Message::ScanEnded(Ok(())) => {
                    info!("Scanning stopped");
                },
                Message::ScanEnded(Err(err)) => {
                    out.write_all(format!("Scan failed: {}\n", err).as_bytes()).await?;
                    out.flush().await?;
                },
                Message::ConnectComplete(address, Ok(services)) => {
                    info!("Discovered {} service(s) on {}", services.len(), address);
                    connected_address = Some(address);
                },
                Message::ConnectComplete(address, Err(err)) => {
                    error!("Connecting to {} failed: {}", address, err);
                },
            },
        }
    }

    // nobody reads messages from here on, senders must not wait for room
    drop(message_receiver);

    if let Some(address) = connected_address {
        if let Err(err) = disconnect_device(&adapters, &address).await {
            warn!("Failed to disconnect from {}: {}", address, err);
        }
    }

    app_cancel.cancel();

    if let Err(err) = session_handle.await {
        warn!("Scan session task failed: {:?}", err);
    }

    match source_handle.await {
        Ok(Ok(())) => {},
        Ok(Err(err)) => debug!("Scan event task ended with an error: {}", err),
        Err(err) => warn!("Scan event task failed: {:?}", err),
    }

    // a pending read on stdin does not observe cancellation
    stdin_handle.abort();
    Ok(())
}
