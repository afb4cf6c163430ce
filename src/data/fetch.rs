use {
    crate::{
        data::MarketDataProvider,
        engine::{DataEvent, SnapshotRequest},
    },
    futures::future::join_all,
    std::{
        sync::{Arc, mpsc::Sender},
        thread::{self, JoinHandle},
    },
    tokio::runtime::Runtime,
};

#[cfg(debug_assertions)]
use crate::config::DF;

async fn fetch_one(
    provider: &dyn MarketDataProvider,
    request: SnapshotRequest,
    tx: &Sender<DataEvent>,
) {
    let SnapshotRequest { key, target, limit } = request;
    let event = match provider.fetch_candles(&key.symbol, key.interval, limit).await {
        Ok(candles) => {
            #[cfg(debug_assertions)]
            if DF.log_snapshots {
                log::info!("Snapshot {} ({:?}): {} candles", key, target, candles.len());
            }
            DataEvent::Snapshot {
                key,
                target,
                candles,
            }
        }
        Err(e) => {
            log::error!("Snapshot {} ({:?}) failed: {:#}", key, target, e);
            DataEvent::SnapshotFailed {
                key,
                target,
                error: format!("{:#}", e),
            }
        }
    };
    // Receiver gone means the app is shutting down.
    let _ = tx.send(event);
}

async fn fetch_stats(provider: &dyn MarketDataProvider, symbol: String, tx: &Sender<DataEvent>) {
    let event = match provider.fetch_24h_stats(&symbol).await {
        Ok(stats) => DataEvent::Stats { symbol, stats },
        Err(e) => {
            log::warn!("24h stats for {} failed: {:#}", symbol, e);
            DataEvent::StatsFailed {
                symbol,
                error: format!("{:#}", e),
            }
        }
    };
    let _ = tx.send(event);
}

/// Run a batch of REST fetches on a background thread with its own runtime.
/// Every request produces exactly one `Snapshot` or `SnapshotFailed` event.
pub fn spawn_snapshot_fetch(
    provider: Arc<dyn MarketDataProvider>,
    requests: Vec<SnapshotRequest>,
    stats_symbol: Option<String>,
    tx: Sender<DataEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create fetch runtime: {}", e);
                for SnapshotRequest { key, target, .. } in requests {
                    let _ = tx.send(DataEvent::SnapshotFailed {
                        key,
                        target,
                        error: format!("runtime unavailable: {}", e),
                    });
                }
                return;
            }
        };

        rt.block_on(async {
            let candles = join_all(
                requests
                    .into_iter()
                    .map(|request| fetch_one(provider.as_ref(), request, &tx)),
            );
            match stats_symbol {
                Some(symbol) => {
                    futures::join!(candles, fetch_stats(provider.as_ref(), symbol, &tx));
                }
                None => {
                    candles.await;
                }
            }
        });
    })
}
