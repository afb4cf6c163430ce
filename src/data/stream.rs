use {
    crate::{
        config::BINANCE,
        domain::Candle,
        engine::{ConnectionEvent, DataEvent, MarketKey},
    },
    futures::StreamExt,
    serde::Deserialize,
    std::{
        error::Error,
        fmt,
        sync::{Arc, Mutex, mpsc::Sender},
        thread::{self, JoinHandle},
    },
    tokio::{runtime::Runtime, sync::watch, time::sleep},
    tokio_tungstenite::{connect_async, tungstenite::Message},
};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Idle,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// Reconnect attempts exhausted.
    Failed,
    /// Closed on purpose; no reconnect will follow.
    Closed,
}

#[derive(Debug)]
pub enum KlineParseError {
    Json(String),
    NotKline,
    BadNumber(&'static str),
    InvalidCandle,
}

impl fmt::Display for KlineParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KlineParseError::Json(msg) => write!(f, "Malformed kline message: {}", msg),
            KlineParseError::NotKline => write!(f, "Not a kline event"),
            KlineParseError::BadNumber(field) => write!(f, "Field `{}` is not a number", field),
            KlineParseError::InvalidCandle => write!(f, "Kline violates OHLC ordering"),
        }
    }
}

impl Error for KlineParseError {}

#[derive(Debug)]
pub enum StreamError {
    Socket(String),
    /// The engine side of the channel is gone.
    ReceiverClosed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamError::Socket(msg) => write!(f, "WebSocket error: {}", msg),
            StreamError::ReceiverClosed => write!(f, "Event receiver closed"),
        }
    }
}

impl Error for StreamError {}

#[derive(Deserialize)]
struct KlineEvent {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "k")]
    kline: Option<KlinePayload>,
}

#[derive(Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
}

/// Raw `/ws/<stream>` payloads and combined `/stream?streams=` envelopes.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Combined {
        #[allow(dead_code)]
        stream: String,
        data: KlineEvent,
    },
    Raw(KlineEvent),
}

fn parse_field(value: &str, field: &'static str) -> Result<f64, KlineParseError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(KlineParseError::BadNumber(field))
}

pub fn try_parse_kline_message(text: &str) -> Result<Candle, KlineParseError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| KlineParseError::Json(e.to_string()))?;
    let event = match envelope {
        Envelope::Combined { data, .. } => data,
        Envelope::Raw(event) => event,
    };
    if event.event_type != "kline" {
        return Err(KlineParseError::NotKline);
    }
    let k = event.kline.ok_or(KlineParseError::NotKline)?;

    let candle = Candle::new(
        k.open_time,
        parse_field(&k.open, "o")?,
        parse_field(&k.high, "h")?,
        parse_field(&k.low, "l")?,
        parse_field(&k.close, "c")?,
        parse_field(&k.volume, "v")?,
    );
    if !candle.is_valid() {
        return Err(KlineParseError::InvalidCandle);
    }
    Ok(candle)
}

/// The in-progress candle carried by a kline message, or `None` for anything
/// that is not a well-formed kline event.
pub fn parse_kline_message(text: &str) -> Option<Candle> {
    match try_parse_kline_message(text) {
        Ok(candle) => Some(candle),
        Err(_e) => {
            #[cfg(debug_assertions)]
            if DF.log_stream_updates {
                log::info!("[kline] dropped message: {}", _e);
            }
            None
        }
    }
}

fn stream_url(key: &MarketKey) -> String {
    format!(
        "{}/{}@kline_{}",
        BINANCE.ws.base_url,
        key.symbol.to_lowercase(),
        key.interval
    )
}

fn set_status(status: &Mutex<StreamStatus>, value: StreamStatus) {
    if let Ok(mut guard) = status.lock() {
        *guard = value;
    }
}

/// Live kline subscription for one symbol and interval.
///
/// Runs on its own thread and runtime. Reconnects with exponential backoff until
/// `max_attempts` consecutive failures; `disconnect` (or drop) stops it without
/// triggering a reconnect.
pub struct KlineStream {
    key: MarketKey,
    status: Arc<Mutex<StreamStatus>>,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl KlineStream {
    pub fn new(key: MarketKey) -> Self {
        Self {
            key,
            status: Arc::new(Mutex::new(StreamStatus::Idle)),
            shutdown: None,
            handle: None,
        }
    }

    pub fn key(&self) -> &MarketKey {
        &self.key
    }

    pub fn status(&self) -> StreamStatus {
        self.status
            .lock()
            .map(|s| *s)
            .unwrap_or(StreamStatus::Failed)
    }

    pub fn is_connected(&self) -> bool {
        self.status() == StreamStatus::Connected
    }

    /// Start streaming into `tx`. A second call while running is a no-op.
    pub fn connect(&mut self, tx: Sender<DataEvent>) {
        if self.shutdown.is_some() {
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let key = self.key.clone();
        let status = self.status.clone();
        set_status(&status, StreamStatus::Connecting);

        let handle = thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create stream runtime: {}", e);
                    set_status(&status, StreamStatus::Failed);
                    let _ = tx.send(DataEvent::Connection {
                        key,
                        event: ConnectionEvent::GaveUp,
                    });
                    return;
                }
            };
            rt.block_on(run_kline_stream_with_reconnect(key, status, tx, shutdown_rx));
        });

        self.shutdown = Some(shutdown_tx);
        self.handle = Some(handle);
    }

    /// Stop streaming. Suppresses any pending or future reconnect.
    pub fn disconnect(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
            set_status(&self.status, StreamStatus::Closed);

            #[cfg(debug_assertions)]
            if DF.log_stream_updates {
                log::info!("[kline] {} disconnected on request", self.key);
            }
        }
        // Detach: the worker exits on its own once it sees the shutdown signal.
        self.handle.take();
    }
}

impl Drop for KlineStream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn run_kline_stream_with_reconnect(
    key: MarketKey,
    status: Arc<Mutex<StreamStatus>>,
    tx: Sender<DataEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let policy = BINANCE.ws.reconnect;
    let url = stream_url(&key);
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        #[cfg(debug_assertions)]
        if DF.log_stream_updates {
            log::info!("[kline] connecting to {} (attempt {})", url, attempt + 1);
        }

        let mut connected = false;
        let result = tokio::select! {
            r = run_kline_stream(&key, &url, &status, &tx, &mut connected) => r,
            _ = shutdown.changed() => break,
        };
        if connected {
            attempt = 0;
        }

        let notify = |event: ConnectionEvent| {
            tx.send(DataEvent::Connection {
                key: key.clone(),
                event,
            })
            .is_ok()
        };

        match result {
            Err(StreamError::ReceiverClosed) => break,
            Err(e) => {
                log::error!("[kline] {} failed: {}", key, e);
                if !notify(ConnectionEvent::Error(e.to_string())) {
                    break;
                }
            }
            Ok(()) => log::warn!("[kline] {} closed by server. Reconnecting...", key),
        }
        if connected && !notify(ConnectionEvent::Disconnected) {
            break;
        }

        attempt += 1;
        if attempt > policy.max_attempts {
            log::error!("[kline] {} giving up after {} attempts", key, policy.max_attempts);
            set_status(&status, StreamStatus::Failed);
            notify(ConnectionEvent::GaveUp);
            break;
        }

        set_status(&status, StreamStatus::Reconnecting { attempt });
        let delay = policy.delay_for(attempt);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }
}

async fn run_kline_stream(
    key: &MarketKey,
    url: &str,
    status: &Mutex<StreamStatus>,
    tx: &Sender<DataEvent>,
    connected: &mut bool,
) -> Result<(), StreamError> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| StreamError::Socket(e.to_string()))?;

    *connected = true;
    set_status(status, StreamStatus::Connected);
    tx.send(DataEvent::Connection {
        key: key.clone(),
        event: ConnectionEvent::Connected,
    })
    .map_err(|_| StreamError::ReceiverClosed)?;

    let (_write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Some(candle) = parse_kline_message(&text) {
                    #[cfg(debug_assertions)]
                    if DF.log_stream_updates {
                        log::info!(
                            "[kline-tick] {} t={} close={:.6}",
                            key,
                            candle.timestamp_ms,
                            candle.close_price
                        );
                    }
                    tx.send(DataEvent::Tick {
                        key: key.clone(),
                        candle,
                    })
                    .map_err(|_| StreamError::ReceiverClosed)?;
                }
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                return Err(StreamError::Socket(e.to_string()));
            }
            _ => {}
        }
    }

    Ok(())
}
