use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::codec::StompCodec;
use crate::error::StompError;
use crate::frame::{StompEvent, StompFrame};

/// A single feed subscription: a destination topic and its durable
/// subscription name — durable names persist broker-side so messages
/// buffered during a disconnect are replayed on resubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Broker destination, e.g. `"/topic/RTPPM_ALL"`.
    pub topic: String,
    /// Durable subscription name, sent as `activemq.subscriptionName`.
    pub durable: String,
}

/// Connection parameters for a feed manager.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// STOMP vhost header ("Vhost equal to host").
    pub vhost: String,
    /// Login username; also sent as the `client-id` header.
    pub login: String,
    /// Login password.
    pub passcode: String,
    /// `(send_ms, receive_ms)` heartbeat negotiation (100000/100000).
    pub heartbeat_ms: (u32, u32),
    /// Maximum connection attempts before giving up (`COLLECTOR_ATTEMPTS`,
    /// default 5).
    pub max_attempts: u32,
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport connection.
    Disconnected,
    /// Transport connect in flight.
    Connecting,
    /// Transport connected, STOMP handshake not yet sent.
    Connected,
    /// Handshake complete and every subscription acknowledged.
    Subscribed,
    /// Unwinding after a transport error, remote disconnect, or heartbeat
    /// timeout; re-enters `Disconnected` once cleanup finishes.
    Recovering,
}

/// The four callbacks a STOMP listener must implement ("Listener
/// callback object").
#[async_trait]
pub trait FeedCallbacks: Send + Sync {
    /// A `MESSAGE` frame arrived on `destination`, already acknowledged.
    async fn on_message(&self, destination: &str, body: &[u8]);
    /// The broker sent an `ERROR` frame or a transport-level error occurred.
    async fn on_error(&self, message: &str);
    /// The remote end closed the connection.
    async fn on_disconnected(&self);
    /// No heartbeat or frame arrived within the negotiated window.
    async fn on_heartbeat_timeout(&self);
}

/// Durable-subscription connection manager for one broker connection
/// carrying any number of feeds.
pub struct FeedManager<C> {
    config: ConnectConfig,
    subscriptions: Vec<Subscription>,
    callbacks: C,
    state: ConnectionState,
}

impl<C: FeedCallbacks> FeedManager<C> {
    /// Build a manager for the given subscriptions, not yet connected.
    pub fn new(config: ConnectConfig, subscriptions: Vec<Subscription>, callbacks: C) -> Self {
        Self {
            config,
            subscriptions,
            callbacks,
            state: ConnectionState::Disconnected,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drive the connect → subscribe → serve → recover cycle until
    /// `shutdown` reports `true`, at which point subscriptions are torn down
    /// and the connection closed cleanly.
    ///
    /// Returns `Err(StompError::AttemptsExhausted)` if a reconnect attempt
    /// ever exhausts `max_attempts`; callers should exit the process with
    /// code 0 in that case ("intentional to let a supervisor
    /// restart without crash-looping").
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), StompError> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            self.state = ConnectionState::Connecting;
            let stream = self.connect_with_backoff(&mut shutdown).await?;
            if *shutdown.borrow() {
                return Ok(());
            }

            self.state = ConnectionState::Connected;
            let mut framed = Framed::new(stream, StompCodec);
            if let Err(err) = self.handshake(&mut framed).await {
                warn!(error = %err, "STOMP handshake failed, retrying");
                self.state = ConnectionState::Recovering;
                continue;
            }

            self.subscribe(&mut framed).await;
            self.state = ConnectionState::Subscribed;

            match self.serve(&mut framed, &mut shutdown).await {
                ServeOutcome::ShuttingDown => {
                    self.teardown(&mut framed).await;
                    return Ok(());
                }
                ServeOutcome::Recover => {
                    self.state = ConnectionState::Recovering;
                }
            }
        }
    }

    async fn connect_with_backoff(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<TcpStream, StompError> {
        for attempt in 0..self.config.max_attempts {
            if *shutdown.borrow() {
                return Err(StompError::RemoteDisconnected);
            }
            info!(attempt = attempt + 1, "STOMP connection attempt");
            let backoff = Duration::from_secs_f64(f64::from(attempt).powi(2));
            if !backoff.is_zero() {
                sleep(backoff).await;
            }

            match TcpStream::connect((self.config.host.as_str(), self.config.port)).await {
                Ok(stream) => {
                    info!("TCP connection established");
                    return Ok(stream);
                }
                Err(err) => {
                    warn!(error = %err, "STOMP connection error, retrying");
                }
            }
        }
        error!(attempts = self.config.max_attempts, "exhausted connection attempts");
        Err(StompError::AttemptsExhausted(self.config.max_attempts))
    }

    async fn handshake<S>(&self, framed: &mut Framed<S, StompCodec>) -> Result<(), StompError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::{SinkExt, StreamExt};

        let heartbeat = format!("{},{}", self.config.heartbeat_ms.0, self.config.heartbeat_ms.1);
        let connect = StompFrame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", self.config.vhost.clone())
            .header("login", self.config.login.clone())
            .header("passcode", self.config.passcode.clone())
            .header("heart-beat", heartbeat)
            .header("client-id", self.config.login.clone());
        framed.send(connect).await?;

        match framed.next().await {
            Some(Ok(StompEvent::Frame(frame))) if frame.command == "CONNECTED" => {
                debug!("STOMP handshake succeeded");
                Ok(())
            }
            Some(Ok(StompEvent::Frame(frame))) => Err(StompError::HandshakeFailed(format!(
                "unexpected frame {}",
                frame.command
            ))),
            Some(Ok(StompEvent::Heartbeat)) => {
                Err(StompError::HandshakeFailed("heartbeat before CONNECTED".into()))
            }
            Some(Err(err)) => Err(err),
            None => Err(StompError::RemoteDisconnected),
        }
    }

    async fn subscribe<S>(&self, framed: &mut Framed<S, StompCodec>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::SinkExt;

        for subscription in &self.subscriptions {
            let frame = StompFrame::new("SUBSCRIBE")
                .header("destination", subscription.topic.clone())
                .header("id", subscription.durable.clone())
                .header("ack", "client-individual")
                .header("activemq.subscriptionName", subscription.durable.clone());
            if let Err(err) = framed.send(frame).await {
                warn!(error = %err, durable = %subscription.durable, "STOMP subscription error");
                continue;
            }
            info!(durable = %subscription.durable, "subscribed to feed");
        }
    }

    async fn unsubscribe<S>(&self, framed: &mut Framed<S, StompCodec>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::SinkExt;

        for subscription in &self.subscriptions {
            let frame = StompFrame::new("UNSUBSCRIBE").header("id", subscription.durable.clone());
            if let Err(err) = framed.send(frame).await {
                warn!(error = %err, durable = %subscription.durable, "STOMP unsubscribe error");
            } else {
                info!(durable = %subscription.durable, "unsubscribed from feed");
            }
        }
    }

    async fn teardown<S>(&self, framed: &mut Framed<S, StompCodec>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::SinkExt;

        self.unsubscribe(framed).await;
        let _ = framed.send(StompFrame::new("DISCONNECT")).await;
        info!("disconnected from STOMP server");
    }

    async fn serve<S>(
        &self,
        framed: &mut Framed<S, StompCodec>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> ServeOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::StreamExt;

        let heartbeat_window =
            Duration::from_millis(u64::from(self.config.heartbeat_ms.1).saturating_mul(3) / 2);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return ServeOutcome::ShuttingDown;
                    }
                }
                frame = tokio::time::timeout(heartbeat_window, framed.next()) => {
                    match frame {
                        Ok(Some(Ok(StompEvent::Heartbeat))) => {}
                        Ok(Some(Ok(StompEvent::Frame(frame)))) => {
                            self.dispatch(framed, frame).await;
                        }
                        Ok(Some(Err(err))) => {
                            self.callbacks.on_error(&err.to_string()).await;
                            return ServeOutcome::Recover;
                        }
                        Ok(None) => {
                            self.callbacks.on_disconnected().await;
                            return ServeOutcome::Recover;
                        }
                        Err(_elapsed) => {
                            self.callbacks.on_heartbeat_timeout().await;
                            return ServeOutcome::Recover;
                        }
                    }
                }
            }
        }
    }

    async fn dispatch<S>(&self, framed: &mut Framed<S, StompCodec>, frame: StompFrame)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        use futures_util::SinkExt;

        match frame.command.as_str() {
            "MESSAGE" => {
                let destination = frame.get("destination").unwrap_or_default().to_owned();
                if let (Some(message_id), Some(subscription)) =
                    (frame.get("message-id"), frame.get("subscription"))
                {
                    let ack = StompFrame::new("ACK")
                        .header("id", message_id.to_owned())
                        .header("subscription", subscription.to_owned());
                    let _ = framed.send(ack).await;
                }
                self.callbacks.on_message(&destination, &frame.body).await;
            }
            "ERROR" => {
                let message = String::from_utf8_lossy(&frame.body).into_owned();
                self.callbacks.on_error(&message).await;
            }
            "RECEIPT" => {}
            other => {
                debug!(command = other, "ignoring unhandled STOMP frame");
            }
        }
    }
}

enum ServeOutcome {
    ShuttingDown,
    Recover,
}
