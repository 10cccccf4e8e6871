//! WebSocket Server Module
//!
//! Operator endpoint built on `picoserve`. Stick updates are written straight
//! into `OPERATOR_INPUT` (latest value wins, polled by the drive command);
//! lifecycle requests are queued on `CONTROL_CHANNEL` for the system
//! controller. When the socket goes away the sticks return to neutral so the
//! drive ramps down instead of holding the last command.

use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::{
    io::embedded_io_async as embedded_aio,
    response::ws::{Message, ReadMessageError, SocketRx, SocketTx, WebSocketCallback, WebSocketUpgrade},
    Router,
};

use crate::utils::controllers::{
    publish_sticks, release_sticks, LifecycleCommand, Sticks, SystemCommand, CONTROL_CHANNEL,
};

pub struct OperatorSocket;

/// Route an operator message. Returns the acknowledgement to send, if any;
/// stick updates arrive every cycle and are not acknowledged.
pub async fn dispatch(command: SystemCommand) -> Option<&'static str> {
    match command {
        SystemCommand::Sticks { a, b } => {
            publish_sticks(Sticks { a, b });
            None
        }
        SystemCommand::Enable => {
            CONTROL_CHANNEL.send(LifecycleCommand::Enable).await;
            Some("enable forwarded")
        }
        SystemCommand::Disable => {
            CONTROL_CHANNEL.send(LifecycleCommand::Disable).await;
            Some("disable forwarded")
        }
        SystemCommand::Mode { mode, ramped } => {
            CONTROL_CHANNEL
                .send(LifecycleCommand::Mode { mode, ramped })
                .await;
            Some("mode forwarded")
        }
    }
}

/// Handles incoming WebSocket connections.
impl WebSocketCallback for OperatorSocket {
    async fn run<Reader, Writer>(
        self,
        mut rx: SocketRx<Reader>,
        mut tx: SocketTx<Writer>,
    ) -> Result<(), Writer::Error>
    where
        Reader: embedded_aio::Read,
        Writer: embedded_aio::Write<Error = Reader::Error>,
    {
        let mut buffer = [0; 1024];

        tx.send_text("Connected").await?;

        let close_reason = loop {
            match rx.next_message(&mut buffer).await {
                Ok(Message::Pong(_)) => continue,
                Ok(Message::Ping(data)) => tx.send_pong(data).await?,
                Ok(Message::Close(reason)) => {
                    tracing::info!(?reason, "websocket closed");
                    break None;
                }
                Ok(Message::Text(data)) => match serde_json::from_str::<SystemCommand>(data) {
                    Ok(command) => {
                        if let Some(ack) = dispatch(command).await {
                            tx.send_text(ack).await?;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(?error, "error deserializing SystemCommand");
                        tx.send_text("Invalid command format").await?
                    }
                },
                Ok(Message::Binary(data)) => match serde_json::from_slice::<SystemCommand>(data) {
                    Ok(command) => {
                        if let Some(ack) = dispatch(command).await {
                            tx.send_binary(ack.as_bytes()).await?;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(?error, "error deserializing incoming message");
                        tx.send_binary(b"Invalid command format").await?
                    }
                },
                Err(error) => {
                    tracing::error!(?error, "websocket error");
                    let code = match error {
                        ReadMessageError::TextIsNotUtf8 => 1007,
                        ReadMessageError::ReservedOpcode(_) => 1003,
                        ReadMessageError::ReadFrameError(_)
                        | ReadMessageError::UnexpectedMessageStart
                        | ReadMessageError::MessageStartsWithContinuation => 1002,
                        ReadMessageError::Io(err) => {
                            release_sticks();
                            return Err(err);
                        }
                    };
                    break Some((code, "Websocket Error"));
                }
            };
        };

        release_sticks();
        tx.close(close_reason).await
    }
}

/// Creates WS Server
pub async fn run(
    id: usize,
    port: u16,
    stack: Stack<'static>,
    config: Option<&'static picoserve::Config<Duration>>,
) -> ! {
    let default_config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        persistent_start_read_request: None,
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(5)),
    });

    let config = config.unwrap_or(&default_config);

    let router = Router::new()
        .route(
            "/",
            picoserve::routing::get(|| async { "rdc operator endpoint, connect to /ws" }),
        )
        .route(
            "/ws",
            picoserve::routing::get(|upgrade: WebSocketUpgrade| async move {
                tracing::info!("new operator connection");
                upgrade.on_upgrade(OperatorSocket).with_protocol("messages")
            }),
        );

    if let Some(ip_cfg) = stack.config_v4() {
        tracing::info!("Starting server at {}:{}", ip_cfg.address, port);
    } else {
        tracing::warn!(
            "Starting WebSocket server on port {port}, but no IPv4 address is assigned yet!"
        );
    }

    let (mut rx_buffer, mut tx_buffer, mut http_buffer) = ([0; 1024], [0; 1024], [0; 4096]);

    picoserve::listen_and_serve_with_state(
        id,
        &router,
        config,
        stack,
        port,
        &mut rx_buffer,
        &mut tx_buffer,
        &mut http_buffer,
        &(),
    )
    .await
}
