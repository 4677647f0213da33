use crate::domain::{Cell, PlayerId};
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{
    ClientMessage, JoinPayload, MatchSnapshotDto, MatchUpdateDto, ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_id;
use crate::use_cases::{MatchCommand, MatchHandle, MatchUpdate, Seat};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    CommandsClosed,
    UpdatesClosed,
    JoinRequired,
    JoinTimeout,
    NotAllowed,
    AlreadyConnected,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct MatchQuery {
    // The match the client wants to join.
    #[serde(default)]
    match_id: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializes each match update once and rebroadcasts the shared bytes.
pub async fn match_update_serializer(
    mut update_rx: broadcast::Receiver<MatchUpdate>,
    update_bytes_tx: broadcast::Sender<Utf8Bytes>,
) {
    loop {
        match update_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::MatchUpdate(MatchUpdateDto::from(update));
                match serde_json::to_string(&msg) {
                    Ok(txt) => {
                        let _ = update_bytes_tx.send(Utf8Bytes::from(txt));
                    }
                    Err(e) => error!(error = ?e, "failed to serialize match update"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // Clients notice the gap themselves and resync from the snapshot.
                warn!(missed = n, "update serializer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("match updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_match_serializer(handle: &MatchHandle) {
    tokio::spawn(match_update_serializer(
        handle.update_tx.subscribe(),
        handle.update_bytes_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQuery>,
) -> impl IntoResponse {
    let match_id = query
        .match_id
        .unwrap_or_else(|| state.default_match_id.to_string());

    let Some(handle) = state.match_registry.get_match(&match_id).await else {
        return error_response(StatusCode::NOT_FOUND, "match not found");
    };

    ws.on_upgrade(move |socket| handle_socket(socket, handle))
}

async fn handle_socket(mut socket: WebSocket, handle: MatchHandle) {
    // Separate connection id for correlating logs before a player_id exists.
    let conn_id = next_id();
    let span = info_span!(
        "conn",
        conn_id,
        match_id = %handle.match_id,
        player_id = tracing::field::Empty
    );
    let _enter = span.enter();

    let mut ctx = match bootstrap_connection(&mut socket, &handle).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = socket.close().await;
            return;
        }
    };

    span.record("player_id", ctx.player_id);
    info!(
        player_id = ctx.player_id,
        display_name = %ctx.display_name,
        spectator = !ctx.can_play,
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    player_id: PlayerId,
    display_name: String,
    handle: MatchHandle,
    update_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    // Spectators receive updates but their commands are ignored.
    can_play: bool,
    _seat: Option<Seat>,
    resync_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,

    last_command_full_log: Instant,
    last_lag_log: Instant,
    last_invalid_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    handle: &MatchHandle,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so no tick slips between snapshot and diffs.
    let update_bytes_rx = handle.update_bytes_tx.subscribe();

    let (join, bytes_in) = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await
    {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let display_name = sanitize_display_name(&join.display_name);
    let player_id = match join.player_id {
        Some(id) => id,
        None if handle.is_open() => next_id(),
        None => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "player id required").await;
            return Err(NetError::NotAllowed);
        }
    };
    let can_play = handle.is_player_allowed(player_id);

    // Held until the connection context drops, after its Leave is queued.
    let seat = if can_play {
        match handle.claim_seat(player_id) {
            Some(seat) => Some(seat),
            None => {
                let reason = "player already connected";
                let _ = send_close_with_reason(socket, close_code::POLICY, reason).await;
                return Err(NetError::AlreadyConnected);
            }
        }
    } else {
        None
    };

    let identity = ServerMessage::Identity {
        player_id: player_id.to_string(),
        spectator: !can_play,
    };
    send_message(socket, &identity).await?;

    if can_play {
        // Join before the initial snapshot so it already includes this player
        // once the loop catches up; the diff covers the gap otherwise.
        handle
            .command_tx
            .send(MatchCommand::Join {
                player_id,
                display_name: display_name.clone(),
            })
            .await
            .map_err(|_| NetError::CommandsClosed)?;
    }

    let snapshot = handle.snapshot_tx.borrow().clone();
    let msg = ServerMessage::MatchSnapshot(MatchSnapshotDto::from(snapshot.as_ref()));
    if let Err(e) = send_message(socket, &msg).await {
        if can_play {
            let _ = handle
                .command_tx
                .send(MatchCommand::Leave { player_id })
                .await;
        }
        return Err(e);
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        display_name,
        handle: handle.clone(),
        update_bytes_rx,
        can_play,
        _seat: seat,
        resync_count: 0,

        msgs_in: 1,
        msgs_out: 2,
        bytes_in,
        bytes_out: 0,
        invalid_json: 0,

        last_command_full_log: now,
        last_lag_log: now,
        last_invalid_log: now,

        close_frame: None,
    })
}

fn sanitize_display_name(raw: &str) -> String {
    let trimmed: String = raw.trim().chars().take(MAX_DISPLAY_NAME_LEN).collect();
    if trimmed.is_empty() {
        "Player".to_string()
    } else {
        trimmed
    }
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<(JoinPayload, u64), NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                return match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => Ok((payload, bytes_in)),
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        Err(NetError::JoinRequired)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        Err(NetError::JoinRequired)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Maps a post-join client message to a match command. `None` means ignore.
fn to_command(player_id: PlayerId, msg: ClientMessage) -> Option<MatchCommand> {
    match msg {
        ClientMessage::Join(_) => None,
        ClientMessage::Move { direction } => Some(MatchCommand::Move {
            player_id,
            direction: direction.into(),
        }),
        ClientMessage::Position { x, y } => Some(MatchCommand::Position {
            player_id,
            cell: Cell::new(x, y),
        }),
        ClientMessage::PlaceBomb => Some(MatchCommand::PlaceBomb { player_id }),
        ClientMessage::StartMatch => Some(MatchCommand::StartMatch),
        ClientMessage::Reset => Some(MatchCommand::Reset),
    }
}

fn forward_command(
    player_id: PlayerId,
    command_tx: &mpsc::Sender<MatchCommand>,
    command: MatchCommand,
    last_command_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match command_tx.try_send(command) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            if should_log(last_command_full_log) {
                warn!(player_id, "command channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::CommandsClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            update = ctx.update_bytes_rx.recv() => {
                match update {
                    Ok(bytes) => matches!(
                        forward_bytes(bytes, socket, ctx).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_lag_log) {
                            warn!(missed = n, "match updates lagged; sending snapshot");
                        }
                        // Missed diffs can't be replayed; resend the whole state.
                        ctx.resync_count += 1;
                        matches!(send_snapshot(socket, ctx).await, LoopControl::Disconnect)
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::UpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        fatal.get_or_insert(e);
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    let msg = match incoming {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!(player_id, "websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    match msg {
        Message::Text(text) => {
            ctx.msgs_in += 1;
            ctx.bytes_in += text.len() as u64;

            let parsed = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(parsed) => parsed,
                Err(parse_err) => {
                    ctx.invalid_json += 1;
                    if should_log(&mut ctx.last_invalid_log) {
                        warn!(
                            player_id,
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to parse client message"
                        );
                    }
                    if ctx.invalid_json > MAX_INVALID_JSON {
                        ctx.close_frame = Some(CloseFrame {
                            code: close_code::POLICY,
                            reason: "too many invalid messages".into(),
                        });
                        return Ok(LoopControl::Disconnect);
                    }
                    return Ok(LoopControl::Continue);
                }
            };

            if !ctx.can_play {
                if should_log(&mut ctx.last_invalid_log) {
                    debug!(player_id, "spectator command ignored");
                }
                return Ok(LoopControl::Continue);
            }

            match to_command(player_id, parsed) {
                Some(command) => forward_command(
                    player_id,
                    &ctx.handle.command_tx,
                    command,
                    &mut ctx.last_command_full_log,
                ),
                None => {
                    if should_log(&mut ctx.last_invalid_log) {
                        warn!(player_id, "duplicate join ignored");
                    }
                    Ok(LoopControl::Continue)
                }
            }
        }
        Message::Binary(_) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            Ok(LoopControl::Disconnect)
        }
        Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
        Message::Close(_) => Ok(LoopControl::Disconnect),
    }
}

async fn forward_bytes(bytes: Utf8Bytes, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let len = bytes.len();
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send match update");
            LoopControl::Disconnect
        }
    }
}

async fn send_snapshot(socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let snapshot = ctx.handle.snapshot_tx.borrow().clone();
    let msg = ServerMessage::MatchSnapshot(MatchSnapshotDto::from(snapshot.as_ref()));
    match send_message(socket, &msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            debug!(
                player_id = ctx.player_id,
                bytes,
                count = ctx.resync_count,
                "sent resync snapshot"
            );
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send snapshot");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    if ctx.can_play {
        ctx.handle
            .command_tx
            .send(MatchCommand::Leave { player_id })
            .await
            .map_err(|_| NetError::CommandsClosed)?;
    }

    debug!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        resync_count = ctx.resync_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
