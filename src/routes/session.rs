//! Session transport binding: the thin Rocket/WebSocket layer that pumps
//! real socket frames through the pure session state machine in
//! `crate::session`. Grounded on the teacher's route-module decomposition;
//! the `SessionHandle` seam (`crate::transport`) is what keeps everything
//! upstream of this file unit-testable without a live socket.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use rocket::{get, State};
use rocket_ws::frame::{CloseCode, CloseFrame};
use rocket_ws::{Message, WebSocket};
use tokio::sync::mpsc;

use crate::close_cause::CloseCause;
use crate::session::{classify, dispatch_command, on_session_close, open_session, parse_frame, SessionOpenError};
use crate::state::AppState;
use crate::transport::{SessionHandle, WsCommand, WsSessionHandle};

use super::{version_matches, ClientIp};

fn close_frame(cause: CloseCause) -> CloseFrame<'static> {
    CloseFrame { code: CloseCode::from(cause.code()), reason: cause.to_string().into() }
}

#[get("/<version>/session?<code>&<name>&<su>")]
pub fn connect(
    version: String,
    code: String,
    name: Option<String>,
    su: Option<String>,
    ip: ClientIp,
    ws: WebSocket,
    state: &State<Arc<AppState>>,
) -> rocket_ws::Channel<'static> {
    let app = state.inner().clone();
    let remote_address = ip.0;

    ws.channel(move |mut stream| {
        Box::pin(async move {
            if !version_matches(&version) {
                let _ = stream.close(Some(close_frame(CloseCause::BreakingApiChange))).await;
                return Ok(());
            }

            let intent = classify(name.as_deref(), su.as_deref());

            let (tx, mut rx) = mpsc::unbounded_channel::<WsCommand>();
            let handle: Arc<dyn SessionHandle> = Arc::new(WsSessionHandle::new(tx));

            let route = match open_session(&app.registry, &code, intent, &remote_address, handle) {
                Ok(route) => route,
                Err(SessionOpenError::Malformed) => {
                    let _ = stream.close(None).await;
                    return Ok(());
                }
                Err(SessionOpenError::Close(cause)) => {
                    let _ = stream.close(Some(close_frame(cause))).await;
                    return Ok(());
                }
            };

            let room = match app.registry.get(&code) {
                Some(room) => room,
                None => return Ok(()),
            };

            loop {
                tokio::select! {
                    outbound = rx.recv() => {
                        match outbound {
                            Some(WsCommand::Text(text)) => {
                                if stream.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Some(WsCommand::Close(cause)) => {
                                let _ = stream.close(Some(close_frame(cause))).await;
                                break;
                            }
                            None => break,
                        }
                    }
                    inbound = stream.next() => {
                        match inbound {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(command) = parse_frame(&text) {
                                    dispatch_command(&room, &route, command);
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                let code = frame.map(|f| u16::from(f.code)).unwrap_or(1000);
                                on_session_close(&room, &route, code);
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(_)) => {
                                on_session_close(&room, &route, 1006);
                                break;
                            }
                            None => {
                                on_session_close(&room, &route, 1006);
                                break;
                            }
                        }
                    }
                }
            }

            Ok(())
        })
    })
}
