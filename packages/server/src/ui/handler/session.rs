//! Per-connection session handler.
//!
//! One session owns one byte stream. Inbound frames are read in this task and
//! drive the authentication state machine; outbound frames are queued on the
//! session's unbounded outbox by anyone holding its `SessionHandle` and written
//! by `pusher_loop`, which runs inside the same task so that aborting the task
//! drops the whole connection.
//!
//! ```text
//! Unauthenticated --AUTH ok--> Authenticated --LOGOUT / EOF / error--> Closed
//!        |                                                              ^
//!        +-------------------- EOF / error -----------------------------+
//! ```

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{sink::SinkExt, stream::StreamExt};
use hiroma_shared::protocol::{Message, MessageCodec, MessageKind, reasons};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::Instrument;

use crate::{
    domain::{RateLimiter, SessionId, Username},
    infrastructure::{SessionHandle, session_handle::Outbox},
    ui::state::AppState,
    usecase::{AuthError, PublishError, RegisterError},
};

/// Upper bound for flushing queued frames once the session is over
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Authentication state of a session
enum SessionState {
    Unauthenticated,
    Authenticated {
        username: Username,
        limiter: RateLimiter,
    },
    Closed,
}

/// Whether the read loop keeps going after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Serve one connection until the peer leaves, logs out or the transport fails.
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, state: Arc<AppState>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let span = tracing::info_span!("session", %peer);
    run_session(stream, state).instrument(span).await
}

async fn run_session<S>(stream: S, state: Arc<AppState>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut frames = FramedRead::new(reader, MessageCodec::new());
    let sink = FramedWrite::new(writer, MessageCodec::new());

    let (handle, outbox) = SessionHandle::channel(SessionId::generate());
    let mut session = Session::new(handle, state);
    tracing::debug!("Session {} started", session.id());

    let writer = pusher_loop(outbox, sink);
    tokio::pin!(writer);
    let mut writer_done = false;

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Ok(message))) => {
                    if session.on_message(message).await == Flow::Close {
                        break;
                    }
                }
                Some(Ok(Err(e))) => {
                    tracing::warn!("Malformed frame: {}", e);
                    session.reply(Message::error(reasons::MALFORMED_FRAME));
                }
                Some(Err(e)) => {
                    tracing::info!("Read failed: {}", e);
                    break;
                }
                None => {
                    tracing::info!("Connection closed by peer");
                    break;
                }
            },
            _ = &mut writer, if !writer_done => {
                writer_done = true;
                tracing::info!("Write side closed");
                break;
            }
        }
    }

    session.close().await;
    // Every handle is gone now, so the writer drains what is queued and stops.
    drop(session);
    if !writer_done
        && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
            .await
            .is_err()
    {
        tracing::warn!("Gave up flushing queued frames");
    }
    tracing::debug!("Session finished");
}

/// Write queued frames to the socket until the outbox closes or a write fails.
async fn pusher_loop<W>(mut outbox: Outbox, mut sink: FramedWrite<W, MessageCodec>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbox.recv().await {
        if let Err(e) = sink.send(message).await {
            tracing::info!("Write failed: {}", e);
            return;
        }
    }
    if let Err(e) = sink.get_mut().shutdown().await {
        tracing::debug!("Shutdown of write side failed: {}", e);
    }
}

/// State machine of one connection
struct Session {
    handle: SessionHandle,
    state: SessionState,
    app: Arc<AppState>,
}

impl Session {
    fn new(handle: SessionHandle, app: Arc<AppState>) -> Self {
        Self {
            handle,
            state: SessionState::Unauthenticated,
            app,
        }
    }

    fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// Queue a frame for this session only
    fn reply(&self, message: Message) {
        if let Err(e) = self.handle.push(message) {
            tracing::debug!("Dropped reply: {}", e);
        }
    }

    async fn on_message(&mut self, message: Message) -> Flow {
        match self.state {
            SessionState::Closed => Flow::Close,
            SessionState::Unauthenticated => self.on_unauthenticated(message).await,
            SessionState::Authenticated { .. } => self.on_authenticated(message).await,
        }
    }

    async fn on_unauthenticated(&mut self, message: Message) -> Flow {
        match message.kind {
            MessageKind::Auth => {
                let (login, password) = message.credentials();
                match self
                    .app
                    .authenticate_usecase
                    .execute(login, password, self.handle.clone())
                    .await
                {
                    Ok(username) => {
                        tracing::info!("Authenticated as '{}'", username);
                        self.state = SessionState::Authenticated {
                            username,
                            limiter: RateLimiter::new(self.app.min_message_interval),
                        };
                    }
                    Err(AuthError::InvalidCredentials) => {
                        self.reply(Message::error(reasons::INVALID_CREDENTIALS));
                    }
                    Err(AuthError::AlreadyOnline(_)) => {
                        self.reply(Message::error(reasons::USER_ALREADY_ONLINE));
                    }
                    Err(AuthError::Store(e)) => {
                        tracing::error!("User store failed during authentication: {}", e);
                        self.reply(Message::error(reasons::INTERNAL_ERROR));
                    }
                }
            }
            MessageKind::Register => {
                let (login, password) = message.credentials();
                match self.app.register_usecase.execute(login, password).await {
                    Ok(()) => self.reply(Message::server(
                        MessageKind::RegOk,
                        reasons::REGISTRATION_SUCCESSFUL,
                    )),
                    Err(RegisterError::Invalid(reason)) => self.reply(Message::error(reason)),
                    Err(RegisterError::LoginTaken) => {
                        self.reply(Message::error(reasons::LOGIN_ALREADY_TAKEN));
                    }
                    Err(RegisterError::Store(e)) => {
                        tracing::error!("User store failed during registration: {}", e);
                        self.reply(Message::error(reasons::INTERNAL_ERROR));
                    }
                }
            }
            kind => {
                tracing::debug!("Rejected {:?} before authentication", kind);
                self.reply(Message::error(reasons::AUTHENTICATION_REQUIRED));
            }
        }
        Flow::Continue
    }

    async fn on_authenticated(&mut self, message: Message) -> Flow {
        let SessionState::Authenticated { username, limiter } = &mut self.state else {
            return Flow::Close;
        };

        match message.kind {
            MessageKind::PublicMessage => {
                let result = self
                    .app
                    .send_message_usecase
                    .execute(username, &message.body, limiter)
                    .await;
                match result {
                    Ok(()) => {}
                    Err(PublishError::RateLimited { .. }) => {
                        self.reply(Message::error(reasons::RATE_LIMITED));
                    }
                    Err(PublishError::TooLarge(e)) => {
                        tracing::warn!("Dropped oversized message: {}", e);
                        self.reply(Message::error(reasons::MESSAGE_TOO_LARGE));
                    }
                }
                Flow::Continue
            }
            MessageKind::Logout => {
                tracing::info!("'{}' logged out", username);
                self.reply(Message::server(MessageKind::LogoutOk, reasons::LOGOUT));
                Flow::Close
            }
            kind => {
                tracing::debug!("Ignored {:?} from '{}'", kind, username);
                Flow::Continue
            }
        }
    }

    /// Leave the registry if authenticated. Safe to call more than once.
    async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Closed);
        if let SessionState::Authenticated { username, .. } = state {
            self.app
                .disconnect_usecase
                .execute(&username, self.handle.id())
                .await;
        }
    }
}
