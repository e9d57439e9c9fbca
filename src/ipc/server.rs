//! Unix domain socket server for IPC
//!
//! Serves record requests directly from the store, queues voice input for
//! the controller, and pushes controller events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::ControllerEvent;
use crate::state::ControllerInput;
use crate::store::{RecordStore, StoreError, DEFAULT_RECENT_LIMIT};

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// Largest accepted message body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Handles shared by every client connection
#[derive(Clone)]
pub struct ServerContext {
    /// Queue feeding the voice controller
    pub input_tx: mpsc::Sender<ControllerInput>,
    pub store: Arc<dyn RecordStore>,
    /// Source of notifications for subscribed clients
    pub event_tx: broadcast::Sender<ControllerEvent>,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    context: ServerContext,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

impl ServerState {
    fn new(status: DaemonStatus) -> Self {
        Self {
            status,
            start_time: std::time::Instant::now(),
        }
    }
}

impl Server {
    /// Create a new IPC server
    pub fn new(socket_path: &Path, context: ServerContext, status: DaemonStatus) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state: Arc::new(RwLock::new(ServerState::new(status))),
            context,
            shutdown_tx,
        })
    }

    /// Fold a controller event into the status reported to clients
    pub async fn apply_event(&self, event: &ControllerEvent) {
        let mut server_state = self.state.write().await;
        let old_view = server_state.status.view;
        server_state.status.apply(event);

        if old_view != server_state.status.view {
            info!(
                from = %old_view,
                to = %server_state.status.view,
                "IPC server: view updated"
            );
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let context = self.context.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, context, state) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection.
    ///
    /// Requests are read on a separate task so that pushing a notification
    /// never interrupts a half-read frame.
    async fn handle_client(
        stream: UnixStream,
        context: ServerContext,
        state: Arc<RwLock<ServerState>>,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (request_tx, mut request_rx) = mpsc::channel::<Result<Request, String>>(16);

        let reader_task = tokio::spawn(async move {
            if let Err(e) = Self::read_requests(&mut reader, request_tx).await {
                warn!(?e, "client read error");
            }
        });

        let mut events: Option<broadcast::Receiver<ControllerEvent>> = None;

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        debug!("client disconnected");
                        break Ok(());
                    };

                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            if request == Request::Subscribe && events.is_none() {
                                events = Some(context.event_tx.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            Self::process_request(request, &context, &state).await
                        }
                        Err(message) => Response::error("invalid_request", message),
                    };

                    if let Err(e) = Self::send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = Self::next_event(&mut events) => match event {
                    Ok(event) => {
                        let note = Notification::Event { event };
                        if let Err(e) = Self::send_message(&mut writer, &note).await {
                            break Err(e);
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "client notification receiver lagged");
                    }
                    Err(RecvError::Closed) => {
                        events = None;
                    }
                },
            }
        };

        reader_task.abort();
        result
    }

    /// Wait for the next event, or forever when the client is not subscribed
    async fn next_event(
        events: &mut Option<broadcast::Receiver<ControllerEvent>>,
    ) -> Result<ControllerEvent, RecvError> {
        match events {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Read framed requests until the client disconnects
    async fn read_requests<R>(
        reader: &mut R,
        request_tx: mpsc::Sender<Result<Request, String>>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        while let Some(body) = Self::read_frame(reader).await? {
            let request = serde_json::from_slice::<Request>(&body)
                .map_err(|e| format!("failed to parse request: {}", e));

            if request_tx.send(request).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Read one length-prefixed message body. `None` on clean disconnect.
    async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
    where
        R: AsyncRead + Unpin,
    {
        // Read message length (4-byte little-endian)
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_LEN {
            warn!(len, "message too large, disconnecting");
            return Ok(None);
        }

        // Read message body
        let mut msg_buf = vec![0u8; len];
        reader.read_exact(&mut msg_buf).await?;
        Ok(Some(msg_buf))
    }

    /// Send a length-prefixed JSON message
    async fn send_message<W, T>(stream: &mut W, msg: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        T: serde::Serialize,
    {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        context: &ServerContext,
        state: &Arc<RwLock<ServerState>>,
    ) -> Response {
        let request = match request.into_controller_input() {
            Ok(input) => {
                return match context.input_tx.send(input).await {
                    Ok(()) => Response::Accepted,
                    Err(_) => Response::error("unavailable", "voice controller is not running"),
                };
            }
            Err(request) => request,
        };

        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Subscribe => Response::Subscribed,

            Request::AddRecord { kind, record } => {
                store_response(context.store.create(kind, record).await.map(Response::Record))
            }

            Request::ListRecords { kind } => store_response(
                context
                    .store
                    .list(kind)
                    .await
                    .map(|records| Response::Records { records }),
            ),

            Request::DeleteRecord { kind, id } => store_response(
                context
                    .store
                    .delete(kind, &id)
                    .await
                    .map(|()| Response::Deleted { id }),
            ),

            Request::GetTotals => {
                store_response(context.store.totals().await.map(Response::Totals))
            }

            Request::RecentTransactions { limit } => store_response(
                context
                    .store
                    .recent(limit.unwrap_or(DEFAULT_RECENT_LIMIT))
                    .await
                    .map(|entries| Response::Transactions { entries }),
            ),

            other => Response::error("invalid_request", format!("unsupported request {:?}", other)),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

fn store_response(result: Result<Response, StoreError>) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "store request failed");
            Response::error(e.code(), e.to_string())
        }
    }
}
