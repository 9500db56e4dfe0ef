// Real-time listener: a Socket.IO client printing the message events the
// chat server pushes. Transport, handshake and keepalive are handled by
// `rust_socketio`; this module only maps event names onto a typed dispatch
// table. Handlers run on the client's polling thread, so their output may
// interleave with the prompt.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use rust_socketio::client::Client;
use rust_socketio::{ClientBuilder, Event, Payload, RawClient, TransportType};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::EventMessage;

#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    SocketIo(#[from] rust_socketio::Error),

    #[error("connect attempt aborted")]
    Aborted,
}

/// Event kinds the chat server pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMessage,
    UpdateMessage,
    DeleteMessage,
}

impl EventKind {
    pub const ALL: [EventKind; 3] =
        [EventKind::NewMessage, EventKind::UpdateMessage, EventKind::DeleteMessage];

    /// Event name on the wire.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::NewMessage => "new_message",
            EventKind::UpdateMessage => "update_message",
            EventKind::DeleteMessage => "delete_message",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn tag(self) -> &'static str {
        match self {
            EventKind::NewMessage => "NEW",
            EventKind::UpdateMessage => "UPDATE",
            EventKind::DeleteMessage => "DELETE",
        }
    }

    /// One-line summary printed by the default handlers, e.g. `NEW: hello`.
    pub fn summary(self, msg: &EventMessage) -> String {
        format!("{}: {}", self.tag(), msg.text)
    }
}

pub type Handler = Box<dyn Fn(&EventMessage) + Send + Sync>;
pub type ConnectHandler = Box<dyn Fn() + Send + Sync>;

/// Dispatch table from event kind to handler.
#[derive(Default)]
pub struct EventHandlers {
    handlers: HashMap<EventKind, Handler>,
    on_connect: Option<ConnectHandler>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the summary of every event, and announce the connection.
    pub fn printing() -> Self {
        let mut handlers = Self::new();
        for kind in EventKind::ALL {
            handlers.on(kind, move |msg| println!("{}", kind.summary(msg)));
        }
        handlers.on_connect(|| println!("Connected to server via WebSocket"));
        handlers
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&EventMessage) + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn on_connect<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connect = Some(Box::new(handler));
        self
    }

    /// Run the handler for `kind`. Returns false when none is registered.
    pub fn dispatch(&self, kind: EventKind, msg: &EventMessage) -> bool {
        match self.handlers.get(&kind) {
            Some(handler) => {
                handler(msg);
                true
            }
            None => false,
        }
    }

    fn connected(&self) {
        if let Some(handler) = &self.on_connect {
            handler();
        }
    }

    /// Route one event payload. Unknown events and payloads without a
    /// `text` field are logged and dropped.
    pub fn handle_event(&self, name: &str, args: Vec<serde_json::Value>) {
        let Some(kind) = EventKind::from_name(name) else {
            debug!(event = name, "ignoring unknown event");
            return;
        };
        let Some(payload) = args.into_iter().next() else {
            warn!(event = name, "event without payload");
            return;
        };
        match serde_json::from_value::<EventMessage>(payload) {
            Ok(msg) => {
                self.dispatch(kind, &msg);
            }
            Err(e) => warn!(event = name, error = %e, "event payload is not a message"),
        }
    }
}

fn payload_args(payload: Payload) -> Vec<serde_json::Value> {
    match payload {
        Payload::Text(args) => args,
        _ => Vec::new(),
    }
}

/// Cloneable handle that can stop the listener from anywhere, including a
/// signal handler.
#[derive(Clone)]
pub struct ListenerHandle {
    client: Client,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl ListenerHandle {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Disconnect from the server. Calling this more than once is harmless.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.connected.store(false, Ordering::SeqCst);
        if let Err(e) = self.client.disconnect() {
            warn!(error = %e, "realtime disconnect failed");
        }
        info!("realtime connection closed");
    }
}

/// Connected Socket.IO listener.
pub struct Listener {
    handle: ListenerHandle,
}

impl Listener {
    /// Connect to the server's Socket.IO endpoint and start dispatching
    /// events to `handlers`. Gives up after `timeout`.
    pub fn connect(
        base_url: &str,
        timeout: Duration,
        handlers: EventHandlers,
    ) -> Result<Self, RealtimeError> {
        let handlers = Arc::new(handlers);
        let connected = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let mut builder = ClientBuilder::new(base_url)
            .transport_type(TransportType::Websocket)
            .reconnect(false);
        for kind in EventKind::ALL {
            let handlers = handlers.clone();
            builder = builder.on(kind.name(), move |payload: Payload, _: RawClient| {
                handlers.handle_event(kind.name(), payload_args(payload));
            });
        }
        let on_connect = handlers.clone();
        let up = connected.clone();
        builder = builder.on(Event::Connect, move |_: Payload, _: RawClient| {
            up.store(true, Ordering::SeqCst);
            on_connect.connected();
        });
        let down = connected.clone();
        builder = builder.on(Event::Close, move |_: Payload, _: RawClient| {
            down.store(false, Ordering::SeqCst);
            info!("realtime connection closed by server");
        });
        builder = builder.on(Event::Error, |payload: Payload, _: RawClient| {
            warn!(?payload, "realtime error");
        });

        debug!(url = base_url, "connecting realtime listener");
        // The client has no connect timeout of its own.
        thread::spawn(move || {
            if let Err(mpsc::SendError(Ok(late))) = tx.send(builder.connect()) {
                let _ = late.disconnect();
            }
        });
        let client = match rx.recv_timeout(timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(RealtimeError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(RealtimeError::Aborted),
        };

        Ok(Listener {
            handle: ListenerHandle {
                client,
                connected,
                closed: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    pub fn handle(&self) -> ListenerHandle {
        self.handle.clone()
    }

    /// True once the server acknowledged the connection and until either
    /// side closes it.
    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    pub fn close(self) {
        self.handle.close();
    }
}
