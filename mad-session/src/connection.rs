use std::fmt;

use mad_log::LogError;
use serde::Serialize;
use serde_json::Value;

use crate::message::command_frame;
use crate::{Channel, Message, MessageHandler, Outbox, SessionError};

/// The lifecycle of a [`Connection`].
#[derive(Default)]
pub enum ConnectionState {
    /// No channel has been materialized yet. Messages other than [`Message::Connect`] are
    /// rejected.
    #[default]
    Unbound,
    /// Messages are dispatched to the handlers and replies go to the channel.
    Bound(Box<dyn Channel>),
    /// The inbound stream failed. All further messages are rejected.
    Closed,
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => f.write_str("Unbound"),
            Self::Bound(_) => f.write_str("Bound"),
            Self::Closed => f.write_str("Closed"),
        }
    }
}

/// The outcome of [`Connection::dispatch`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dispatch {
    /// The connection was bound to a new channel.
    Bound,
    /// The connection was closed.
    Closed,
    /// A handler claimed the message.
    Handled,
    /// No handler claimed the message.
    Unhandled,
    /// The message arrived while the connection was not bound and was dropped.
    Rejected,
}

/// Counters of messages that no handler claimed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectionStats {
    /// All unclaimed messages, including commands.
    pub unknown: u64,
    /// Unclaimed commands.
    pub unknown_command: u64,
}

/// A persistent connection dispatching inbound messages through an ordered handler chain.
pub struct Connection {
    state: ConnectionState,
    handlers: Vec<Box<dyn MessageHandler>>,
    stats: ConnectionStats,
}

impl Connection {
    /// Creates an unbound connection with the given handlers.
    ///
    /// Handlers are consulted in order. The first handler to claim a message wins.
    pub fn new(handlers: Vec<Box<dyn MessageHandler>>) -> Self {
        Self {
            state: ConnectionState::Unbound,
            handlers,
            stats: ConnectionStats::default(),
        }
    }

    /// Returns the current state of the connection.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Returns `true` if the connection has a channel.
    pub fn is_bound(&self) -> bool {
        matches!(self.state, ConnectionState::Bound(_))
    }

    /// Returns the counters of unclaimed messages.
    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Processes an inbound message.
    pub fn dispatch(&mut self, message: Message) -> Dispatch {
        mad_log::trace!(?message, state = ?self.state, "received message");

        match message {
            Message::StreamFailure(reason) => {
                mad_log::info!(reason = %reason, "closing stream");
                self.state = ConnectionState::Closed;
                Dispatch::Closed
            }
            message if matches!(self.state, ConnectionState::Closed) => {
                mad_log::warn!(
                    reason = "connection closed",
                    ?message,
                    "unable to process message"
                );
                Dispatch::Rejected
            }
            Message::Connect { channel } => {
                self.state = ConnectionState::Bound(channel);
                Dispatch::Bound
            }
            message if !self.is_bound() => {
                mad_log::warn!(
                    reason = "channel not materialized",
                    ?message,
                    "unable to process message"
                );
                Dispatch::Rejected
            }
            message => self.handle_message(message),
        }
    }

    fn handle_message(&mut self, message: Message) -> Dispatch {
        let mut outbox = Outbox::default();
        let handled = self
            .handlers
            .iter_mut()
            .any(|handler| handler.handle(&message, &mut outbox));

        for reply in outbox.into_messages() {
            // Serialization failures are logged by `send`.
            if let Err(SessionError::Disconnected) = self.send(&reply) {
                mad_log::warn!("dropping reply: channel disconnected");
            }
        }

        if handled {
            return Dispatch::Handled;
        }

        self.stats.unknown += 1;
        if let Message::Command(_) = message {
            self.stats.unknown_command += 1;
            mad_log::warn!(
                reason = "unsupported command",
                ?message,
                "unable to process message"
            );
        } else {
            mad_log::warn!(
                reason = "unsupported message",
                ?message,
                "unable to process message"
            );
        }

        Dispatch::Unhandled
    }

    /// Serializes a message to JSON and sends it to the peer as a text frame.
    ///
    /// If serialization fails, the failure is logged and the frame is dropped. The connection
    /// remains usable.
    pub fn send<T: Serialize + ?Sized>(&mut self, message: &T) -> Result<(), SessionError> {
        let channel = match &mut self.state {
            ConnectionState::Bound(channel) => channel,
            ConnectionState::Unbound => return Err(SessionError::Unbound),
            ConnectionState::Closed => return Err(SessionError::Closed),
        };

        let frame = serde_json::to_string(message).map_err(|error| {
            mad_log::error!(
                reason = "serialization exception",
                "unable to send message: {}",
                LogError(&error)
            );
            SessionError::Serialize(error)
        })?;

        channel.send_text(frame)
    }

    /// Sends a [`Command`](crate::Command) with the given name and payload to the peer.
    pub fn send_command(&mut self, command: &str, data: Value) -> Result<(), SessionError> {
        self.send(&command_frame(command, data))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("handlers", &self.handlers.len())
            .field("stats", &self.stats)
            .finish()
    }
}
