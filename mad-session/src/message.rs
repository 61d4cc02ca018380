use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Channel;

/// A named command with an arbitrary JSON payload.
///
/// Commands are exchanged in both directions as text frames of the form
/// `{"command": "...", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Command {
    /// The name of the command.
    pub command: String,
    /// The payload of the command, `null` if absent.
    #[serde(default)]
    pub data: Value,
}

impl Command {
    /// Creates a new command.
    pub fn new(command: impl Into<String>, data: Value) -> Self {
        Self {
            command: command.into(),
            data,
        }
    }
}

/// An inbound event on a [`Connection`](crate::Connection).
pub enum Message {
    /// The socket was materialized and outgoing frames can be sent to this channel.
    Connect {
        /// The sending half of the socket.
        channel: Box<dyn Channel>,
    },
    /// A text frame carrying a [`Command`].
    Command(Command),
    /// A text frame that is not a command.
    Text(String),
    /// The inbound stream failed and the connection must be closed.
    StreamFailure(String),
}

impl Message {
    /// Classifies an inbound text frame.
    ///
    /// Frames that parse as a JSON object with a string `command` field become
    /// [`Message::Command`], everything else is passed on as [`Message::Text`].
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(command) => Self::Command(command),
            Err(_) => Self::Text(text.to_owned()),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { .. } => f.debug_struct("Connect").finish_non_exhaustive(),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::StreamFailure(reason) => f.debug_tuple("StreamFailure").field(reason).finish(),
        }
    }
}

/// Messages queued by a [`MessageHandler`] for delivery to the peer.
///
/// The connection sends queued messages after the handler returns.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Value>,
}

impl Outbox {
    /// Queues a JSON message.
    pub fn send(&mut self, message: Value) {
        self.messages.push(message);
    }

    /// Queues a [`Command`].
    pub fn send_command(&mut self, command: &str, data: Value) {
        self.send(command_frame(command, data));
    }

    /// Returns the number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn into_messages(self) -> Vec<Value> {
        self.messages
    }
}

pub(crate) fn command_frame(command: &str, data: Value) -> Value {
    serde_json::json!({
        "command": command,
        "data": data,
    })
}

/// Processes messages received on a [`Connection`](crate::Connection).
pub trait MessageHandler {
    /// Handles a message and returns `true` if the message was claimed.
    ///
    /// Only the first handler claiming a message sees it. Replies are queued on the `outbox`.
    fn handle(&mut self, message: &Message, outbox: &mut Outbox) -> bool;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_from_text_command() {
        let message = Message::from_text(r#"{"command":"subscribe","data":{"metric":"cpu"}}"#);
        let Message::Command(command) = message else {
            panic!("expected a command");
        };
        assert_eq!(command, Command::new("subscribe", json!({"metric": "cpu"})));
    }

    #[test]
    fn test_from_text_without_data() {
        let message = Message::from_text(r#"{"command":"heartbeat"}"#);
        assert!(matches!(message, Message::Command(c) if c.data.is_null()));
    }

    #[test]
    fn test_from_text_other() {
        for text in ["hello", r#"{"data":{}}"#, r#"{"command":42}"#, "[1,2]"] {
            assert!(matches!(Message::from_text(text), Message::Text(_)), "{text}");
        }
    }

    #[test]
    fn test_debug_hides_channel() {
        let message = Message::Connect {
            channel: Box::new(Vec::<String>::new()),
        };
        assert_eq!(format!("{message:?}"), "Connect { .. }");
    }

    #[test]
    fn test_outbox_command() {
        let mut outbox = Outbox::default();
        outbox.send_command("pong", json!({"seq": 1}));
        assert_eq!(outbox.len(), 1);
        assert_eq!(
            outbox.into_messages(),
            vec![json!({"command": "pong", "data": {"seq": 1}})]
        );
    }
}
