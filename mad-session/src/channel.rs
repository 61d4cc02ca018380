use std::sync::mpsc;

/// An error returned when a message cannot be delivered to the peer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection has not received a channel yet.
    #[error("connection is not bound to a channel")]
    Unbound,
    /// The connection was closed after a stream failure.
    #[error("connection is closed")]
    Closed,
    /// The receiving end of the channel is gone.
    #[error("channel disconnected")]
    Disconnected,
    /// The outgoing message could not be serialized to JSON.
    #[error("failed to serialize message")]
    Serialize(#[source] serde_json::Error),
}

/// The sending half of a persistent connection to a peer.
///
/// Channels accept complete text frames. Framing and transport are up to the implementation.
pub trait Channel {
    /// Sends a single text frame to the peer.
    fn send_text(&mut self, frame: String) -> Result<(), SessionError>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send_text(&mut self, frame: String) -> Result<(), SessionError> {
        (**self).send_text(frame)
    }
}

/// Collects frames in memory.
impl Channel for Vec<String> {
    fn send_text(&mut self, frame: String) -> Result<(), SessionError> {
        self.push(frame);
        Ok(())
    }
}

/// Forwards frames to a receiver, such as the task owning the socket.
impl Channel for mpsc::Sender<String> {
    fn send_text(&mut self, frame: String) -> Result<(), SessionError> {
        self.send(frame).map_err(|_| SessionError::Disconnected)
    }
}
