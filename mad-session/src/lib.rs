//! Message dispatch for persistent push connections.
//!
//! A [`Connection`] sits between a bidirectional socket and an ordered chain of
//! [`MessageHandler`]s. Inbound frames are turned into [`Message`]s and offered to each handler in
//! turn until one claims them. Outbound messages are serialized to JSON text frames and written to
//! the [`Channel`] the connection is bound to.
//!
//! ```
//! use mad_session::{Connection, Message, MessageHandler, Outbox};
//!
//! struct Echo;
//!
//! impl MessageHandler for Echo {
//!     fn handle(&mut self, message: &Message, outbox: &mut Outbox) -> bool {
//!         match message {
//!             Message::Command(command) => {
//!                 outbox.send_command(&command.command, command.data.clone());
//!                 true
//!             }
//!             _ => false,
//!         }
//!     }
//! }
//!
//! let mut connection = Connection::new(vec![Box::new(Echo)]);
//! connection.dispatch(Message::Connect {
//!     channel: Box::new(Vec::<String>::new()),
//! });
//! connection.dispatch(Message::from_text(r#"{"command":"ping","data":{}}"#));
//! ```

#![warn(missing_docs)]

mod channel;
mod connection;
mod message;

pub use self::channel::*;
pub use self::connection::*;
pub use self::message::*;
