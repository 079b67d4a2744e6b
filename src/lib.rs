// #![warn(missing_docs)]

//! Sans-io client websocket protocol engine.
//!
//! ## Features
//! - No IO inside the engine: bytes in, events and bytes out.
//! - Handshake validation, fragmentation, utf-8 checks, ping/pong and
//!   the closing handshake.
//! - Pluggable per-message compression.
//! - Blocking and tokio drivers on top.
//!
//! ## High-level API
//!
//! - [`endpoint`]
//!
//! ```ignore
//! {
//!     // handshake
//!     let request = Request::new("ws://example.com/chat")?;
//!     let mut ep = Endpoint::connect_sync(tcp, handler, request, Config::default())?;
//!     // send a message
//!     ep.send_sync(&Message::Text("hello".into()))?;
//!     // events are delivered to the handler
//!     ep.read_sync()?;
//!     // closing handshake
//!     ep.close_sync(1000, "bye")?;
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`connection`]
//! - [`frame`]
//! - [`handshake`]
//! - [`compression`]
//!
//! Connection:
//!
//! ```ignore
//! {
//!     // the request is written to the transport right away
//!     let mut conn = Connection::connect(transport, handler, request, config);
//!     // feed whatever the transport received
//!     conn.on_data(&buf[..n]);
//!     // run timers from time to time
//!     conn.tick(Instant::now());
//! }
//! ```
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // encode a frame
//!     let frame = Frame::new(Fin::Y, Rsv::NONE, OpCode::Text, mask, payload);
//!     frame.encode(&mut buf);
//!
//!     // decode a frame
//!     let codec = FrameCodec::<Client>::new(max_payload);
//!     let (frame, offset) = codec.decode(&buf)?;
//! }
//! ```

pub mod role;
pub mod error;
pub mod frame;
pub mod config;
pub mod endpoint;
pub mod handshake;
pub mod connection;
pub mod compression;

pub use config::Config;
pub use endpoint::Endpoint;
pub use error::{Error, ErrorKind};
pub use handshake::{HandshakeResult, Request};
pub use compression::{Compression, DeflateParams};
pub use connection::{CloseInfo, Connection, Handler, Message, State, Transport};
