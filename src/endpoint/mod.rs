//! Websocket endpoint.
//!
//! An [`Endpoint`] pumps bytes between an IO source and a [`Connection`].
//! Bytes produced by the connection are collected in a [`BufferedTransport`]
//! and written to the IO source after every call.

mod client;

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio")] {
        mod async_client;
    }
}

use std::io;

use crate::connection::{Connection, Handler, State, Transport};
use crate::error::Error;

/// Size of the read buffer.
pub const READ_BUF_SIZE: usize = 8 * 1024;

/// Transport which keeps everything written to it, until taken.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    buf: Vec<u8>,
    closed: bool,
}

impl BufferedTransport {
    #[inline]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            closed: false,
        }
    }

    /// Take the bytes written so far.
    #[inline]
    pub fn take(&mut self) -> Vec<u8> { std::mem::take(&mut self.buf) }

    #[inline]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Check if the connection released this transport.
    #[inline]
    pub const fn is_closed(&self) -> bool { self.closed }
}

impl Transport for BufferedTransport {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline]
    fn close(&mut self) { self.closed = true; }
}

/// Client endpoint.
pub struct Endpoint<IO, H> {
    io: IO,
    conn: Connection<BufferedTransport, H>,
    buf: Box<[u8]>,
    shutdown: bool,
}

impl<IO, H> AsRef<IO> for Endpoint<IO, H> {
    #[inline]
    fn as_ref(&self) -> &IO { &self.io }
}

impl<IO, H> AsMut<IO> for Endpoint<IO, H> {
    #[inline]
    fn as_mut(&mut self) -> &mut IO { &mut self.io }
}

impl<IO, H> std::fmt::Debug for Endpoint<IO, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("state", &self.conn.state())
            .field("buffered", &self.conn.buffered_amount())
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

impl<IO, H> Endpoint<IO, H> {
    #[inline]
    fn new(io: IO, conn: Connection<BufferedTransport, H>) -> Self {
        Self {
            io,
            conn,
            buf: vec![0; READ_BUF_SIZE].into_boxed_slice(),
            shutdown: false,
        }
    }

    #[inline]
    pub fn connection(&self) -> &Connection<BufferedTransport, H> { &self.conn }

    #[inline]
    pub fn connection_mut(&mut self) -> &mut Connection<BufferedTransport, H> { &mut self.conn }

    #[inline]
    pub fn handler(&self) -> &H { self.conn.handler() }

    #[inline]
    pub fn handler_mut(&mut self) -> &mut H { self.conn.handler_mut() }

    #[inline]
    pub const fn state(&self) -> State { self.conn.state() }

    /// Check if the connection reached Closed or Failed.
    #[inline]
    pub const fn is_closed(&self) -> bool { self.conn.state().is_terminal() }

    /// Give up the IO source.
    #[inline]
    pub fn into_inner(self) -> IO { self.io }
}

impl<IO, H: Handler> Endpoint<IO, H> {
    /// Convert the error which failed the connection.
    fn take_error(&mut self, kind: io::ErrorKind) -> io::Error {
        match self.conn.take_error() {
            Some(e) => e.into(),
            None => kind.into(),
        }
    }

    /// Ok once the handshake completed, even if the server closed right
    /// after it. The failure otherwise.
    fn check_open(&mut self) -> io::Result<()> {
        match self.conn.handshake() {
            Some(_) => Ok(()),
            None => Err(self.take_error(io::ErrorKind::ConnectionAborted)),
        }
    }
}

/// Surface engine misuse through `std::io`.
#[inline]
fn engine_error(e: crate::error::EngineError) -> io::Error { Error::from(e).into() }

#[cfg(test)]
mod test {
    use std::io::{Read, Write, Result};
    use crate::connection::{CloseInfo, Handler};
    use crate::handshake::{HandshakeResult, Request};

    pub const KEY: [u8; 24] = *b"dGhlIHNhbXBsZSBub25jZQ==";

    pub const RESPONSE: &[u8] = b"\
        HTTP/1.1 101 Switching Protocols\r\n\
        upgrade: websocket\r\n\
        connection: upgrade\r\n\
        sec-websocket-accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

    pub fn request() -> Request { Request::with_key("ws://www.example.com/ws", KEY).unwrap() }

    pub struct LimitReadWriter {
        pub rbuf: Vec<u8>,
        pub wbuf: Vec<u8>,
        pub rlimit: usize,
        pub wlimit: usize,
        pub cursor: usize,
    }

    impl Read for LimitReadWriter {
        fn read(&mut self, mut buf: &mut [u8]) -> Result<usize> {
            let to_read = std::cmp::min(buf.len(), self.rlimit);
            let left_data = self.rbuf.len() - self.cursor;
            if left_data == 0 {
                return Ok(0);
            }
            if left_data <= to_read {
                buf.write_all(&self.rbuf[self.cursor..]).unwrap();
                self.cursor = self.rbuf.len();
                return Ok(left_data);
            }

            buf.write_all(&self.rbuf[self.cursor..self.cursor + to_read])
                .unwrap();
            self.cursor += to_read;
            Ok(to_read)
        }
    }

    impl Write for LimitReadWriter {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            let len = std::cmp::min(buf.len(), self.wlimit);
            self.wbuf.write(&buf[..len])
        }

        fn flush(&mut self) -> Result<()> { Ok(()) }
    }

    #[derive(Debug, Default)]
    pub struct Inbox {
        pub connected: bool,
        pub texts: Vec<String>,
        pub binaries: Vec<Vec<u8>>,
        pub closed: Option<CloseInfo>,
        pub errors: usize,
    }

    impl Handler for Inbox {
        fn on_connected(&mut self, _: &HandshakeResult) { self.connected = true; }

        fn on_text(&mut self, text: String) { self.texts.push(text); }

        fn on_binary(&mut self, data: Vec<u8>) { self.binaries.push(data); }

        fn on_closed(&mut self, info: &CloseInfo) { self.closed = Some(info.clone()); }

        fn on_error(&mut self, _: &crate::error::Error) { self.errors += 1; }
    }
}
