use std::io::{Read, Write, Result, ErrorKind};
use std::time::Instant;

use super::{engine_error, BufferedTransport, Endpoint};

use crate::config::Config;
use crate::connection::{Connection, Handler, Message, State};
use crate::handshake::Request;

impl<IO: Read + Write, H: Handler> Endpoint<IO, H> {
    /// Perform a websocket client handshake over an established IO source,
    /// return a new open endpoint.
    ///
    /// This function will block until the handshake completes, or an error occurs.
    /// The handler sees `on_connected` or `on_error` before this returns.
    pub fn connect_sync(io: IO, handler: H, request: Request, config: Config) -> Result<Self> {
        let conn = Connection::connect(BufferedTransport::new(), handler, request, config);
        let mut ep = Endpoint::new(io, conn);

        ep.write_sync()?;
        while ep.conn.state() == State::Connecting {
            ep.read_sync()?;
        }

        ep.check_open()?;
        Ok(ep)
    }

    /// Read once from the IO source and feed the connection, then write
    /// whatever the connection produced (pongs, close echo).
    ///
    /// Return the number of bytes read, 0 on EOF.
    /// Events are delivered to the handler before this returns.
    pub fn read_sync(&mut self) -> Result<usize> {
        let n = loop {
            match self.io.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let kind = e.kind();
                    self.conn.on_transport_error(e);
                    return Err(self.take_error(kind));
                }
            }
        };

        if n == 0 {
            self.conn.on_transport_closed();
        } else {
            self.conn.on_data(&self.buf[..n]);
        }

        self.write_sync()?;
        Ok(n)
    }

    /// Write bytes produced by the connection to the IO source.
    ///
    /// This function will block until all data are written to IO source
    /// or an error occurs.
    pub fn write_sync(&mut self) -> Result<()> {
        let data = self.conn.transport_mut().take();
        if data.is_empty() {
            return Ok(());
        }

        let res = self.io.write_all(&data).and_then(|_| self.io.flush());
        if let Err(e) = res {
            let kind = e.kind();
            self.conn.on_transport_error(e);
            return Err(self.take_error(kind));
        }
        Ok(())
    }

    /// Send a message and write it out.
    pub fn send_sync(&mut self, message: &Message) -> Result<()> {
        self.conn.send(message).map_err(engine_error)?;
        self.write_sync()
    }

    /// Send a ping and write it out.
    pub fn ping_sync(&mut self, payload: Option<&[u8]>) -> Result<()> {
        self.conn.send_ping(payload).map_err(engine_error)?;
        self.write_sync()
    }

    /// Run the connection's timers, then write what they produced.
    pub fn tick_sync(&mut self) -> Result<()> {
        self.conn.tick(Instant::now());
        self.write_sync()
    }

    /// Start the close handshake, then read until the connection is closed.
    ///
    /// Messages that arrive meanwhile are dropped.
    /// Without a read timeout on the IO source this blocks for as long as
    /// the peer does not answer.
    pub fn close_sync(&mut self, code: u16, reason: &str) -> Result<()> {
        self.conn.close(code, reason).map_err(engine_error)?;
        self.write_sync()?;

        while !self.is_closed() {
            if self.read_sync()? == 0 {
                break;
            }
        }
        Ok(())
    }
}
