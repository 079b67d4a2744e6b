use std::io::Result;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, AsyncReadExt, AsyncWriteExt};

use super::{engine_error, BufferedTransport, Endpoint};

use crate::config::Config;
use crate::connection::{Connection, Handler, Message, State};
use crate::handshake::Request;

enum Step {
    Read(Result<usize>),
    Tick,
}

impl<IO: AsyncRead + AsyncWrite + Unpin, H: Handler> Endpoint<IO, H> {
    /// Async version of [`connect_sync`](Self::connect_sync).
    pub async fn connect_async(io: IO, handler: H, request: Request, config: Config) -> Result<Self> {
        let conn = Connection::connect(BufferedTransport::new(), handler, request, config);
        let mut ep = Endpoint::new(io, conn);

        ep.write_async().await?;
        while ep.conn.state() == State::Connecting {
            ep.read_async().await?;
        }

        ep.check_open()?;
        Ok(ep)
    }

    /// Async version of [`read_sync`](Self::read_sync).
    pub async fn read_async(&mut self) -> Result<usize> {
        let res = self.io.read(&mut self.buf).await;
        self.on_read(res).await
    }

    /// Async version of [`write_sync`](Self::write_sync).
    ///
    /// The IO source is shut down once the connection released it.
    pub async fn write_async(&mut self) -> Result<()> {
        let data = self.conn.transport_mut().take();
        if !data.is_empty() {
            let res = match self.io.write_all(&data).await {
                Ok(()) => self.io.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = res {
                let kind = e.kind();
                self.conn.on_transport_error(e);
                return Err(self.take_error(kind));
            }
        }

        if self.conn.transport().is_closed() && !self.shutdown {
            self.shutdown = true;
            // the peer may be gone already
            let _ = self.io.shutdown().await;
        }
        Ok(())
    }

    /// Async version of [`send_sync`](Self::send_sync).
    pub async fn send_async(&mut self, message: &Message) -> Result<()> {
        self.conn.send(message).map_err(engine_error)?;
        self.write_async().await
    }

    /// Async version of [`ping_sync`](Self::ping_sync).
    pub async fn ping_async(&mut self, payload: Option<&[u8]>) -> Result<()> {
        self.conn.send_ping(payload).map_err(engine_error)?;
        self.write_async().await
    }

    /// Async version of [`close_sync`](Self::close_sync).
    ///
    /// Nothing is timed here, wrap it with [`tokio::time::timeout`] or
    /// use [`run_async`](Self::run_async) to honor the close timeout.
    pub async fn close_async(&mut self, code: u16, reason: &str) -> Result<()> {
        self.conn.close(code, reason).map_err(engine_error)?;
        self.write_async().await?;

        while !self.is_closed() {
            if self.read_async().await? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Drive the connection until it is closed: read from the IO source
    /// and run timers every `period`.
    pub async fn run_async(&mut self, period: Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(period);

        while !self.is_closed() {
            let step = tokio::select! {
                res = self.io.read(&mut self.buf) => Step::Read(res),
                _ = ticker.tick() => Step::Tick,
            };

            match step {
                Step::Read(res) => {
                    if self.on_read(res).await? == 0 {
                        break;
                    }
                }
                Step::Tick => {
                    self.conn.tick(Instant::now());
                    self.write_async().await?;
                }
            };
        }
        Ok(())
    }

    async fn on_read(&mut self, res: Result<usize>) -> Result<usize> {
        let n = match res {
            Ok(n) => n,
            Err(e) => {
                let kind = e.kind();
                self.conn.on_transport_error(e);
                return Err(self.take_error(kind));
            }
        };

        if n == 0 {
            self.conn.on_transport_closed();
        } else {
            self.conn.on_data(&self.buf[..n]);
        }

        self.write_async().await?;
        Ok(n)
    }
}
