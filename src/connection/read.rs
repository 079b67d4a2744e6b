use std::io;
use std::time::Instant;

use super::{Collected, Connection, Handler, Message, State, Transport};
use super::ctrl::{code, is_valid_close_code, parse_close_payload, CloseInfo};

use crate::frame::{Frame, MaskSource, OpCode, Rsv};
use crate::compression::Compression;
use crate::handshake::HandshakeResult;
use crate::error::{Error, HandshakeError, ProtocolError};

const HTTP_PREFIX: &[u8] = b"HTTP/";

impl<T: Transport, H: Handler, M: MaskSource> Connection<T, H, M> {
    /// Feed bytes read from the transport.
    ///
    /// Bytes are buffered until a complete response or frame is available,
    /// events are delivered before this returns. Ignored once closed.
    ///
    /// While connecting, bytes that do not start an http response fail the
    /// connection with [`ProtocolError::FrameBeforeHandshake`], without a
    /// close frame.
    pub fn on_data(&mut self, data: &[u8]) {
        if self.state.is_terminal() {
            log::trace!("ignore {} bytes in state {}", data.len(), self.state);
            return;
        }

        self.last_activity = Instant::now();
        self.inbuf.extend_from_slice(data);

        if let Err(e) = self.process() {
            self.fail(e);
            return;
        }
        self.flush();
    }

    /// The transport reached EOF.
    pub fn on_transport_closed(&mut self) {
        match self.state {
            State::Closed | State::Failed => {}
            State::Connecting => {
                self.fail(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            State::Open | State::Closing => {
                // both close frames exchanged, only our echo was pending
                let info = match self.close_received.take() {
                    Some(info) => info,
                    None => CloseInfo::abnormal(),
                };
                log::debug!("transport closed in state {}", self.state);
                self.state = State::Closed;
                self.release();
                self.report_closed(info);
            }
        }
    }

    /// The transport failed.
    #[inline]
    pub fn on_transport_error(&mut self, err: io::Error) { self.fail(err.into()); }

    fn process(&mut self) -> Result<(), Error> {
        if self.state == State::Connecting && !self.read_handshake()? {
            return Ok(());
        }

        while matches!(self.state, State::Open | State::Closing) {
            let (frame, n) = match self.codec.decode(&self.inbuf) {
                Ok(x) => x,
                Err(ProtocolError::NotEnoughData) => break,
                Err(e) => return Err(e.into()),
            };
            self.inbuf.drain(..n);
            self.on_frame(frame)?;
        }

        Ok(())
    }

    /// Return true once the response is checked.
    fn read_handshake(&mut self) -> Result<bool, Error> {
        let max = self.config.max_handshake_size;

        // a response starts with the status line, anything else is frame data
        let n = self.inbuf.len().min(HTTP_PREFIX.len());
        if self.inbuf[..n] != HTTP_PREFIX[..n] {
            return Err(ProtocolError::FrameBeforeHandshake.into());
        }

        let (result, n) = match HandshakeResult::decode(&self.inbuf, &self.request) {
            Ok(x) => x,
            Err(HandshakeError::NotEnoughData) if self.inbuf.len() <= max => return Ok(false),
            Err(HandshakeError::NotEnoughData) => return Err(HandshakeError::ResponseTooLarge.into()),
            Err(e) => return Err(e.into()),
        };

        if n > max {
            return Err(HandshakeError::ResponseTooLarge.into());
        }
        self.inbuf.drain(..n);

        if let Some(mut c) = self.config.compression.take() {
            let agreed = result
                .extensions
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(c.name()));
            if let Some(ext) = agreed {
                c.accept(ext)?;
                self.codec.allow_rsv(Rsv::RSV1);
                log::debug!("compression in use: {}", ext);
                self.compression = Some(c);
            }
        }

        log::debug!(
            "connected, protocol: {:?}, extensions: {}",
            result.protocol,
            result.extensions.len()
        );
        self.state = State::Open;
        self.handler.on_connected(&result);
        self.handshake = Some(result);
        Ok(true)
    }

    fn on_frame(&mut self, frame: Frame) -> Result<(), Error> {
        let opcode = frame.opcode();

        // only the close handshake matters now
        if self.state == State::Closing && opcode != OpCode::Close {
            log::trace!("ignore {:?} frame while closing", opcode);
            return Ok(());
        }

        let inflate = self
            .compression
            .as_mut()
            .map(|c| &mut **c as &mut dyn Compression);

        match self.collector.feed(frame, inflate)? {
            Collected::Pending => {}
            Collected::Message(Message::Text(text)) => self.handler.on_text(text),
            Collected::Message(Message::Binary(data)) => self.handler.on_binary(data),
            Collected::Control(frame) => self.on_control(frame)?,
        };

        Ok(())
    }

    fn on_control(&mut self, frame: Frame) -> Result<(), Error> {
        match frame.opcode() {
            OpCode::Ping => {
                if self.config.auto_pong {
                    self.queue_pong(&frame.payload);
                }
                self.handler.on_ping(&frame.payload);
            }
            OpCode::Pong => {
                if !self.pings.on_pong(&frame.payload) {
                    log::trace!("unsolicited pong");
                }
                self.handler.on_pong(&frame.payload);
            }
            OpCode::Close => self.on_close_frame(&frame.payload)?,
            _ => {}
        };
        Ok(())
    }

    fn on_close_frame(&mut self, payload: &[u8]) -> Result<(), Error> {
        if self.close_received.is_some() {
            log::debug!("ignore repeated close frame");
            return Ok(());
        }

        let (peer_code, reason) = parse_close_payload(payload)?;
        let info = CloseInfo::from_peer(peer_code, reason);
        log::debug!("close frame received: {}", info);

        if !self.close_sent {
            let echo = match (self.config.close_echo_code, peer_code) {
                (Some(c), _) => Some(c),
                (None, None) => None,
                (None, Some(c)) if is_valid_close_code(c) => Some(c),
                (None, Some(_)) => Some(code::PROTOCOL_ERROR),
            };
            self.start_close(echo, "");
        }

        self.state = State::Closing;
        self.close_received = Some(info);
        Ok(())
    }
}
