use std::io;
use std::time::Instant;

use super::{Connection, Handler, Message, State, Transport};
use super::ctrl::{encode_close_payload, is_valid_close_code, MAX_CLOSE_REASON};

use crate::role::{Client, RoleHelper};
use crate::frame::{Fin, Frame, MaskSource, OpCode, Rsv, MAX_CONTROL_PAYLOAD};
use crate::error::EngineError;

impl<T: Transport, H: Handler, M: MaskSource> Connection<T, H, M> {
    /// Send a text message.
    #[inline]
    pub fn send_text(&mut self, text: &str) -> Result<(), EngineError> {
        self.send_message(OpCode::Text, text.as_bytes())
    }

    /// Send a binary message.
    #[inline]
    pub fn send_binary(&mut self, data: &[u8]) -> Result<(), EngineError> {
        self.send_message(OpCode::Binary, data)
    }

    /// Send a message.
    #[inline]
    pub fn send(&mut self, message: &Message) -> Result<(), EngineError> {
        match message {
            Message::Text(s) => self.send_text(s),
            Message::Binary(b) => self.send_binary(b),
        }
    }

    /// Send a ping, the pong must arrive within the configured timeout.
    ///
    /// Without a payload an 8-byte counter is used, so that each ping
    /// can be told apart.
    pub fn send_ping(&mut self, payload: Option<&[u8]>) -> Result<(), EngineError> {
        self.check_open()?;

        let payload = match payload {
            Some(p) if p.len() > MAX_CONTROL_PAYLOAD => {
                return Err(EngineError::ControlPayloadTooLong(p.len()))
            }
            Some(p) => p.to_vec(),
            None => {
                self.ping_nonce = self.ping_nonce.wrapping_add(1);
                self.ping_nonce.to_be_bytes().to_vec()
            }
        };

        let deadline = Instant::now() + self.config.ping_timeout;
        self.pings.push(payload.clone(), deadline);
        self.queue_frame(Fin::Y, Rsv::NONE, OpCode::Ping, payload);
        self.flush();
        Ok(())
    }

    /// Send an unsolicited pong.
    pub fn send_pong(&mut self, payload: &[u8]) -> Result<(), EngineError> {
        self.check_open()?;
        if payload.len() > MAX_CONTROL_PAYLOAD {
            return Err(EngineError::ControlPayloadTooLong(payload.len()));
        }
        self.queue_frame(Fin::Y, Rsv::NONE, OpCode::Pong, payload.to_vec());
        self.flush();
        Ok(())
    }

    /// Start the close handshake.
    ///
    /// Once closing (or closed), this does nothing.
    pub fn close(&mut self, code: u16, reason: &str) -> Result<(), EngineError> {
        match self.state {
            State::Open => {}
            State::Connecting => return Err(EngineError::NotOpen),
            State::Closing | State::Closed | State::Failed => return Ok(()),
        };

        if !is_valid_close_code(code) {
            return Err(EngineError::InvalidCloseCode(code));
        }
        if reason.len() > MAX_CLOSE_REASON {
            return Err(EngineError::ReasonTooLong(reason.len()));
        }

        self.start_close(Some(code), reason);
        self.flush();
        Ok(())
    }

    /// Drop the connection without a close handshake.
    pub fn abort(&mut self) {
        let connecting = match self.state {
            State::Closed | State::Failed => return,
            State::Connecting => true,
            _ => false,
        };

        log::debug!("abort in state {}", self.state);
        self.state = State::Failed;
        self.release();
        if connecting {
            let err = EngineError::Aborted.into();
            self.handler.on_error(&err);
            self.error = Some(err);
        }
        self.report_closed(super::CloseInfo::abnormal());
    }

    /// Hand queued bytes to the transport.
    ///
    /// Call again when the transport can take more.
    pub fn flush(&mut self) {
        if let Err(e) = self.write_queued() {
            self.fail(e.into());
            return;
        }
        self.finish_close();
    }

    pub(super) fn check_open(&self) -> Result<(), EngineError> {
        match self.state {
            State::Open => Ok(()),
            State::Closing => Err(EngineError::ConnectionClosing),
            _ => Err(EngineError::NotOpen),
        }
    }

    fn send_message(&mut self, opcode: OpCode, data: &[u8]) -> Result<(), EngineError> {
        self.check_open()?;

        let (payload, rsv) = match self.compression.as_mut() {
            Some(c) => {
                let payload = c
                    .compress(data)
                    .map_err(|e| EngineError::Compression(e.to_string()))?;
                (payload, Rsv::RSV1)
            }
            None => (data.to_vec(), Rsv::NONE),
        };

        let size = match self.config.fragment_size {
            Some(n) if n > 0 => n,
            _ => payload.len().max(1),
        };

        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![&payload[..]]
        } else {
            payload.chunks(size).collect()
        };

        let last = chunks.len() - 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let (opcode, rsv) = if i == 0 {
                (opcode, rsv)
            } else {
                (OpCode::Continue, Rsv::NONE)
            };
            let fin = if i == last { Fin::Y } else { Fin::N };
            self.queue_frame(fin, rsv, opcode, chunk.to_vec());
        }

        log::trace!("queued {:?} message, {} bytes", opcode, data.len());
        self.flush();
        Ok(())
    }

    /// Queue a close frame and enter Closing.
    pub(super) fn start_close(&mut self, code: Option<u16>, reason: &str) {
        self.queue_close(code, reason);
        self.state = State::Closing;
        if self.close_deadline.is_none() {
            self.close_deadline = Some(Instant::now() + self.config.close_timeout);
        }
        log::debug!("closing, sent code: {:?}", code);
    }

    pub(super) fn queue_close(&mut self, code: Option<u16>, reason: &str) {
        if self.close_sent {
            return;
        }
        let payload = encode_close_payload(code, reason);
        self.queue_frame(Fin::Y, Rsv::NONE, OpCode::Close, payload);
    }

    /// Queue a pong for a received ping.
    pub(super) fn queue_pong(&mut self, payload: &[u8]) {
        self.queue_frame(Fin::Y, Rsv::NONE, OpCode::Pong, payload.to_vec());
    }

    // Nothing goes out after a close frame.
    fn queue_frame(&mut self, fin: Fin, rsv: Rsv, opcode: OpCode, payload: Vec<u8>) {
        if self.close_sent {
            log::trace!("drop {:?} frame after close", opcode);
            return;
        }

        let mask = Client::write_mask(&mut self.mask);
        let frame = Frame::new(fin, rsv, opcode, mask, payload);

        let mut buf = Vec::new();
        frame.encode(&mut buf);
        self.outq.push_back(buf);
        self.last_activity = Instant::now();

        if opcode == OpCode::Close {
            self.close_sent = true;
        }
    }

    /// Write queued frames in order, until the transport stops taking them.
    pub(super) fn write_queued(&mut self) -> io::Result<()> {
        while let Some(front) = self.outq.front() {
            if self.released {
                break;
            }

            match self.transport.write(&front[self.out_offset..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.out_offset += n;
                    if self.out_offset >= front.len() {
                        self.outq.pop_front();
                        self.out_offset = 0;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Both close frames are exchanged and ours is out, done.
    fn finish_close(&mut self) {
        if self.state != State::Closing || !self.close_sent || !self.outq.is_empty() {
            return;
        }

        if let Some(info) = self.close_received.take() {
            self.state = State::Closed;
            self.release();
            self.report_closed(info);
        }
    }
}
