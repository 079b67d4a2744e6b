//! Message reassembly.
//!
//! A message is one Text or Binary frame followed by zero or more
//! Continuation frames, the last one has FIN set. Control frames may
//! appear between them and are handed back untouched.

use crate::frame::{Frame, OpCode, Rsv};
use crate::compression::Compression;
use crate::error::ProtocolError;

/// A complete message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl Message {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Message::Text(s) => s.len(),
            Message::Binary(b) => b.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Outcome of feeding one frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Collected {
    Message(Message),
    /// More frames are needed.
    Pending,
    Control(Frame),
}

/// Reassembler.
#[derive(Debug)]
pub struct Collector {
    opcode: Option<OpCode>,
    compressed: bool,
    buf: Vec<u8>,
    // bytes already known to be valid utf-8
    checked: usize,
    max_message: usize,
}

impl Collector {
    /// Create with a limit on the assembled size.
    #[inline]
    pub const fn new(max_message: usize) -> Self {
        Self {
            opcode: None,
            compressed: false,
            buf: Vec::new(),
            checked: 0,
            max_message,
        }
    }

    /// Check if a fragmented message is in progress.
    #[inline]
    pub const fn is_pending(&self) -> bool { self.opcode.is_some() }

    /// Drop the message in progress.
    #[inline]
    pub fn clear(&mut self) {
        self.opcode = None;
        self.compressed = false;
        self.buf = Vec::new();
        self.checked = 0;
    }

    /// Feed one frame.
    ///
    /// `inflate` is the negotiated compression, if any. Without it a frame
    /// with RSV1 is rejected.
    pub fn feed(
        &mut self,
        frame: Frame,
        inflate: Option<&mut dyn Compression>,
    ) -> Result<Collected, ProtocolError> {
        let opcode = frame.opcode();
        let rsv1 = frame.head.rsv.contains(Rsv::RSV1);

        if opcode.is_control() {
            // compression only applies to data messages
            if rsv1 {
                return Err(ProtocolError::UnsupportedReservedBits(Rsv::RSV1.to_flag()));
            }
            return Ok(Collected::Control(frame));
        }

        match (self.opcode, opcode) {
            (None, OpCode::Continue) => return Err(ProtocolError::UnexpectedContinuation),
            (None, _) => {
                if rsv1 && inflate.is_none() {
                    return Err(ProtocolError::UnsupportedReservedBits(Rsv::RSV1.to_flag()));
                }
                self.opcode = Some(opcode);
                self.compressed = rsv1;
            }
            (Some(_), OpCode::Continue) => {
                // only the first frame carries the flag
                if rsv1 {
                    return Err(ProtocolError::UnsupportedReservedBits(Rsv::RSV1.to_flag()));
                }
            }
            (Some(_), op) => return Err(ProtocolError::UnexpectedOpcode(op as u8)),
        };

        if self.buf.len() + frame.payload.len() > self.max_message {
            return Err(ProtocolError::MessageTooLarge);
        }

        if self.buf.is_empty() {
            self.buf = frame.payload;
        } else {
            self.buf.extend_from_slice(&frame.payload);
        }

        let is_text = self.opcode == Some(OpCode::Text);

        // compressed bytes are checked once inflated
        if is_text && !self.compressed {
            self.check_utf8()?;
        }

        if !frame.head.fin.is_set() {
            return Ok(Collected::Pending);
        }

        let compressed = self.compressed;
        let mut data = std::mem::take(&mut self.buf);
        self.clear();

        if compressed {
            // checked above
            if let Some(inflate) = inflate {
                data = inflate
                    .decompress(&data)
                    .map_err(|e| ProtocolError::Decompression(e.to_string()))?;
            }
            if data.len() > self.max_message {
                return Err(ProtocolError::MessageTooLarge);
            }
        }

        let message = if is_text {
            Message::Text(String::from_utf8(data).map_err(|_| ProtocolError::InvalidUtf8)?)
        } else {
            Message::Binary(data)
        };

        Ok(Collected::Message(message))
    }

    // A sequence cut by a frame edge is held until the next frame,
    // anything else invalid fails right away.
    fn check_utf8(&mut self) -> Result<(), ProtocolError> {
        match std::str::from_utf8(&self.buf[self.checked..]) {
            Ok(_) => {
                self.checked = self.buf.len();
                Ok(())
            }
            Err(e) if e.error_len().is_none() => {
                self.checked += e.valid_up_to();
                Ok(())
            }
            Err(_) => Err(ProtocolError::InvalidUtf8),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::{Fin, Mask};
    use std::io;

    fn frame(fin: Fin, opcode: OpCode, payload: &[u8]) -> Frame {
        Frame::new(fin, Rsv::NONE, opcode, Mask::None, payload.to_vec())
    }

    fn fragments(opcode: OpCode, data: &[u8], n: usize) -> Vec<Frame> {
        let size = (data.len() + n - 1) / n;
        let chunks: Vec<&[u8]> = data.chunks(size).collect();
        let last = chunks.len() - 1;
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let op = if i == 0 { opcode } else { OpCode::Continue };
                let fin = if i == last { Fin::Y } else { Fin::N };
                frame(fin, op, c)
            })
            .collect()
    }

    /// Reverses the bytes, enough to tell compressed from plain.
    struct Reverse;

    impl Compression for Reverse {
        fn name(&self) -> &str { "x-reverse" }

        fn offer(&self) -> crate::handshake::Extension { crate::handshake::Extension::new("x-reverse") }

        fn accept(&mut self, _: &crate::handshake::Extension) -> Result<(), crate::error::HandshakeError> {
            Ok(())
        }

        fn compress(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
            Ok(data.iter().rev().copied().collect())
        }

        fn decompress(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
            if data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "empty"));
            }
            Ok(data.iter().rev().copied().collect())
        }
    }

    #[test]
    fn single_frame() {
        let mut c = Collector::new(1024);
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Text, b"hello"), None),
            Ok(Collected::Message(Message::Text("hello".into())))
        );
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Binary, b"\x00\xff"), None),
            Ok(Collected::Message(Message::Binary(vec![0, 0xff])))
        );
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Text, b""), None),
            Ok(Collected::Message(Message::Text(String::new())))
        );
        assert!(!c.is_pending());
    }

    #[test]
    fn reassemble() {
        // multi-byte characters end up cut by frame edges
        let text = "héllo wörld, こんにちは世界! ".repeat(8);

        for n in [1, 2, 10] {
            let mut c = Collector::new(1 << 16);
            let frames = fragments(OpCode::Text, text.as_bytes(), n);
            assert_eq!(frames.len(), n);

            let mut out = Vec::new();
            for f in frames {
                match c.feed(f, None).unwrap() {
                    Collected::Pending => assert!(c.is_pending()),
                    Collected::Message(m) => out.push(m),
                    Collected::Control(_) => unreachable!(),
                }
            }
            assert_eq!(out, vec![Message::Text(text.clone())]);
        }
    }

    #[test]
    fn interleaved_control() {
        let mut c = Collector::new(1024);
        assert_eq!(c.feed(frame(Fin::N, OpCode::Binary, b"ab"), None), Ok(Collected::Pending));

        let ping = frame(Fin::Y, OpCode::Ping, b"p");
        assert_eq!(c.feed(ping.clone(), None), Ok(Collected::Control(ping)));

        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Continue, b"cd"), None),
            Ok(Collected::Message(Message::Binary(b"abcd".to_vec())))
        );
    }

    #[test]
    fn bad_sequence() {
        let mut c = Collector::new(1024);
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Continue, b"x"), None),
            Err(ProtocolError::UnexpectedContinuation)
        );

        let mut c = Collector::new(1024);
        c.feed(frame(Fin::N, OpCode::Text, b"x"), None).unwrap();
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Binary, b"y"), None),
            Err(ProtocolError::UnexpectedOpcode(OpCode::Binary as u8))
        );
    }

    #[test]
    fn size_limit() {
        let mut c = Collector::new(10);
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Binary, &[0; 11]), None),
            Err(ProtocolError::MessageTooLarge)
        );

        // checked as fragments arrive, before the final one
        let mut c = Collector::new(10);
        assert_eq!(c.feed(frame(Fin::N, OpCode::Binary, &[0; 6]), None), Ok(Collected::Pending));
        assert_eq!(
            c.feed(frame(Fin::N, OpCode::Continue, &[0; 6]), None),
            Err(ProtocolError::MessageTooLarge)
        );

        let mut c = Collector::new(10);
        assert!(c.feed(frame(Fin::Y, OpCode::Binary, &[0; 10]), None).is_ok());
    }

    #[test]
    fn invalid_utf8() {
        // rejected at the first bad frame
        let mut c = Collector::new(1024);
        assert_eq!(
            c.feed(frame(Fin::N, OpCode::Text, b"ok\xff"), None),
            Err(ProtocolError::InvalidUtf8)
        );

        // a truncated sequence in the last frame
        let mut c = Collector::new(1024);
        assert_eq!(c.feed(frame(Fin::N, OpCode::Text, b"\xe3"), None), Ok(Collected::Pending));
        assert_eq!(c.feed(frame(Fin::N, OpCode::Continue, b"\x81"), None), Ok(Collected::Pending));
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Continue, b""), None),
            Err(ProtocolError::InvalidUtf8)
        );

        // binary is not checked
        let mut c = Collector::new(1024);
        assert!(c.feed(frame(Fin::Y, OpCode::Binary, b"\xff"), None).is_ok());
    }

    #[test]
    fn compressed() {
        let mut codec = Reverse;
        let mut c = Collector::new(1024);

        let mut first = frame(Fin::N, OpCode::Text, b"ol");
        first.head.rsv = Rsv::RSV1;
        assert_eq!(c.feed(first.clone(), Some(&mut codec as &mut dyn Compression)), Ok(Collected::Pending));
        assert_eq!(
            c.feed(frame(Fin::Y, OpCode::Continue, b"leh"), Some(&mut codec as &mut dyn Compression)),
            Ok(Collected::Message(Message::Text("hello".into())))
        );

        // not negotiated
        let mut c = Collector::new(1024);
        assert_eq!(
            c.feed(first.clone(), None),
            Err(ProtocolError::UnsupportedReservedBits(0x40))
        );

        // only on the first frame
        let mut c = Collector::new(1024);
        c.feed(frame(Fin::N, OpCode::Binary, b"a"), Some(&mut codec as &mut dyn Compression)).unwrap();
        let mut next = frame(Fin::Y, OpCode::Continue, b"b");
        next.head.rsv = Rsv::RSV1;
        assert_eq!(
            c.feed(next, Some(&mut codec as &mut dyn Compression)),
            Err(ProtocolError::UnsupportedReservedBits(0x40))
        );

        // never on control frames, even in the middle of a message
        for opcode in [OpCode::Ping, OpCode::Pong, OpCode::Close] {
            let mut c = Collector::new(1024);
            c.feed(frame(Fin::N, OpCode::Text, b"a"), Some(&mut codec as &mut dyn Compression)).unwrap();
            let mut ctrl = frame(Fin::Y, opcode, b"");
            ctrl.head.rsv = Rsv::RSV1;
            assert_eq!(
                c.feed(ctrl, Some(&mut codec as &mut dyn Compression)),
                Err(ProtocolError::UnsupportedReservedBits(0x40))
            );
        }

        // inflate failure
        let mut c = Collector::new(1024);
        let mut empty = frame(Fin::Y, OpCode::Binary, b"");
        empty.head.rsv = Rsv::RSV1;
        assert!(matches!(
            c.feed(empty, Some(&mut codec as &mut dyn Compression)),
            Err(ProtocolError::Decompression(_))
        ));
    }
}
