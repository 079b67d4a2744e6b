//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!

pub mod flag;
pub mod length;
pub mod mask;

pub use flag::{Fin, OpCode, Rsv};
pub use length::PayloadLen;
pub use mask::{Mask, MaskSource, RandMask, FixedMask};

use std::marker::PhantomData;

use crate::role::RoleHelper;
use crate::error::ProtocolError;
use mask::apply_mask4;

/// 2 + 8 + 4
pub const MAX_HEAD_LEN: usize = 14;

/// Max payload of a control frame.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub rsv: Rsv,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: Fin, rsv: Rsv, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            rsv,
            opcode,
            mask,
            length,
        }
    }

    /// Number of bytes this head occupies on the wire.
    #[inline]
    pub const fn encoded_len(&self) -> usize {
        let mask_len = match self.mask {
            Mask::Key(_) => 4,
            Mask::None => 0,
        };
        2 + self.length.extended_len() + mask_len
    }

    fn to_bytes(self) -> ([u8; MAX_HEAD_LEN], usize) {
        let mut buf = [0_u8; MAX_HEAD_LEN];

        // fin, rsv, opcode
        buf[0] = self.fin as u8 | self.rsv.to_flag() | self.opcode as u8;

        // mask, payload length
        buf[1] = self.mask.to_flag() | self.length.to_flag();

        let mut n = 2;

        // extended payload length
        match self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => {
                buf[n..n + 2].copy_from_slice(&v.to_be_bytes());
                n += 2;
            }
            PayloadLen::Extended2(v) => {
                buf[n..n + 8].copy_from_slice(&v.to_be_bytes());
                n += 8;
            }
        };

        // mask key
        if let Mask::Key(k) = self.mask {
            buf[n..n + 4].copy_from_slice(&k);
            n += 4;
        }

        (buf, n)
    }

    /// Encode to provided buffer, returns the count of written bytes.
    /// The caller should ensure the buffer is large enough,
    /// otherwise a [`ProtocolError::NotEnoughCapacity`] error will be returned.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let (head, n) = self.to_bytes();

        if buf.len() < n {
            return Err(ProtocolError::NotEnoughCapacity);
        }

        buf[..n].copy_from_slice(&head[..n]);
        Ok(n)
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    /// If there is not enough data to parse, a [`ProtocolError::NotEnoughData`] error
    /// will be returned.
    ///
    /// Only the wire format is checked here, see [`FrameCodec`] for
    /// the rules that depend on role and negotiated extensions.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), ProtocolError> {
        if buf.len() < 2 {
            return Err(ProtocolError::NotEnoughData);
        }

        let mut n: usize = 2;

        // fin, rsv, opcode
        let b1 = buf[0];

        // mask, payload length
        let b2 = buf[1];

        let fin = Fin::from_flag(b1);
        let rsv = Rsv::from_flag(b1);
        let opcode = OpCode::from_flag(b1)?;

        let masked = Mask::is_flag_set(b2);
        let mut length = PayloadLen::from_flag(b2);

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                let ext: [u8; 2] = match buf.get(n..n + 2) {
                    Some(b) => [b[0], b[1]],
                    None => return Err(ProtocolError::NotEnoughData),
                };
                length = PayloadLen::from_byte2(ext);
                n += 2;
            }
            PayloadLen::Extended2(_) => {
                let mut ext = [0_u8; 8];
                match buf.get(n..n + 8) {
                    Some(b) => ext.copy_from_slice(b),
                    None => return Err(ProtocolError::NotEnoughData),
                };
                length = PayloadLen::from_byte8(ext)?;
                n += 8;
            }
        };

        let mask = if masked {
            let key: [u8; 4] = match buf.get(n..n + 4) {
                Some(b) => [b[0], b[1], b[2], b[3]],
                None => return Err(ProtocolError::NotEnoughData),
            };
            n += 4;
            Mask::Key(key)
        } else {
            Mask::None
        };

        Ok((
            FrameHead {
                fin,
                rsv,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }
}

/// Websocket frame, with unmasked payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub head: FrameHead,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Constructor, payload length is taken from `payload`.
    #[inline]
    pub fn new(fin: Fin, rsv: Rsv, opcode: OpCode, mask: Mask, payload: Vec<u8>) -> Self {
        let length = PayloadLen::from_num(payload.len() as u64);
        Self {
            head: FrameHead::new(fin, rsv, opcode, mask, length),
            payload,
        }
    }

    #[inline]
    pub const fn opcode(&self) -> OpCode { self.head.opcode }

    #[inline]
    pub const fn is_fin(&self) -> bool { self.head.fin.is_set() }

    /// Append the wire form to `out`, masking the payload if a key is set.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let (head, n) = self.head.to_bytes();
        out.reserve(n + self.payload.len());
        out.extend_from_slice(&head[..n]);

        let beg = out.len();
        out.extend_from_slice(&self.payload);
        if let Mask::Key(key) = self.head.mask {
            apply_mask4(key, &mut out[beg..]);
        }
    }
}

/// Frame decoder bound to the local role.
///
/// `FrameCodec<Client>` reads frames sent by a server and rejects masked ones,
/// `FrameCodec<Server>` reads frames sent by a client and rejects unmasked ones.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec<Role> {
    rsv: Rsv,
    max_payload: u64,
    _marker: PhantomData<Role>,
}

impl<Role> FrameCodec<Role> {
    /// Create a codec rejecting any reserved bit.
    #[inline]
    pub const fn new(max_payload: u64) -> Self {
        Self {
            rsv: Rsv::NONE,
            max_payload,
            _marker: PhantomData,
        }
    }

    /// Accept reserved bits defined by a negotiated extension.
    #[inline]
    pub fn allow_rsv(&mut self, rsv: Rsv) { self.rsv = self.rsv.union(rsv); }

    #[inline]
    pub const fn allowed_rsv(&self) -> Rsv { self.rsv }

    #[inline]
    pub const fn max_payload(&self) -> u64 { self.max_payload }
}

impl<Role: RoleHelper> FrameCodec<Role> {
    /// Parse one frame from the beginning of `buf`, returns the frame
    /// and the count of read bytes.
    ///
    /// Nothing is consumed on [`ProtocolError::NotEnoughData`], the caller
    /// should retry with the same bytes plus whatever arrives next.
    pub fn decode(&self, buf: &[u8]) -> Result<(Frame, usize), ProtocolError> {
        let (head, parse_n) = FrameHead::decode(buf)?;

        let rsv = head.rsv.difference(self.rsv);
        if !rsv.is_empty() {
            return Err(ProtocolError::UnsupportedReservedBits(rsv.to_flag()));
        }

        match (Role::MASK_READ, head.mask) {
            (true, Mask::None) => return Err(ProtocolError::MaskRequired),
            (false, Mask::Key(_)) => return Err(ProtocolError::UnexpectedMask),
            _ => {}
        };

        let frame_len = head.length.to_num();

        if head.opcode.is_control() {
            if !head.fin.is_set() {
                return Err(ProtocolError::FragmentedControl);
            }
            if frame_len > MAX_CONTROL_PAYLOAD as u64 {
                return Err(ProtocolError::ControlFrameTooLong(frame_len));
            }
        }

        if frame_len > self.max_payload {
            return Err(ProtocolError::MessageTooLarge);
        }

        // fits in usize, bounded by max_payload
        let frame_len = frame_len as usize;
        let payload = match buf.get(parse_n..parse_n + frame_len) {
            Some(data) => data,
            None => return Err(ProtocolError::NotEnoughData),
        };

        let mut payload = payload.to_vec();
        if let Mask::Key(key) = head.mask {
            apply_mask4(key, &mut payload);
        }

        Ok((Frame { head, payload }, parse_n + frame_len))
    }
}
