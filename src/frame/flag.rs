//! Fin flag, reserved bits and opcode.

use crate::error::ProtocolError;

/// Fin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fin {
    /// a byte with its leading bit set
    Y = 0x80,

    /// a byte with its leading bit clear
    N = 0x00,
}

/// Reserved bits RSV1, RSV2 and RSV3, kept at their wire position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rsv(u8);

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// denotes a continuation frame, 0x00
    Continue = 0x00,
    /// denotes a text frame, 0x01
    Text = 0x01,
    /// denotes a binary frame, 0x02
    Binary = 0x02,

    /// denotes a connection close, 0x08
    Close = 0x08,
    /// denotes a ping, 0x09
    Ping = 0x09,
    /// denotes a pong, 0x0a
    Pong = 0x0a,
}

impl Fin {
    /// Parse from byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        if b & 0x80 == 0x80 {
            Fin::Y
        } else {
            Fin::N
        }
    }

    #[inline]
    pub const fn is_set(self) -> bool { matches!(self, Fin::Y) }
}

impl Rsv {
    /// No reserved bit.
    pub const NONE: Rsv = Rsv(0x00);
    /// RSV1, used by per-message compression.
    pub const RSV1: Rsv = Rsv(0x40);
    /// RSV2.
    pub const RSV2: Rsv = Rsv(0x20);
    /// RSV3.
    pub const RSV3: Rsv = Rsv(0x10);

    /// Parse from the first head byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Self { Rsv(b & 0x70) }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(self) -> u8 { self.0 }

    #[inline]
    pub const fn is_empty(self) -> bool { self.0 == 0 }

    #[inline]
    pub const fn contains(self, other: Rsv) -> bool { self.0 & other.0 == other.0 }

    #[inline]
    pub const fn union(self, other: Rsv) -> Rsv { Rsv(self.0 | other.0) }

    /// Bits of `self` not covered by `allowed`.
    #[inline]
    pub const fn difference(self, allowed: Rsv) -> Rsv { Rsv(self.0 & !allowed.0) }
}

impl OpCode {
    /// Parse from byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Result<Self, ProtocolError> {
        use OpCode::*;
        let opcode = match b & 0x0f {
            0x00 => Continue,
            0x01 => Text,
            0x02 => Binary,
            0x08 => Close,
            0x09 => Ping,
            0x0a => Pong,
            x => return Err(ProtocolError::UnknownOpcode(x)),
        };
        Ok(opcode)
    }

    /// Close, ping and pong.
    #[inline]
    pub const fn is_control(self) -> bool { self as u8 & 0x08 != 0 }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules!  enc_dec {
        ($class: ident $(, $v: expr )+ ) => {
            $(
                let v = $class::from_flag($v).unwrap();
                assert_eq!(v as u8, $v);
            )+
        };
    }

    #[test]
    fn fin() {
        assert_eq!(Fin::from_flag(0x80) as u8, 0x80);
        assert_eq!(Fin::from_flag(0x81) as u8, 0x80);
        assert_eq!(Fin::from_flag(0x01) as u8, 0x00);
    }

    #[test]
    fn opcode() {
        enc_dec!(OpCode, 0x00, 0x01, 0x02, 0x08, 0x09, 0x0a);
    }

    #[test]
    fn reserved_opcode() {
        for v in [0x03, 0x04, 0x05, 0x06, 0x07, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f] {
            assert_eq!(OpCode::from_flag(v), Err(ProtocolError::UnknownOpcode(v)));
        }
    }

    #[test]
    fn control() {
        assert!(OpCode::Close.is_control());
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(!OpCode::Binary.is_control());
        assert!(!OpCode::Continue.is_control());
    }

    #[test]
    fn rsv() {
        let rsv = Rsv::from_flag(0xf1);
        assert_eq!(rsv.to_flag(), 0x70);
        assert!(rsv.contains(Rsv::RSV1));
        assert_eq!(rsv.difference(Rsv::RSV1), Rsv::RSV2.union(Rsv::RSV3));
        assert!(Rsv::RSV1.difference(Rsv::RSV1).is_empty());
    }
}
