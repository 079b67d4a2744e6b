//!  Mask flag and key.

/// Payload mask with a 32-bit key.
///
/// Frames written by a client always carry `Mask::Key`,
/// frames written by a server carry `Mask::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Key([u8; 4]),
    None,
}

impl Mask {
    /// Read the flag which indicates whether mask is used.
    #[inline]
    pub const fn is_flag_set(b: u8) -> bool { b & 0x80 == 0x80 }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        match self {
            Mask::Key(_) => 0x80,
            Mask::None => 0x00,
        }
    }
}

/// Source of mask keys.
///
/// Masking only obfuscates the payload against intermediaries, so the keys
/// need to be unpredictable but not cryptographically strong.
pub trait MaskSource {
    fn next_key(&mut self) -> [u8; 4];
}

/// Keys drawn from the thread local rng.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandMask;

impl MaskSource for RandMask {
    #[inline]
    fn next_key(&mut self) -> [u8; 4] { new_rand_key() }
}

/// Always hands out the same key.
#[derive(Debug, Clone, Copy)]
pub struct FixedMask(pub [u8; 4]);

impl MaskSource for FixedMask {
    #[inline]
    fn next_key(&mut self) -> [u8; 4] { self.0 }
}

/// Generate a new random key.
#[inline]
pub fn new_rand_key() -> [u8; 4] { rand::random::<[u8; 4]>() }

/// Mask the buffer, byte by byte.
#[inline]
pub fn apply_mask(key: [u8; 4], buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i & 0x03];
    }
}

/// Mask the buffer, 4 bytes at a time.
#[inline]
pub fn apply_mask4(key: [u8; 4], buf: &mut [u8]) {
    let key4 = u32::from_ne_bytes(key);

    // u32 has no invalid bit patterns, so reinterpreting the aligned middle is sound.
    let (prefix, middle, suffix) = unsafe { buf.align_to_mut::<u32>() };

    apply_mask(key, prefix);

    let head = prefix.len() & 3;
    let key4 = if head > 0 {
        if cfg!(target_endian = "big") {
            key4.rotate_left(8 * head as u32)
        } else {
            key4.rotate_right(8 * head as u32)
        }
    } else {
        key4
    };
    for b4 in middle.iter_mut() {
        *b4 ^= key4;
    }

    apply_mask(key4.to_ne_bytes(), suffix);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mask_flag() {
        assert!(Mask::is_flag_set(Mask::Key([1, 2, 3, 4]).to_flag()));
        assert!(!Mask::is_flag_set(Mask::None.to_flag()));
    }

    #[test]
    fn mask_byte() {
        let key: [u8; 4] = rand::random();
        let buf: Vec<u8> = (0..1024).map(|_| rand::random::<u8>()).collect();

        let mut buf2 = buf.clone();
        apply_mask(key, &mut buf2);
        apply_mask(key, &mut buf2);

        assert_eq!(buf, buf2);
    }

    #[test]
    fn mask_byte4() {
        for i in 0..1024 {
            let key: [u8; 4] = rand::random();
            let buf: Vec<u8> = (0..i).map(|_| rand::random::<u8>()).collect();

            let mut buf2 = buf.clone();
            let mut buf3 = buf.clone();
            apply_mask4(key, &mut buf2);
            apply_mask(key, &mut buf3);
            assert_eq!(buf2, buf3);

            apply_mask4(key, &mut buf2);
            assert_eq!(buf, buf2);
        }
    }

    #[test]
    fn mask_unaligned() {
        let key = [0x37, 0xfa, 0x21, 0x3d];
        let buf: Vec<u8> = (0..64).collect();
        for beg in 0..8 {
            let mut a = buf[beg..].to_vec();
            let mut b = buf.clone();
            apply_mask(key, &mut a);
            apply_mask4(key, &mut b[beg..]);
            assert_eq!(&a[..], &b[beg..]);
        }
    }

    #[test]
    fn mask_source() {
        let mut fixed = FixedMask([1, 2, 3, 4]);
        assert_eq!(fixed.next_key(), [1, 2, 3, 4]);
        assert_eq!(fixed.next_key(), [1, 2, 3, 4]);
        // should not panic
        RandMask.next_key();
    }
}
