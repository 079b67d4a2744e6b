use super::RoleHelper;
use crate::frame::{Mask, MaskSource};

/// Standard client using a new mask key for every frame.
#[derive(Debug, Clone, Copy)]
pub struct Client;

impl RoleHelper for Client {
    const MASK_READ: bool = false;

    #[inline]
    fn write_mask<M: MaskSource>(src: &mut M) -> Mask { Mask::Key(src.next_key()) }
}
