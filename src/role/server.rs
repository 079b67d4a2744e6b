use super::RoleHelper;
use crate::frame::{Mask, MaskSource};

/// Standard server.
///
/// Only the codec direction is provided, there is no server endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Server;

impl RoleHelper for Server {
    const MASK_READ: bool = true;

    /// Server should not mask the payload.
    #[inline]
    fn write_mask<M: MaskSource>(_: &mut M) -> Mask { Mask::None }
}
