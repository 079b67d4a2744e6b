//! Markers.
//!
//! Markers decide how frames are masked in each direction.
//!
//! A client masks every frame it writes with a fresh key and expects
//! unmasked frames from the server; a server does the opposite.
//! [`FrameCodec<Client>`](crate::frame::FrameCodec) therefore decodes
//! frames sent by a server, and `FrameCodec<Server>` decodes frames sent
//! by a client.
//!
//! Any type implements [`RoleHelper`] could be used as a codec direction.

mod client;
mod server;

pub use client::Client;
pub use server::Server;

use crate::frame::{Mask, MaskSource};

/// Client or Server marker.
pub trait RoleHelper {
    /// Whether frames read by this role must be masked.
    const MASK_READ: bool;

    /// Mask for the next frame written by this role.
    fn write_mask<M: MaskSource>(src: &mut M) -> Mask;
}
