use std::io;

/// Byte stream under a connection.
///
/// Reads are pushed into the connection by the owner of the transport,
/// see [`Connection::on_data`](super::Connection::on_data).
pub trait Transport {
    /// Take as many bytes as possible without blocking.
    ///
    /// `Ok(0)` or [`io::ErrorKind::WouldBlock`] stops the flush, the rest
    /// is kept and retried on the next [`Connection::flush`](super::Connection::flush).
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Release the stream. Called exactly once.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { (**self).write(buf) }

    #[inline]
    fn close(&mut self) { (**self).close() }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { (**self).write(buf) }

    #[inline]
    fn close(&mut self) { (**self).close() }
}
