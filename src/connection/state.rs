/// Lifecycle of a connection.
///
/// ```text
/// Connecting -> Open -> Closing -> Closed
///      |          |         |
///      +----------+---------+----> Failed
/// ```
///
/// No transition leads back to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Upgrade request sent, waiting for the response.
    Connecting,
    Open,
    /// A close frame was sent or received.
    Closing,
    Closed,
    Failed,
}

impl State {
    /// Closed or Failed.
    #[inline]
    pub const fn is_terminal(&self) -> bool { matches!(self, State::Closed | State::Failed) }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            State::Connecting => "connecting",
            State::Open => "open",
            State::Closing => "closing",
            State::Closed => "closed",
            State::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
