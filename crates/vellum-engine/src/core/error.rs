use core::fmt;

/// Result alias for facade operations.
pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Error surfaced by facade operations.
///
/// `Shutdown` and `Reset` are cooperative control signals raised by the event
/// thread. They travel through `Result` so `?` unwinds the game loop, but no GPU
/// operation ever produces them.
#[derive(Debug)]
pub enum GraphicsError {
    /// Allocation, shader, readback or codec failure. Never retried.
    Backend(String),
    /// Termination was requested; the caller should leave its loop.
    Shutdown,
    /// A soft reset was requested; the caller should call `Graphics::reset`.
    Reset,
}

impl GraphicsError {
    #[inline]
    pub fn is_control_signal(&self) -> bool {
        matches!(self, GraphicsError::Shutdown | GraphicsError::Reset)
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::Backend(msg) => write!(f, "graphics backend error: {msg}"),
            GraphicsError::Shutdown => f.write_str("shutdown requested"),
            GraphicsError::Reset => f.write_str("reset requested"),
        }
    }
}

impl std::error::Error for GraphicsError {}

impl From<anyhow::Error> for GraphicsError {
    fn from(err: anyhow::Error) -> Self {
        GraphicsError::Backend(format!("{err:#}"))
    }
}
