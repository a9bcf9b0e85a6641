/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; presentation may resume next frame.
    Reconfigured,
    /// Transient error; drop the current window frame.
    SkipFrame,
    /// Fatal error (commonly OOM).
    Fatal,
}
