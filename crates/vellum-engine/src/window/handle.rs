use crate::coords::{IntRect, Size};

/// Event-thread shortcuts that a game can switch off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Hotkey {
    /// Alt+Enter.
    Fullscreen,
    /// F12.
    Reset,
    /// F1.
    Settings,
}

impl Hotkey {
    pub const ALL: [Hotkey; 3] = [Hotkey::Fullscreen, Hotkey::Reset, Hotkey::Settings];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Hotkey::Fullscreen => 0,
            Hotkey::Reset => 1,
            Hotkey::Settings => 2,
        }
    }
}

/// What the render thread may ask of the window.
///
/// Requests are fire-and-forget: a resize is observed later through the resize
/// mailbox in `ThreadSignals`, like any user-driven resize.
pub trait WindowHandle {
    fn request_resize(&mut self, size: Size);

    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&mut self, fullscreen: bool);

    fn cursor_visible(&self) -> bool;
    fn set_cursor_visible(&mut self, visible: bool);

    fn hotkey_blocked(&self, hotkey: Hotkey) -> bool;
    fn set_hotkey_blocked(&mut self, hotkey: Hotkey, blocked: bool);

    /// Display refresh rate in Hz, if the platform reports one.
    fn refresh_rate(&self) -> Option<u32>;

    /// Called once per presented frame.
    fn notify_frame(&mut self);

    /// The letterboxed display rectangle changed (window coordinates).
    fn notify_screen_change(&mut self, display: IntRect);
}
