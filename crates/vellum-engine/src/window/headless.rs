use crate::coords::{IntRect, Size};

use super::{Hotkey, WindowHandle};

/// In-process window with no OS surface.
///
/// Requests are recorded instead of performed.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    fullscreen: bool,
    cursor_visible: bool,
    blocked: [bool; 3],
    refresh_rate: Option<u32>,

    frames: u64,
    resize_requests: Vec<Size>,
    screen_changes: Vec<IntRect>,
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self {
            fullscreen: false,
            cursor_visible: true,
            blocked: [false; 3],
            refresh_rate: None,
            frames: 0,
            resize_requests: Vec::new(),
            screen_changes: Vec::new(),
        }
    }
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_rate(mut self, hz: u32) -> Self {
        self.refresh_rate = Some(hz);
        self
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resize_requests(&self) -> &[Size] {
        &self.resize_requests
    }

    pub fn screen_changes(&self) -> &[IntRect] {
        &self.screen_changes
    }
}

impl WindowHandle for HeadlessWindow {
    fn request_resize(&mut self, size: Size) {
        self.resize_requests.push(size);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    fn hotkey_blocked(&self, hotkey: Hotkey) -> bool {
        self.blocked[hotkey.index()]
    }

    fn set_hotkey_blocked(&mut self, hotkey: Hotkey, blocked: bool) {
        self.blocked[hotkey.index()] = blocked;
    }

    fn refresh_rate(&self) -> Option<u32> {
        self.refresh_rate
    }

    fn notify_frame(&mut self) {
        self.frames += 1;
    }

    fn notify_screen_change(&mut self, display: IntRect) {
        self.screen_changes.push(display);
    }
}
