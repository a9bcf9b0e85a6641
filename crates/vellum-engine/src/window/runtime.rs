use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::GraphicsConfig;
use crate::coords::{IntRect, Size};
use crate::core::{EngineCtx, GraphicsError, GraphicsResult};
use crate::graphics::Graphics;
use crate::render::WgpuBackend;
use crate::sync::ThreadSignals;
use crate::time::FpsCounter;

use super::{Hotkey, WindowHandle};

/// Facade type handed to the game closure by [`Runtime::run`].
pub type WindowedGraphics = Graphics<WgpuBackend, WinitWindow>;

/// Requests from the game thread, applied on the event thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeEvent {
    Resize(Size),
    Fullscreen(bool),
    CursorVisible(bool),
    ScreenChanged(IntRect),
    GameExited,
}

/// State both threads read without a round-trip through the event loop.
#[derive(Debug)]
struct SharedWindowState {
    fullscreen: AtomicBool,
    cursor_visible: AtomicBool,
    blocked: [AtomicBool; 3],
    frames: AtomicU64,
}

impl Default for SharedWindowState {
    fn default() -> Self {
        Self {
            fullscreen: AtomicBool::new(false),
            cursor_visible: AtomicBool::new(true),
            blocked: Default::default(),
            frames: AtomicU64::new(0),
        }
    }
}

impl SharedWindowState {
    fn blocked(&self, hotkey: Hotkey) -> bool {
        self.blocked[hotkey.index()].load(Ordering::Relaxed)
    }
}

/// Game-thread handle to the winit window.
pub struct WinitWindow {
    proxy: EventLoopProxy<RuntimeEvent>,
    shared: Arc<SharedWindowState>,
    refresh_rate: Option<u32>,
}

impl WinitWindow {
    fn send(&self, event: RuntimeEvent) {
        if self.proxy.send_event(event).is_err() {
            debug!("event loop closed; dropping {event:?}");
        }
    }
}

impl WindowHandle for WinitWindow {
    fn request_resize(&mut self, size: Size) {
        self.send(RuntimeEvent::Resize(size));
    }

    fn is_fullscreen(&self) -> bool {
        self.shared.fullscreen.load(Ordering::Relaxed)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.shared.fullscreen.store(fullscreen, Ordering::Relaxed);
        self.send(RuntimeEvent::Fullscreen(fullscreen));
    }

    fn cursor_visible(&self) -> bool {
        self.shared.cursor_visible.load(Ordering::Relaxed)
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.shared.cursor_visible.store(visible, Ordering::Relaxed);
        self.send(RuntimeEvent::CursorVisible(visible));
    }

    fn hotkey_blocked(&self, hotkey: Hotkey) -> bool {
        self.shared.blocked(hotkey)
    }

    fn set_hotkey_blocked(&mut self, hotkey: Hotkey, blocked: bool) {
        self.shared.blocked[hotkey.index()].store(blocked, Ordering::Relaxed);
    }

    fn refresh_rate(&self) -> Option<u32> {
        self.refresh_rate
    }

    fn notify_frame(&mut self) {
        self.shared.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn notify_screen_change(&mut self, display: IntRect) {
        self.send(RuntimeEvent::ScreenChanged(display));
    }
}

/// Entry point for the windowed runtime.
///
/// The event loop stays on the calling thread; the game closure runs on its own
/// thread and owns the `Graphics` facade. A soft reset (F12) unwinds the closure
/// with `GraphicsError::Reset`, resets the facade and calls the closure again.
pub struct Runtime;

impl Runtime {
    pub fn run<G>(config: GraphicsConfig, game: G) -> Result<()>
    where
        G: FnMut(&mut WindowedGraphics) -> GraphicsResult<()> + Send + 'static,
    {
        let event_loop = EventLoop::<RuntimeEvent>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;

        let proxy = event_loop.create_proxy();
        let signals = Arc::new(ThreadSignals::new());
        let mut state = AppState::new(config, Arc::clone(&signals), proxy, game);

        let result = event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error");

        state.join_game();
        result
    }
}

struct AppState<G> {
    config: GraphicsConfig,
    signals: Arc<ThreadSignals>,
    proxy: EventLoopProxy<RuntimeEvent>,
    shared: Arc<SharedWindowState>,

    game: Option<G>,
    game_thread: Option<JoinHandle<()>>,

    window: Option<Arc<Window>>,
    modifiers: ModifiersState,

    show_fps: bool,
    fps: FpsCounter,
}

impl<G> AppState<G>
where
    G: FnMut(&mut WindowedGraphics) -> GraphicsResult<()> + Send + 'static,
{
    fn new(
        config: GraphicsConfig,
        signals: Arc<ThreadSignals>,
        proxy: EventLoopProxy<RuntimeEvent>,
        game: G,
    ) -> Self {
        Self {
            config,
            signals,
            proxy,
            shared: Arc::new(SharedWindowState::default()),
            game: Some(game),
            game_thread: None,
            window: None,
            modifiers: ModifiersState::empty(),
            show_fps: false,
            fps: FpsCounter::new(Instant::now()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = self.config.window_size();
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(size.width, size.height));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let refresh_rate = window
            .current_monitor()
            .and_then(|m| m.refresh_rate_millihertz())
            .map(|mhz| (mhz + 500) / 1000);

        let backend = WgpuBackend::new(Arc::clone(&window), &self.config)?;
        let PhysicalSize { width, height } = window.inner_size();
        let window_size = Size::new(width.max(1), height.max(1));

        let handle = WinitWindow {
            proxy: self.proxy.clone(),
            shared: Arc::clone(&self.shared),
            refresh_rate,
        };
        let ctx = EngineCtx::with_system_timer(self.config.clone(), Arc::clone(&self.signals));
        let proxy = self.proxy.clone();
        let game = self.game.take().context("game already started")?;

        let thread = thread::Builder::new()
            .name("vellum-game".to_string())
            .spawn(move || game_main(ctx, backend, handle, window_size, game, proxy))
            .context("failed to spawn game thread")?;

        info!("runtime started ({}x{} window)", window_size.width, window_size.height);
        self.window = Some(window);
        self.game_thread = Some(thread);
        Ok(())
    }

    fn join_game(&mut self) {
        let Some(thread) = self.game_thread.take() else {
            return;
        };
        self.signals.request_terminate();
        if !self.signals.terminate_acknowledged() {
            debug!("waiting for game thread to stop");
        }
        if thread.join().is_err() {
            error!("game thread panicked");
        }
    }

    fn toggle_fullscreen(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let on = !self.shared.fullscreen.load(Ordering::Relaxed);
        self.shared.fullscreen.store(on, Ordering::Relaxed);
        window.set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::F12 if !self.shared.blocked(Hotkey::Reset) => {
                info!("reset requested from keyboard");
                self.signals.request_reset();
            }
            KeyCode::Enter
                if self.modifiers.alt_key() && !self.shared.blocked(Hotkey::Fullscreen) =>
            {
                self.toggle_fullscreen();
            }
            KeyCode::F1 if !self.shared.blocked(Hotkey::Settings) => {
                self.show_fps = !self.show_fps;
                if let Some(window) = &self.window {
                    if !self.show_fps {
                        window.set_title(&self.config.title);
                    }
                }
            }
            _ => {}
        }
    }
}

fn game_main<G>(
    ctx: EngineCtx,
    backend: WgpuBackend,
    window: WinitWindow,
    window_size: Size,
    mut game: G,
    proxy: EventLoopProxy<RuntimeEvent>,
) where
    G: FnMut(&mut WindowedGraphics) -> GraphicsResult<()>,
{
    let signals = Arc::clone(ctx.signals());

    match Graphics::new(ctx, backend, window, window_size) {
        Ok(mut graphics) => loop {
            match game(&mut graphics) {
                Ok(()) => {
                    info!("game finished");
                    break;
                }
                Err(GraphicsError::Shutdown) => {
                    info!("game stopped on shutdown request");
                    break;
                }
                Err(GraphicsError::Reset) => {
                    if let Err(err) = graphics.reset() {
                        error!("reset failed: {err}");
                        break;
                    }
                }
                Err(err) => {
                    error!("game loop failed: {err}");
                    break;
                }
            }
        },
        Err(err) => error!("failed to initialize graphics: {err}"),
    }

    signals.acknowledge_terminate();
    let _ = proxy.send_event(RuntimeEvent::GameExited);
}

impl<G> ApplicationHandler<RuntimeEvent> for AppState<G>
where
    G: FnMut(&mut WindowedGraphics) -> GraphicsResult<()> + Send + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.signals.sync.unlock();
            return;
        }

        if let Err(e) = self.start(event_loop) {
            error!("failed to start runtime: {e:#}");
            event_loop.exit();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        debug!("application suspended");
        self.signals.sync.lock();
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: RuntimeEvent) {
        match event {
            RuntimeEvent::GameExited => event_loop.exit(),
            RuntimeEvent::Resize(size) => {
                let Some(window) = &self.window else {
                    return;
                };
                // Some platforms resize synchronously and send no event.
                if let Some(applied) =
                    window.request_inner_size(PhysicalSize::new(size.width, size.height))
                {
                    self.signals.resize.post(Size::new(applied.width, applied.height));
                }
            }
            RuntimeEvent::Fullscreen(on) => {
                if let Some(window) = &self.window {
                    window.set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
                }
            }
            RuntimeEvent::CursorVisible(visible) => {
                if let Some(window) = &self.window {
                    window.set_cursor_visible(visible);
                }
            }
            RuntimeEvent::ScreenChanged(display) => {
                debug!(
                    "display area now {}x{} at ({}, {})",
                    display.w, display.h, display.x, display.y
                );
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested");
                self.signals.request_terminate();
            }
            WindowEvent::Resized(size) => {
                self.signals.resize.post(Size::new(size.width, size.height));
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.signals.resize.post(Size::new(size.width, size.height));
                }
            }
            WindowEvent::ModifiersChanged(m) => self.modifiers = m.state(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.on_key(code);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.show_fps {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        let now = Instant::now();
        let frames = self.shared.frames.load(Ordering::Relaxed);
        if let Some(fps) = self.fps.sample(frames, now) {
            match &self.window {
                Some(window) => window.set_title(&format!("{} - {fps:.0} FPS", self.config.title)),
                None => warn!("fps sample without a window"),
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.fps.deadline()));
    }
}
