use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use vellum_engine::coords::{Color, IntRect};
use vellum_engine::logging::{LoggingConfig, init_logging};
use vellum_engine::registry::Handle;
use vellum_engine::scene::{ColorPlane, ScreenTone, Tone, ViewportEffects};
use vellum_engine::window::WindowedGraphics;
use vellum_engine::{GraphicsConfig, GraphicsResult, Runtime};

/// Demo player for the vellum graphics core.
#[derive(Debug, Parser)]
#[command(name = "vellum-player", version, about)]
struct Args {
    /// Graphics config (TOML). Defaults apply for missing fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "vellum_engine=debug". Overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,

    /// Grayscale transition map used between scenes.
    #[arg(long)]
    transition_map: Option<PathBuf>,

    /// Save a screenshot after the first scene change.
    #[arg(long)]
    screenshot: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let config = match &args.config {
        Some(path) => GraphicsConfig::load(path)?,
        None => GraphicsConfig::default(),
    };
    info!("starting vellum-player ({}x{})", config.start_width, config.start_height);

    let mut demo = Demo::new(args.transition_map, args.screenshot);
    Runtime::run(config, move |graphics| demo.run(graphics))
}

const PALETTE: [Color; 3] = [
    Color::new(0.08, 0.10, 0.22, 1.0),
    Color::new(0.25, 0.08, 0.12, 1.0),
    Color::new(0.06, 0.20, 0.12, 1.0),
];

/// Bouncing box over a background that changes with a transition every few
/// seconds. Restarts from scratch after a soft reset.
struct Demo {
    transition_map: Option<PathBuf>,
    screenshot: bool,
}

impl Demo {
    fn new(transition_map: Option<PathBuf>, screenshot: bool) -> Self {
        Self { transition_map, screenshot }
    }

    fn run(&mut self, graphics: &mut WindowedGraphics) -> GraphicsResult<()> {
        let (width, height) = (graphics.width() as i32, graphics.height() as i32);

        let mut background = graphics
            .scene_mut()
            .insert(Box::new(ColorPlane::full_screen(PALETTE[0], 0)));
        let mut sprite: Option<Handle> = None;
        let (mut x, mut y, mut dx, mut dy) = (0, 0, 3, 2);

        graphics.set_brightness(0);
        let mut scene = 0usize;
        let mut frame = 0u32;

        loop {
            if let Some(handle) = sprite.take() {
                graphics.scene_mut().remove(handle);
            }
            x += dx;
            y += dy;
            if x <= 0 || x + 48 >= width {
                dx = -dx;
            }
            if y <= 0 || y + 48 >= height {
                dy = -dy;
            }
            sprite = Some(graphics.scene_mut().insert(Box::new(ColorPlane::new(
                Some(IntRect::new(x, y, 48, 48)),
                Color::new(0.95, 0.80, 0.30, 1.0),
                10,
            ))));

            if frame == 0 {
                graphics.fadein(30)?;
            } else {
                graphics.update()?;
            }
            frame += 1;

            if frame % 240 == 0 {
                scene = (scene + 1) % PALETTE.len();

                graphics.freeze()?;
                graphics.scene_mut().remove(background);
                background = graphics
                    .scene_mut()
                    .insert(Box::new(ColorPlane::full_screen(PALETTE[scene], 0)));

                // Every third scene is shown through a gray tone.
                let tone = (scene == 2).then(|| {
                    graphics.scene_mut().insert(Box::new(ScreenTone::new(
                        None,
                        ViewportEffects {
                            tone: Tone::new(0.0, 0.0, 0.0, 0.6),
                            ..ViewportEffects::default()
                        },
                        20,
                    )))
                });

                graphics.transition(40, self.transition_map.as_deref(), 40)?;
                if let Some(tone) = tone {
                    graphics.wait(60)?;
                    graphics.scene_mut().remove(tone);
                }

                if self.screenshot {
                    self.screenshot = false;
                    match graphics.save_screenshot() {
                        Ok(path) => info!("wrote {}", path.display()),
                        Err(err) => warn!("screenshot failed: {err}"),
                    }
                }
            }
        }
    }
}
