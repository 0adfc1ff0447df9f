//! N-body sandbox, plane view
//!
//! Controls:
//! - Scroll: Zoom in/out
//! - Arrow keys / WASD: Pan camera
//! - Space: Pause/resume
//! - N: Single tick while paused
//! - R: Restart from the configuration
//! - +/-: Double/halve playback speed
//! - C: Toggle the anchor body
//! - M: Toggle merge mode
//! - [/]: Halve/double gravity
//! - T: Toggle trails
//! - P: Preview where everything is heading
//! - F: Frame the largest body
//! - L: Log the largest bodies
//! - E: Export a snapshot

mod renderer;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use common::{Camera2D, GraphicsContext};
use glam::{DVec2, Vec2};
use nbody_sandbox::config::{MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED};
use nbody_sandbox::{Prediction, Scheduler, SimEvent, SimulationConfig, Snapshot};
use renderer::Renderer;
use winit::{
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

const MAX_PARTICLES: usize = 4096;
const MAX_TRAIL_VERTICES: usize = 1 << 20;
const INFO_PANEL_ROWS: usize = 13;

#[derive(Parser, Debug)]
#[command(name = "nbody_sandbox", about = "Interactive N-body gravity sandbox")]
struct Args {
    /// JSON file with a full simulation configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exported snapshot to seed a sandbox run from
    #[arg(long)]
    sandbox: Option<PathBuf>,

    /// Number of random bodies
    #[arg(long)]
    bodies: Option<usize>,

    /// RNG seed for a reproducible field
    #[arg(long)]
    seed: Option<u64>,

    /// Initial playback speed
    #[arg(long)]
    speed: Option<f64>,

    /// Grow bodies when they merge
    #[arg(long)]
    merge: bool,

    /// Where `E` writes snapshots
    #[arg(long, default_value = "snapshot.json")]
    export: PathBuf,
}

impl Args {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimulationConfig::plane(),
        };
        if let Some(path) = &self.sandbox {
            let snapshot = Snapshot::load(path).with_context(|| format!("loading {}", path.display()))?;
            config = config.with_snapshot(snapshot);
        }
        if let Some(bodies) = self.bodies {
            config.initial_body_count = bodies;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(speed) = self.speed {
            config.playback_speed = speed;
        }
        config.merge_mode |= self.merge;
        Ok(config)
    }
}

struct App {
    ctx: GraphicsContext,
    renderer: Renderer,
    scheduler: Scheduler<DVec2>,
    camera: Camera2D,
    preview: Option<Prediction<DVec2>>,
    show_trails: bool,
    export_path: PathBuf,
}

impl App {
    fn new(ctx: GraphicsContext, config: SimulationConfig, export_path: PathBuf) -> Result<Self> {
        let renderer = Renderer::new(&ctx, MAX_PARTICLES, MAX_TRAIL_VERTICES);
        let mut camera = Camera2D::new(ctx.aspect_ratio()).with_zoom_limits(10.0, 20_000.0);
        camera.frame(Vec2::ZERO, config.spawn_extent as f32 * 1.1);

        let mut scheduler = Scheduler::new(config)?;
        scheduler.start(true, None)?;

        let app = Self {
            ctx,
            renderer,
            scheduler,
            camera,
            preview: None,
            show_trails: true,
            export_path,
        };
        app.refresh_title();
        Ok(app)
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn update(&mut self, elapsed: std::time::Duration) {
        let report = self.scheduler.advance(elapsed);
        let events = self.scheduler.drain_events();
        // A preview is only meaningful for the bodies it was computed from
        let population_changed = events
            .iter()
            .any(|e| matches!(e, SimEvent::Created(_) | SimEvent::Removed { .. }));
        if population_changed {
            self.preview = None;
        }
        if report.ticks > 0 || population_changed {
            self.refresh_title();
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        let geometry = self.renderer.update_bodies(
            &self.ctx.queue,
            self.scheduler.stars(),
            self.preview.as_ref(),
            self.show_trails,
        );

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view, &geometry);

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        let outcome = match key {
            KeyCode::Space => {
                self.scheduler.toggle_pause();
                Ok(())
            }
            KeyCode::KeyN => self.scheduler.tick().map(|_| ()),
            KeyCode::KeyR => {
                self.preview = None;
                self.scheduler.restart()
            }
            KeyCode::Equal | KeyCode::NumpadAdd => self.scale_speed(2.0),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.scale_speed(0.5),
            KeyCode::KeyC => {
                let enable = self.scheduler.config().disable_anchor;
                self.scheduler.set_anchor_enabled(enable)
            }
            KeyCode::KeyM => {
                let merge = !self.scheduler.config().merge_mode;
                self.scheduler.set_merge_mode(merge);
                log::info!("merge mode {}", if merge { "on" } else { "off" });
                Ok(())
            }
            KeyCode::BracketLeft => self.scale_gravity(0.5),
            KeyCode::BracketRight => self.scale_gravity(2.0),
            KeyCode::KeyT => {
                self.show_trails = !self.show_trails;
                Ok(())
            }
            KeyCode::KeyP => self.toggle_preview(),
            KeyCode::KeyF => {
                if let Some(star) = self.scheduler.largest(1).first() {
                    let target = Vec2::new(star.position.x as f32, star.position.y as f32);
                    self.camera.frame(target, self.camera.zoom);
                }
                Ok(())
            }
            KeyCode::KeyL => {
                for star in self.scheduler.largest(INFO_PANEL_ROWS) {
                    log::info!(
                        "{:>6}  size {:>8.3}  speed {:>8.3}  at ({:.1}, {:.1})",
                        star.id.to_string(),
                        star.size(),
                        star.speed(),
                        star.position.x,
                        star.position.y
                    );
                }
                Ok(())
            }
            KeyCode::KeyE => self.export(),
            KeyCode::ArrowUp | KeyCode::KeyW => {
                self.camera.pan(Vec2::Y, 0.1);
                Ok(())
            }
            KeyCode::ArrowDown | KeyCode::KeyS => {
                self.camera.pan(Vec2::NEG_Y, 0.1);
                Ok(())
            }
            KeyCode::ArrowLeft | KeyCode::KeyA => {
                self.camera.pan(Vec2::NEG_X, 0.1);
                Ok(())
            }
            KeyCode::ArrowRight | KeyCode::KeyD => {
                self.camera.pan(Vec2::X, 0.1);
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            log::warn!("{key:?} failed: {err}");
        }
        self.refresh_title();
    }

    fn scale_speed(&mut self, factor: f64) -> nbody_sandbox::SimResult<()> {
        let speed = (self.scheduler.config().playback_speed * factor)
            .clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        self.scheduler.set_playback_speed(speed)
    }

    fn scale_gravity(&mut self, factor: f64) -> nbody_sandbox::SimResult<()> {
        let g = self.scheduler.config().gravity_scale * factor;
        self.scheduler.set_gravity_scale(g)?;
        self.preview = None;
        log::info!("gravity scale {g}");
        Ok(())
    }

    fn toggle_preview(&mut self) -> nbody_sandbox::SimResult<()> {
        if self.preview.take().is_none() {
            let prediction = self.scheduler.predict(None)?;
            log::info!(
                "preview: {} bodies survive {} ticks, {} collide",
                prediction.survivors.len(),
                prediction.ticks,
                prediction.destroyed.len()
            );
            self.preview = Some(prediction);
        }
        Ok(())
    }

    fn export(&self) -> nbody_sandbox::SimResult<()> {
        self.scheduler.export_snapshot().save(&self.export_path)?;
        log::info!("snapshot written to {}", self.export_path.display());
        Ok(())
    }

    fn refresh_title(&self) {
        let state = match self.scheduler.state() {
            nbody_sandbox::RunState::Running => "running",
            nbody_sandbox::RunState::Paused => "paused",
            nbody_sandbox::RunState::Stopped => "stopped",
        };
        self.ctx.window.set_title(&format!(
            "N-body Sandbox - {} bodies - tick {} - {}x - {state}",
            self.scheduler.stars().len(),
            self.scheduler.tick_count(),
            self.scheduler.config().playback_speed,
        ));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.simulation_config()?;

    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new("N-body Sandbox", 1280, 720))?;

    let mut app = App::new(ctx, config, args.export)?;
    let mut last_time = Instant::now();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => app.resize(size),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key),
                            state,
                            ..
                        },
                    ..
                } => app.handle_key(key, state),
                WindowEvent::MouseWheel { delta, .. } => {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                    };
                    app.camera.zoom_by(scroll);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let elapsed = now - last_time;
                    last_time = now;

                    app.update(elapsed);
                    match app.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                        Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                        Err(e) => log::error!("render error: {e:?}"),
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                app.ctx.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
