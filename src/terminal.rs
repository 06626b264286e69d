// SPDX-License-Identifier: GPL-3.0-only

//! Terminal polaroid screen
//!
//! Hosts a [`Screen`] in the terminal. The polaroid frame and the camera
//! viewfinder are drawn with Unicode half-block characters for improved
//! vertical resolution; the entrance animation fades and grows the frame.

use crate::animation::AnimationFrame;
use crate::app::{CameraFacing, DisplayKey, Message, Notice, ViewMode};
use crate::backends::virtual_camera::render_test_pattern;
use crate::config::Config;
use crate::constants::{app_info, timing};
use crate::permissions::Capability;
use crate::runtime::{LogNotifier, Notifier, Screen};
use crate::storage::path_from_uri;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::{Rgb, RgbImage};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info};

const BACKDROP: [u8; 3] = [24, 24, 28];
const PAPER: [u8; 3] = [250, 248, 240];
const INK: [u8; 3] = [70, 70, 70];

/// Notices stay in the status bar this long
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Viewfinder resolution, terminals cannot show more anyway
const VIEWFINDER_SIZE: (u32, u32) = (160, 120);

/// Run the terminal polaroid screen
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Input polling blocks this thread, backend futures progress on the workers
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Keeps the latest notice for the status bar, and logs every notice
#[derive(Default)]
struct StatusNotifier {
    latest: Mutex<Option<(Notice, Instant)>>,
}

impl StatusNotifier {
    fn current(&self) -> Option<Notice> {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTICE_TTL)
            .map(|(notice, _)| notice.clone())
    }

    fn dismiss(&self) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Notifier for StatusNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) =
            Some((notice.clone(), Instant::now()));
    }
}

/// Image shown in the polaroid, reloaded when the display key changes
struct FrameImage {
    key: Option<DisplayKey>,
    image: Option<RgbImage>,
}

impl FrameImage {
    fn new() -> Self {
        Self {
            key: None,
            image: None,
        }
    }

    fn refresh(&mut self, screen: &Screen, config: &Config) {
        let key = screen.state().display_key();
        if self.key == Some(key) {
            return;
        }
        self.key = Some(key);
        self.image = match screen.state().media() {
            Some(media) => load_uri(&media.uri),
            None => Some(load_placeholder(config)),
        };
    }
}

fn load_uri(uri: &str) -> Option<RgbImage> {
    let path = path_from_uri(uri)?;
    match image::open(&path) {
        Ok(image) => Some(image.to_rgb8()),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load image");
            None
        }
    }
}

fn load_placeholder(config: &Config) -> RgbImage {
    if let Some(path) = &config.placeholder_path {
        match image::open(path) {
            Ok(image) => return image.to_rgb8(),
            Err(e) => error!(path = %path.display(), error = %e, "Failed to load placeholder"),
        }
    }
    placeholder_pattern(120, 120)
}

/// Soft grey gradient with a lens ring
fn placeholder_pattern(width: u32, height: u32) -> RgbImage {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 * 0.25;
    RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f32 - cx, y as f32 - cy);
        let distance = (dx * dx + dy * dy).sqrt();
        if (distance - radius).abs() < 2.0 {
            return Rgb([150, 150, 155]);
        }
        let shade = 200 + (y * 40 / height.max(1)) as u8;
        Rgb([shade, shade, shade.saturating_add(4)])
    })
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = Arc::new(StatusNotifier::default());
    let mut screen = Screen::new(
        (&config).into(),
        crate::runtime::Backends::desktop(&config),
        notifier.clone(),
    );
    screen.start();

    let mut frame_image = FrameImage::new();
    let mut show_help = false;

    loop {
        screen.poll_completions();
        frame_image.refresh(&screen, &config);

        let status = match notifier.current() {
            Some(notice) => format!("{}: {}", notice.title(), notice),
            None if show_help => build_help_message(screen.state().mode()),
            None => build_status_message(&screen),
        };

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let content_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            let status_area = Rect {
                y: area.y + area.height.saturating_sub(1),
                height: 1,
                ..area
            };

            match screen.state().mode() {
                ViewMode::Onboarding => f.render_widget(
                    Centered("Checking permissions..."),
                    content_area,
                ),
                ViewMode::Denied => f.render_widget(
                    Centered("Gallery access denied. Press 'r' to ask again."),
                    content_area,
                ),
                ViewMode::CameraActive => f.render_widget(
                    Viewfinder {
                        facing: screen.state().facing(),
                        elapsed: screen.now(),
                        capturing: screen.state().is_capturing(),
                    },
                    content_area,
                ),
                ViewMode::Preview => f.render_widget(
                    PolaroidWidget {
                        image: frame_image.image.as_ref(),
                        caption: caption(&screen),
                        frame: screen.frame(),
                    },
                    content_area,
                ),
            }

            f.render_widget(StatusBar { message: &status }, status_area);
        })?;

        // Handle input with timeout for animation frames
        if event::poll(timing::TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            let mode = screen.state().mode();
            let message = match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    None
                }
                KeyCode::Esc if mode == ViewMode::CameraActive => Some(Message::CloseCamera),
                KeyCode::Esc => {
                    notifier.dismiss();
                    None
                }
                KeyCode::Char('c') => Some(Message::OpenCamera),
                KeyCode::Char(' ') | KeyCode::Char('p') => Some(Message::Capture),
                KeyCode::Char('f') => Some(Message::ToggleFacing),
                KeyCode::Char('g') => Some(Message::PickFromGallery),
                KeyCode::Char('x') if mode == ViewMode::Preview => Some(Message::Clear),
                KeyCode::Char('s') => Some(Message::SavePhoto),
                KeyCode::Char('r') => Some(Message::RetryPermissions),
                _ => None,
            };

            if let Some(message) = message {
                show_help = false;
                screen.dispatch(message);
            }
        }
    }

    info!("Terminal screen closed");
    Ok(())
}

fn caption(screen: &Screen) -> &'static str {
    let state = screen.state();
    if state.saving().is_saving() {
        "Saving..."
    } else if state.is_picking() {
        "Opening gallery..."
    } else if state.media().is_none() {
        "Polaroid"
    } else if state.can_save() {
        "Press 's' to save"
    } else {
        ""
    }
}

fn build_status_message(screen: &Screen) -> String {
    let state = screen.state();
    let mut parts: Vec<&str> = Vec::new();
    match state.mode() {
        ViewMode::Onboarding => {}
        ViewMode::Denied => {
            parts.push("'r' retry");
            if state.permissions().is_granted(Capability::Camera) {
                parts.push("'c' camera");
            }
        }
        ViewMode::CameraActive => {
            parts.push("space capture");
            parts.push("'f' flip");
            parts.push("Esc close");
        }
        ViewMode::Preview => {
            parts.push("'c' camera");
            parts.push("'g' gallery");
            if state.media().is_some() {
                parts.push("'x' clear");
            }
            if state.can_save() {
                parts.push("'s' save");
            }
        }
    }
    parts.push("'h' help");
    parts.push("'q' quit");
    format!("{} | polaroid {}", parts.join(" | "), app_info::version())
}

fn build_help_message(mode: ViewMode) -> String {
    match mode {
        ViewMode::CameraActive => {
            "Space/p: Capture | f: Flip camera | Esc: Back | q/Ctrl+C: Quit".to_string()
        }
        _ => "c: Camera | g: Gallery | x: Clear | s: Save | r: Retry permissions | q/Ctrl+C: Quit"
            .to_string(),
    }
}

/// Blend `color` over the backdrop
fn blend(color: [u8; 3], opacity: f32) -> Color {
    let opacity = opacity.clamp(0.0, 1.0);
    let mix = |c: u8, b: u8| (b as f32 + (c as f32 - b as f32) * opacity).round() as u8;
    Color::Rgb(
        mix(color[0], BACKDROP[0]),
        mix(color[1], BACKDROP[1]),
        mix(color[2], BACKDROP[2]),
    )
}

/// Largest size with the image's aspect ratio inside `max_w` x `max_h` pixels
fn fit_within(image_w: u32, image_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if image_w == 0 || image_h == 0 || max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    let aspect = image_w as f64 / image_h as f64;
    if max_w as f64 / max_h as f64 > aspect {
        ((max_h as f64 * aspect) as u32, max_h)
    } else {
        (max_w, (max_w as f64 / aspect) as u32)
    }
}

/// Draw `image` with half-blocks into a `cells_w` x `cells_h` box at (x, y)
#[allow(clippy::too_many_arguments)]
fn draw_half_blocks(
    buf: &mut Buffer,
    clip: Rect,
    image: &RgbImage,
    x: u16,
    y: u16,
    cells_w: u16,
    cells_h: u16,
    opacity: f32,
) {
    if cells_w == 0 || cells_h == 0 {
        return;
    }
    let x_scale = image.width() as f64 / cells_w as f64;
    let y_scale = image.height() as f64 / (cells_h as f64 * 2.0);

    // Upper half (▀) colored with fg, lower half with bg
    for ty in 0..cells_h {
        for tx in 0..cells_w {
            let (term_x, term_y) = (x + tx, y + ty);
            if term_x >= clip.x + clip.width || term_y >= clip.y + clip.height {
                continue;
            }

            let src_x = ((tx as f64 * x_scale) as u32).min(image.width() - 1);
            let src_top = ((ty as f64 * 2.0 * y_scale) as u32).min(image.height() - 1);
            let src_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(image.height() - 1);

            if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                cell.set_char('▀');
                cell.set_fg(blend(image.get_pixel(src_x, src_top).0, opacity));
                cell.set_bg(blend(image.get_pixel(src_x, src_bottom).0, opacity));
            }
        }
    }
}

fn fill(buf: &mut Buffer, area: Rect, color: Color) {
    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(' ');
                cell.set_bg(color);
            }
        }
    }
}

fn centered_text(buf: &mut Buffer, area: Rect, y: u16, text: &str, style: Style) {
    let text: String = text.chars().take(area.width as usize).collect();
    let x = area.x + area.width.saturating_sub(text.chars().count() as u16) / 2;
    if y < area.y + area.height {
        buf.set_string(x, y, text, style);
    }
}

/// One line of text in the middle of the area
struct Centered(&'static str);

impl Widget for Centered {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(buf, area, blend(BACKDROP, 1.0));
        let y = area.y + area.height / 2;
        centered_text(buf, area, y, self.0, Style::default().fg(Color::White));
    }
}

/// The photo inside a white paper frame with a caption strip
struct PolaroidWidget<'a> {
    image: Option<&'a RgbImage>,
    caption: &'a str,
    frame: AnimationFrame,
}

impl Widget for PolaroidWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(buf, area, blend(BACKDROP, 1.0));

        // 1 cell of paper on the sides and top, 3 rows below for the caption
        let max_w = area.width.saturating_sub(4) as u32;
        let max_h = area.height.saturating_sub(6) as u32 * 2;
        let (image_w, image_h) = self
            .image
            .map(|image| (image.width(), image.height()))
            .unwrap_or((4, 3));
        let (fit_w, fit_h) = fit_within(image_w, image_h, max_w, max_h);

        let scale = self.frame.scale.clamp(0.0, 1.0);
        let cells_w = (fit_w as f32 * scale).round() as u16;
        let cells_h = (fit_h as f32 * scale / 2.0).round() as u16;
        if cells_w == 0 || cells_h == 0 {
            return;
        }

        let frame_w = cells_w + 2;
        let frame_h = cells_h + 4;
        let frame_area = Rect {
            x: area.x + area.width.saturating_sub(frame_w) / 2,
            y: area.y + area.height.saturating_sub(frame_h) / 2,
            width: frame_w.min(area.width),
            height: frame_h.min(area.height),
        };
        fill(buf, frame_area, blend(PAPER, self.frame.opacity));

        let (photo_x, photo_y) = (frame_area.x + 1, frame_area.y + 1);
        match self.image {
            Some(image) => draw_half_blocks(
                buf,
                area,
                image,
                photo_x,
                photo_y,
                cells_w,
                cells_h,
                self.frame.opacity,
            ),
            None => {
                let photo = Rect::new(photo_x, photo_y, cells_w, cells_h).intersection(area);
                fill(buf, photo, blend(INK, self.frame.opacity));
                centered_text(
                    buf,
                    photo,
                    photo.y + photo.height / 2,
                    "Cannot display image",
                    Style::default().fg(Color::White),
                );
            }
        }

        let caption_y = frame_area.y + 1 + cells_h + 1;
        centered_text(
            buf,
            frame_area,
            caption_y,
            self.caption,
            Style::default()
                .fg(blend(INK, self.frame.opacity))
                .bg(blend(PAPER, self.frame.opacity)),
        );
    }
}

/// Live view of the virtual camera
struct Viewfinder {
    facing: CameraFacing,
    elapsed: Duration,
    capturing: bool,
}

impl Widget for Viewfinder {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(buf, area, Color::Black);

        let phase = (self.elapsed.as_millis() % 1000) as f32 / 1000.0;
        let (width, height) = VIEWFINDER_SIZE;
        let image = render_test_pattern(width, height, self.facing, phase);

        let (fit_w, fit_h) = fit_within(
            width,
            height,
            area.width as u32,
            area.height.saturating_sub(1) as u32 * 2,
        );
        let cells_w = fit_w as u16;
        let cells_h = (fit_h / 2) as u16;
        let x = area.x + area.width.saturating_sub(cells_w) / 2;
        let y = area.y;
        draw_half_blocks(buf, area, &image, x, y, cells_w, cells_h, 1.0);

        let label = if self.capturing {
            "Capturing...".to_string()
        } else {
            format!("{} camera", self.facing)
        };
        centered_text(
            buf,
            area,
            area.y + area.height.saturating_sub(1),
            &label,
            Style::default().fg(Color::White),
        );
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(buf, area, Color::DarkGray);
        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
