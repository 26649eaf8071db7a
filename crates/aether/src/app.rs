use std::time::{Duration, Instant};

use aether_config::SettingsStore;
use aether_core::{Capability, Slot};
use aether_layers::{DefaultLayerFactory, compiled_engines};
use aether_runtime::{AnimationLifecycleManager, Host, HostEvent};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Size},
    style::{Color, Stylize},
    text::Line,
};
use tracing::{debug, info, warn};

use crate::surface::{CellSurface, cell_center, size_for_cells};

/// Level change per key press.
const STEP: i32 = 5;

/// How long a status message stays up. Also the window for confirming a
/// reset.
const TOAST_DURATION: Duration = Duration::from_secs(3);

const ACCENT: Color = Color::Rgb(0, 229, 255);

/// A transient status message.
#[derive(Debug, Clone, PartialEq)]
struct Toast {
    message: String,
    until: Duration,
    error: bool,
}

/// The main application: two animation slots drawn over the terminal.
pub struct App {
    /// Is the application running?
    running: bool,
    show_help: bool,
    manager: AnimationLifecycleManager<CellSurface, DefaultLayerFactory>,
    store: SettingsStore,
    clock: Instant,
    frame_interval: Duration,
    next_frame: Duration,
    status: Option<Toast>,
    /// Index into the saved views.
    selected_view: usize,
    /// Deadline for the second `r` press.
    reset_armed_until: Option<Duration>,
}

impl App {
    pub fn new(store: SettingsStore, area: Size) -> Self {
        let config = store.config().clone();
        let size = size_for_cells(area.width, area.height);
        let engines = config.engines().intersect(compiled_engines());
        info!(?engines, "engines available");

        let manager = AnimationLifecycleManager::new(
            Host::new(engines, size),
            Some(CellSurface::new(size)),
            Some(CellSurface::new(size)),
            DefaultLayerFactory::new(),
            config.manager_config(),
        );

        Self {
            running: false,
            show_help: true,
            manager,
            store,
            clock: Instant::now(),
            frame_interval: config.frame_interval(),
            next_frame: Duration::ZERO,
            status: None,
            selected_view: 0,
            reset_armed_until: None,
        }
    }

    fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        self.manager.start(self.now());
        while self.running {
            self.tick();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }
        self.manager.shutdown();
        self.store.flush()?;
        Ok(())
    }

    /// Advance the layers once per frame interval.
    fn tick(&mut self) {
        let now = self.now();
        if now < self.next_frame {
            return;
        }
        self.next_frame = now + self.frame_interval;

        if self.status.as_ref().is_some_and(|toast| toast.until <= now) {
            self.status = None;
        }
        if let Some(err) = self.manager.sync_settings(&mut self.store, now).pop() {
            self.show_error(err.to_string());
        }
        self.manager.tick(now);
        if let Err(err) = self.store.flush_if_due(now) {
            warn!(error = %err, "failed to save settings");
            self.show_error(err.to_string());
        }
    }

    fn show(&mut self, message: impl Into<String>) {
        self.status = Some(Toast {
            message: message.into(),
            until: self.now() + TOAST_DURATION,
            error: false,
        });
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.status = Some(Toast {
            message: message.into(),
            until: self.now() + TOAST_DURATION,
            error: true,
        });
    }

    /// Renders the layers, background first, then the help line.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        for slot in Slot::ALL {
            if let Some(surface) = self.manager.surface(slot) {
                frame.render_widget(surface, area);
            }
        }

        let [_, status_area, help_area, views_area] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        match &self.status {
            Some(toast) if toast.error => {
                frame.render_widget(
                    Line::from(toast.message.as_str().red()).centered(),
                    status_area,
                );
            }
            Some(toast) => {
                frame.render_widget(
                    Line::from(toast.message.as_str().fg(ACCENT)).centered(),
                    status_area,
                );
            }
            None if self.show_help => frame.render_widget(self.status_line(), status_area),
            None => {}
        }
        if self.show_help {
            frame.render_widget(help_line(), help_area);
            frame.render_widget(views_help_line(), views_area);
        }
    }

    fn status_line(&self) -> Line<'static> {
        let levels = self.store.config().parameters;
        Line::from(vec![
            "fg ".dark_gray(),
            self.manager.active_kind(Slot::Foreground).to_string().fg(ACCENT),
            "  bg ".dark_gray(),
            self.manager.active_kind(Slot::Background).to_string().fg(ACCENT),
            "  density ".dark_gray(),
            levels.particle_density.to_string().fg(ACCENT),
            "  speed ".dark_gray(),
            levels.animation_speed.to_string().fg(ACCENT),
            "  intensity ".dark_gray(),
            levels.physics_intensity.to_string().fg(ACCENT),
            "  views ".dark_gray(),
            self.store.views().len().to_string().fg(ACCENT),
        ])
        .centered()
    }

    /// Waits for input until the next frame is due.
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        let timeout = self.next_frame.saturating_sub(self.now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(mouse) => self.on_mouse_event(mouse),
                Event::Resize(columns, rows) => self.manager.resize(size_for_cells(columns, rows)),
                Event::FocusLost => self.manager.dispatch(HostEvent::PointerLeft),
                _ => {}
            }
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('f')) => self.cycle_layer(Slot::Foreground),
            (_, KeyCode::Char('b')) => self.cycle_layer(Slot::Background),
            (_, KeyCode::Char('1')) => self.adjust(Capability::Density, -STEP),
            (_, KeyCode::Char('2')) => self.adjust(Capability::Density, STEP),
            (_, KeyCode::Char('3')) => self.adjust(Capability::Speed, -STEP),
            (_, KeyCode::Char('4')) => self.adjust(Capability::Speed, STEP),
            (_, KeyCode::Char('5')) => self.adjust(Capability::Intensity, -STEP),
            (_, KeyCode::Char('6')) => self.adjust(Capability::Intensity, STEP),
            (_, KeyCode::Char('h')) => self.show_help = !self.show_help,
            (_, KeyCode::Char('v')) => self.save_view(),
            (_, KeyCode::Char('g')) => self.load_view(self.selected_view),
            (_, KeyCode::Char('[')) => self.step_view(-1),
            (_, KeyCode::Char(']')) => self.step_view(1),
            (_, KeyCode::Char('x')) => self.delete_view(),
            (_, KeyCode::Char('r')) => self.reset(),
            _ => {}
        }
    }

    fn on_mouse_event(&mut self, mouse: MouseEvent) {
        let at = cell_center(mouse.column, mouse.row);
        let event = match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => HostEvent::PointerMoved(at),
            MouseEventKind::Down(MouseButton::Left) => HostEvent::PointerPressed(at),
            MouseEventKind::Up(MouseButton::Left) => HostEvent::PointerReleased,
            _ => return,
        };
        self.manager.dispatch(event);
    }

    fn save_view(&mut self) {
        let Some(camera) = self.manager.camera_state() else {
            self.show_error("no camera to save; switch a slot to orbital");
            return;
        };
        let now = self.now();
        let name = self.store.save_view(camera, now).name.clone();
        self.selected_view = 0;
        self.show(format!("saved {name}"));
    }

    fn load_view(&mut self, index: usize) {
        let Some(view) = self.store.views().get(index).cloned() else {
            self.show_error("no saved views");
            return;
        };
        self.selected_view = index;
        if self.manager.restore_camera(view.camera) {
            self.show(format!("moved to {}", view.name));
        } else {
            self.show_error(format!("no camera to move to {}", view.name));
        }
    }

    fn step_view(&mut self, delta: isize) {
        let count = self.store.views().len();
        if count == 0 {
            self.show_error("no saved views");
            return;
        }
        let next = (self.selected_view as isize + delta).rem_euclid(count as isize);
        self.load_view(next as usize);
    }

    fn delete_view(&mut self) {
        let now = self.now();
        match self.store.delete_view(self.selected_view, now) {
            Some(view) => {
                let remaining = self.store.views().len();
                self.selected_view = self.selected_view.min(remaining.saturating_sub(1));
                self.show(format!("deleted {}", view.name));
            }
            None => self.show_error("no saved views"),
        }
    }

    /// Reset needs a second press within [`TOAST_DURATION`].
    fn reset(&mut self) {
        let now = self.now();
        match self.reset_armed_until.take() {
            Some(deadline) if now < deadline => {
                self.store.reset(now);
                self.show("settings reset to defaults");
            }
            _ => {
                debug!("reset armed");
                self.reset_armed_until = Some(now + TOAST_DURATION);
                self.show("press r again to reset settings");
            }
        }
    }

    /// Select the next kind for a slot, starting from the stored selection
    /// so a kind that failed to start is skipped on the next press.
    fn cycle_layer(&mut self, slot: Slot) {
        let current = self.store.config().settings().kind(slot);
        let now = self.now();
        self.store.set_layer(slot, current.next(), now);
        self.status = None;
    }

    fn adjust(&mut self, capability: Capability, delta: i32) {
        let now = self.now();
        self.store.adjust(capability, delta, now);
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

fn help_line() -> Line<'static> {
    Line::from(vec![
        "q".bold().fg(ACCENT),
        " quit  ".dark_gray(),
        "f/b".bold().fg(ACCENT),
        " cycle layers  ".dark_gray(),
        "1/2".bold().fg(ACCENT),
        " density  ".dark_gray(),
        "3/4".bold().fg(ACCENT),
        " speed  ".dark_gray(),
        "5/6".bold().fg(ACCENT),
        " intensity  ".dark_gray(),
        "h".bold().fg(ACCENT),
        " help".dark_gray(),
    ])
    .centered()
}

fn views_help_line() -> Line<'static> {
    Line::from(vec![
        "v".bold().fg(ACCENT),
        " save view  ".dark_gray(),
        "g".bold().fg(ACCENT),
        " go to view  ".dark_gray(),
        "[/]".bold().fg(ACCENT),
        " previous/next view  ".dark_gray(),
        "x".bold().fg(ACCENT),
        " delete view  ".dark_gray(),
        "r r".bold().fg(ACCENT),
        " reset".dark_gray(),
    ])
    .centered()
}
