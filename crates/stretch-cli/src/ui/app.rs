use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use stretch_core::{CueSink, DisplaySink, PlaybackController, Routine};
use stretch_types::{DisplaySnapshot, Phase};

use crate::scheduler::ClockScheduler;
use crate::session::RoutineSource;

use super::render;

type TuiController = PlaybackController<FrameSink, Box<dyn CueSink>, ClockScheduler>;

const LOG_CAP: usize = 500;

/// Launch the TUI and drive the event loop until the user quits.
pub(crate) fn run_tui(
    source: RoutineSource,
    routine: Routine,
    cues: Box<dyn CueSink>,
    autostart: bool,
    log_rx: Receiver<String>,
) -> Result<()> {
    let controller =
        PlaybackController::new(routine, FrameSink::default(), cues, ClockScheduler::default());
    let mut app = App::new(controller, source, log_rx);
    if autostart {
        app.controller.start();
    }

    let mut term = init_terminal()?;
    let result = ui_loop(&mut term, &mut app);

    restore_terminal(&mut term)?;
    result
}

/// Display sink that keeps the most recent snapshot for the next frame.
#[derive(Default)]
pub(crate) struct FrameSink {
    latest: DisplaySnapshot,
}

impl DisplaySink for FrameSink {
    fn render(&mut self, snapshot: &DisplaySnapshot) {
        self.latest = snapshot.clone();
    }
}

/// In-memory UI state for rendering and interaction.
pub(crate) struct App {
    controller: TuiController,
    source: RoutineSource,
    pub(crate) status: String,
    pub(crate) help_open: bool,
    pub(crate) logs_open: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) logs_scroll: usize,
    last_status_snapshot: String,
    last_phase: Phase,
    log_rx: Receiver<String>,
}

impl App {
    fn new(controller: TuiController, source: RoutineSource, log_rx: Receiver<String>) -> Self {
        let last_phase = controller.phase();
        Self {
            controller,
            source,
            status: "Ready".into(),
            help_open: false,
            logs_open: false,
            logs: VecDeque::new(),
            logs_scroll: 0,
            last_status_snapshot: String::new(),
            last_phase,
            log_rx,
        }
    }

    /// Snapshot most recently pushed by the controller.
    pub(crate) fn frame(&self) -> &DisplaySnapshot {
        &self.controller.display().latest
    }

    pub(crate) fn source_label(&self) -> String {
        self.source.describe()
    }

    /// Apply one key press. Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.logs_open {
            match code {
                KeyCode::Char('q') => return true,
                KeyCode::Esc | KeyCode::Char('l') => self.toggle_logs(),
                KeyCode::Up => self.scroll_logs_up(),
                KeyCode::Down => self.scroll_logs_down(),
                _ => {}
            }
            return false;
        }
        if self.help_open {
            match code {
                KeyCode::Char('q') => return true,
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') => self.help_open = false,
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') | KeyCode::Char('s') => self.toggle(),
            KeyCode::Char('p') => self.pause(),
            KeyCode::Char('n') => self.skip(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('l') => self.toggle_logs(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.help_open = true,
            _ => {}
        }
        false
    }

    fn toggle(&mut self) {
        let controls = self.frame().controls;
        if controls.can_pause {
            self.pause();
        } else if controls.can_start {
            self.controller.start();
            self.status = "Running".into();
        } else {
            self.status = "Routine complete, press r to reset".into();
        }
    }

    fn pause(&mut self) {
        if self.frame().controls.can_pause {
            self.controller.pause();
            self.status = "Paused".into();
        }
    }

    fn skip(&mut self) {
        if !self.frame().controls.can_skip {
            self.status = "Nothing to skip".into();
            return;
        }
        let from = self.frame().title.clone();
        self.controller.skip();
        self.status = format!("Skipped {from}");
    }

    fn reset(&mut self) {
        if self.source.path.is_none() {
            self.controller.reset();
            self.status = "Reset".into();
            return;
        }
        match self.source.load() {
            Ok(routine) => {
                self.controller.reload(routine);
                self.status = format!("Reloaded {}", self.source.describe());
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "routine reload failed");
                self.controller.reset();
                self.status = format!("Reload failed, kept previous routine: {e:#}");
            }
        }
    }

    /// Deliver every tick that came due since the last frame.
    fn pump_ticks(&mut self) {
        let now = Instant::now();
        while self.controller.scheduler_mut().take_due(now) {
            self.controller.tick();
        }
        let phase = self.controller.phase();
        if phase != self.last_phase {
            if phase == Phase::Completed {
                self.status = "Routine complete".into();
            }
            self.last_phase = phase;
        }
    }

    fn toggle_logs(&mut self) {
        self.logs_open = !self.logs_open;
        if !self.logs_open {
            self.logs_scroll = 0;
        }
    }

    fn scroll_logs_up(&mut self) {
        let max = self.logs.len().saturating_sub(1);
        self.logs_scroll = (self.logs_scroll + 1).min(max);
    }

    fn scroll_logs_down(&mut self) {
        self.logs_scroll = self.logs_scroll.saturating_sub(1);
    }

    fn push_log_line(&mut self, line: String) {
        if self.logs.len() >= LOG_CAP {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    fn note_status_change(&mut self) {
        if self.last_status_snapshot == self.status {
            return;
        }
        self.last_status_snapshot = self.status.clone();
        self.push_log_line(format!(" UI: {}", self.status));
    }

    fn drain_logs(&mut self) {
        while let Ok(line) = self.log_rx.try_recv() {
            self.push_log_line(line);
        }
    }
}

fn ui_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let frame_interval = Duration::from_millis(33);

    loop {
        app.pump_ticks();
        app.drain_logs();
        app.note_status_change();
        terminal.draw(|f| render::draw(f, app))?;

        let wait = app
            .controller
            .scheduler()
            .until_due(Instant::now())
            .map_or(frame_interval, |d| d.min(frame_interval));
        if event::poll(wait).context("poll terminal events")? {
            if let CEvent::Key(k) = event::read().context("read terminal event")? {
                if k.kind == KeyEventKind::Press && app.handle_key(k.code) {
                    return Ok(());
                }
            }
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("create terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use crossbeam_channel::unbounded;
    use stretch_core::{ExerciseDef, ExerciseGroup, SilentCues};

    fn routine() -> Routine {
        Routine {
            groups: vec![ExerciseGroup::new(
                "Hips",
                vec![
                    ExerciseDef::new("Lunge", 3, false),
                    ExerciseDef::new("Squat", 3, false),
                ],
            )],
            buffer_seconds: 2,
        }
    }

    fn app_with(source: RoutineSource) -> App {
        let controller = PlaybackController::new(
            routine(),
            FrameSink::default(),
            Box::new(SilentCues) as Box<dyn CueSink>,
            ClockScheduler::default(),
        );
        let (_log_tx, log_rx) = unbounded::<String>();
        App::new(controller, source, log_rx)
    }

    fn app() -> App {
        app_with(RoutineSource::default())
    }

    #[test]
    fn initial_frame_is_pushed_on_construction() {
        let app = app();
        assert_eq!(app.frame().title, "Lunge");
        assert_eq!(app.frame().phase, Phase::Idle);
    }

    #[test]
    fn space_starts_and_pauses() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Char(' ')));
        assert_eq!(app.frame().phase, Phase::Running);
        assert!(app.controller.scheduler().is_active());

        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.frame().phase, Phase::Paused);
        assert!(!app.controller.scheduler().is_active());
        assert_eq!(app.status, "Paused");
    }

    #[test]
    fn skip_is_ignored_before_start() {
        let mut app = app();
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.frame().position, 1);
        assert_eq!(app.status, "Nothing to skip");
    }

    #[test]
    fn skip_while_running_moves_to_buffer() {
        let mut app = app();
        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.frame().position, 2);
        assert!(app.frame().is_buffer);
        assert_eq!(app.frame().phase, Phase::Running);
        assert_eq!(app.status, "Skipped Lunge");
    }

    #[test]
    fn reset_without_file_returns_to_idle() {
        let mut app = app();
        app.handle_key(KeyCode::Char(' '));
        app.controller.tick();
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.frame().phase, Phase::Idle);
        assert_eq!(app.frame().remaining, "0:03");
        assert_eq!(app.status, "Reset");
    }

    #[test]
    fn failed_reload_keeps_previous_routine() {
        let mut app = app_with(RoutineSource {
            path: Some(PathBuf::from("/nonexistent/routine.toml")),
            buffer_override: None,
        });
        app.handle_key(KeyCode::Char('r'));
        assert!(app.status.starts_with("Reload failed"));
        assert_eq!(app.frame().title, "Lunge");
        assert_eq!(app.frame().phase, Phase::Idle);
    }

    #[test]
    fn reset_reloads_an_edited_routine_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "buffer_seconds = 4\n\n[[groups]]\nlabel = \"Back\"\n\n[[groups.exercises]]\nname = \"Cobra\"\nduration_seconds = 20\n"
        )
        .unwrap();
        let source = RoutineSource {
            path: Some(file.path().to_path_buf()),
            buffer_override: None,
        };
        let routine = source.load().unwrap();
        let controller = PlaybackController::new(
            routine,
            FrameSink::default(),
            Box::new(SilentCues) as Box<dyn CueSink>,
            ClockScheduler::default(),
        );
        let (_log_tx, log_rx) = unbounded::<String>();
        let mut app = App::new(controller, source, log_rx);
        assert_eq!(app.frame().title, "Cobra");

        app.handle_key(KeyCode::Char(' '));
        app.controller.tick();

        std::fs::write(
            file.path(),
            "buffer_seconds = 5\n\n[[groups]]\nlabel = \"Legs\"\n\n[[groups.exercises]]\nname = \"Pigeon\"\nduration_seconds = 45\nmirrored = true\n\n[[groups.exercises]]\nname = \"Frog\"\nduration_seconds = 30\n",
        )
        .unwrap();
        app.handle_key(KeyCode::Char('r'));

        assert!(app.status.starts_with("Reloaded "));
        let frame = app.frame();
        assert_eq!(frame.phase, Phase::Idle);
        assert_eq!(frame.title, "Pigeon");
        assert_eq!(frame.group, "Legs");
        assert_eq!(frame.side_indicator, "Left Side");
        assert_eq!(frame.remaining, "0:45");
        // Pigeon left, buffer, Pigeon right, buffer, Frog.
        assert_eq!(frame.total_entries, 5);
        assert!(!app.controller.scheduler().is_active());
    }

    #[test]
    fn ticking_to_the_end_reports_completion() {
        let mut app = app();
        app.handle_key(KeyCode::Char(' '));
        // 3 + 2 + 3 seconds.
        for _ in 0..8 {
            app.controller.tick();
        }
        app.pump_ticks();
        assert_eq!(app.frame().phase, Phase::Completed);
        assert_eq!(app.status, "Routine complete");

        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.frame().phase, Phase::Completed);
    }

    #[test]
    fn modals_capture_escape() {
        let mut app = app();
        app.handle_key(KeyCode::Char('l'));
        assert!(app.logs_open);
        assert!(!app.handle_key(KeyCode::Esc));
        assert!(!app.logs_open);

        app.handle_key(KeyCode::Char('?'));
        assert!(app.help_open);
        assert!(!app.handle_key(KeyCode::Esc));
        assert!(!app.help_open);

        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn log_buffer_is_capped() {
        let mut app = app();
        for i in 0..(LOG_CAP + 10) {
            app.push_log_line(format!("line {i}"));
        }
        assert_eq!(app.logs.len(), LOG_CAP);
        assert_eq!(app.logs.front().map(String::as_str), Some("line 10"));
    }
}
