#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation contracts for pursuit adapters.
//!
//! Presenters receive a read-only [`Snapshot`] every frame together with the
//! events the frame produced. They never call back into the simulation.

use std::{fmt::Write as _, io::Write};

use anyhow::{Context, Result as AnyResult};
use pursuit_core::{Event, Position, RoundState, Snapshot};
use tracing::warn;

/// Glyph drawn for the pursuer.
pub const PURSUER_GLYPH: char = 'P';
/// Glyph drawn for the pursuer while an invalid move is flashing.
pub const PURSUER_FLASH_GLYPH: char = '!';
/// Glyph drawn for the evader.
pub const EVADER_GLYPH: char = 'E';
/// Glyph drawn when both actors share a cell.
pub const CAPTURE_GLYPH: char = 'X';
/// Glyph drawn for cells along the pursuer's path.
pub const PATH_GLYPH: char = 'o';

/// Presentation collaborator driven once per frame.
pub trait Presenter {
    /// Draws the provided snapshot.
    fn present(&mut self, snapshot: &Snapshot) -> AnyResult<()>;

    /// Receives the events emitted during the frame, for cues such as sounds.
    fn notify(&mut self, events: &[Event]) -> AnyResult<()> {
        let _ = events;
        Ok(())
    }
}

/// Presenter that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _snapshot: &Snapshot) -> AnyResult<()> {
        Ok(())
    }
}

/// Wraps a presenter and replaces it with a no-op after its first failure.
///
/// Presentation failures never reach the simulation; the frame loop keeps
/// running without output instead.
#[derive(Debug)]
pub struct DegradingPresenter<P> {
    inner: Option<P>,
}

impl<P> DegradingPresenter<P> {
    /// Wraps the provided presenter.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self { inner: Some(inner) }
    }

    /// Reports whether the wrapped presenter failed and was dropped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.inner.is_none()
    }
}

impl<P: Presenter> DegradingPresenter<P> {
    fn guard<F>(&mut self, call: F)
    where
        F: FnOnce(&mut P) -> AnyResult<()>,
    {
        let Some(inner) = self.inner.as_mut() else {
            return;
        };
        if let Err(error) = call(inner) {
            warn!(error = ?error, "presenter failed, continuing without output");
            self.inner = None;
        }
    }
}

impl<P: Presenter> Presenter for DegradingPresenter<P> {
    fn present(&mut self, snapshot: &Snapshot) -> AnyResult<()> {
        self.guard(|inner| inner.present(snapshot));
        Ok(())
    }

    fn notify(&mut self, events: &[Event]) -> AnyResult<()> {
        self.guard(|inner| inner.notify(events));
        Ok(())
    }
}

/// Presenter that writes text frames to a writer.
#[derive(Debug)]
pub struct TextPresenter<W> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    /// Creates a presenter writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the presenter, returning the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, snapshot: &Snapshot) -> AnyResult<()> {
        let frame = render_text(snapshot);
        self.out
            .write_all(frame.as_bytes())
            .and_then(|()| self.out.flush())
            .context("failed to write text frame")
    }
}

/// Renders the snapshot as a text frame: a score banner, the grid and a HUD
/// line, each terminated by a newline.
#[must_use]
pub fn render_text(snapshot: &Snapshot) -> String {
    let size = snapshot.grid.size();
    let side = usize::try_from(size).unwrap_or(0);
    let mut frame = String::with_capacity((side + 1) * side + 128);

    let _ = writeln!(frame, "Highscore: {}", snapshot.best_score);
    for row in 0..size {
        for column in 0..size {
            frame.push(cell_glyph(snapshot, Position::new(row, column)));
        }
        frame.push('\n');
    }
    frame.push_str(&hud_line(snapshot));
    frame.push('\n');
    frame
}

fn cell_glyph(snapshot: &Snapshot, position: Position) -> char {
    let pursuer = position == snapshot.pursuer;
    let evader = position == snapshot.evader;
    match (pursuer, evader) {
        (true, true) => CAPTURE_GLYPH,
        (true, false) if snapshot.invalid_move => PURSUER_FLASH_GLYPH,
        (true, false) => PURSUER_GLYPH,
        (false, true) => EVADER_GLYPH,
        (false, false) if snapshot.pursuer_path.cells().contains(&position) => PATH_GLYPH,
        (false, false) => snapshot
            .grid
            .cell(position)
            .map_or(' ', |kind| kind.glyph()),
    }
}

/// Single status line summarising the round.
#[must_use]
pub fn hud_line(snapshot: &Snapshot) -> String {
    let elapsed = snapshot.elapsed.as_secs();
    match snapshot.round {
        RoundState::Menu => format!(
            "Menu | Diff: {} | Last score: {}",
            snapshot.difficulty.label(),
            snapshot
                .last_score
                .map_or_else(|| String::from("-"), |score| score.to_string())
        ),
        RoundState::Won { score } => format!("Caught! | Score: {score} | Time: {elapsed}s"),
        RoundState::Lost => format!("Time's up! | Time: {elapsed}s"),
        RoundState::Running | RoundState::Paused => {
            let mut parts = vec![
                format!("Diff: {}", snapshot.difficulty.label()),
                format!("Dist: {}", snapshot.distance),
                format!("Time: {elapsed}s"),
            ];
            if let Some(remaining) = snapshot.remaining {
                parts.push(format!("Left: {}s", remaining.as_secs()));
            }
            parts.push(format!("Mode: {}", snapshot.mode.label()));
            if let Some(remaining) = snapshot.power_up_remaining {
                parts.push(format!("Speed: {}s", remaining.as_secs()));
            }
            if snapshot.grid_regenerated {
                parts.push(String::from("Reset Grid!"));
            }
            if snapshot.round == RoundState::Paused {
                parts.push(String::from("Paused"));
            }
            parts.join(" | ")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use super::*;
    use pursuit_core::{Difficulty, Grid, Path, PursuerMode};

    fn snapshot() -> Snapshot {
        let grid = Grid::from_ascii(
            "
            ..#
            .*.
            ...
            ",
        )
        .expect("valid grid");
        Snapshot {
            grid,
            pursuer: Position::new(0, 0),
            evader: Position::new(2, 2),
            pursuer_path: Path::new(vec![
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(2, 1),
                Position::new(2, 2),
            ]),
            distance: 4,
            round: RoundState::Running,
            elapsed: Duration::from_millis(12_700),
            remaining: None,
            score: 8_800,
            last_score: None,
            best_score: 9_100,
            power_up_remaining: Some(Duration::from_millis(4_200)),
            grid_regenerated: true,
            invalid_move: false,
            mode: PursuerMode::Automatic,
            difficulty: Difficulty::Hard,
        }
    }

    #[test]
    fn renders_grid_actors_and_path() {
        let frame = render_text(&snapshot());
        let lines: Vec<&str> = frame.lines().collect();

        assert_eq!(lines[0], "Highscore: 9100");
        assert_eq!(lines[1], "P.#");
        assert_eq!(lines[2], "o*.");
        assert_eq!(lines[3], "ooE");
        assert_eq!(
            lines[4],
            "Diff: Hard | Dist: 4 | Time: 12s | Mode: Auto | Speed: 4s | Reset Grid!"
        );
    }

    #[test]
    fn invalid_move_flashes_pursuer() {
        let mut snapshot = snapshot();
        snapshot.invalid_move = true;

        assert!(render_text(&snapshot).lines().nth(1) == Some("!.#"));
    }

    #[test]
    fn finished_rounds_show_outcome() {
        let mut snapshot = snapshot();
        snapshot.round = RoundState::Won { score: 8_800 };
        assert_eq!(hud_line(&snapshot), "Caught! | Score: 8800 | Time: 12s");

        snapshot.round = RoundState::Lost;
        assert_eq!(hud_line(&snapshot), "Time's up! | Time: 12s");
    }

    #[test]
    fn text_presenter_writes_frames() {
        let mut presenter = TextPresenter::new(Vec::new());
        presenter.present(&snapshot()).expect("write to vec");

        let written = String::from_utf8(presenter.into_inner()).expect("utf8 output");
        assert!(written.starts_with("Highscore: 9100\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_presenter_degrades_to_no_op() {
        let mut presenter = DegradingPresenter::new(TextPresenter::new(BrokenPipe));

        presenter.present(&snapshot()).expect("failure is absorbed");
        assert!(presenter.is_degraded());
        presenter.present(&snapshot()).expect("no-op after degrading");
    }
}
