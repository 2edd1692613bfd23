//! Terminal output: the `log!` macro and the emit-pass progress display.
//!
//! ```ignore
//! log!("store"; "loaded {} entities", count);
//!
//! if let Some(progress) = Progress::start(&[("pages", 12), ("aliases", 8)]) {
//!     progress.tick("pages");
//!     progress.finish();
//! }
//! ```
//!
//! While a [`Progress`] is active its rows stay pinned below the log: every
//! `log!` line is printed above them and the rows are redrawn.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, queue,
    terminal::{Clear, ClearType},
};
use std::{
    io::{StdoutLock, Write, stdout},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Width of the filled/empty gauge in characters.
const GAUGE_WIDTH: usize = 24;

/// Rows currently reserved by an active [`Progress`].
static PINNED_ROWS: AtomicUsize = AtomicUsize::new(0);

/// Serializes terminal writes from rayon workers.
static TERMINAL: Mutex<()> = Mutex::new(());

/// Log a message under a colored `[module]` prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

pub fn log(module: &str, message: &str) {
    let _guard = TERMINAL.lock().ok();
    let mut out = stdout().lock();
    let pinned = PINNED_ROWS.load(Ordering::SeqCst);

    lift(&mut out, pinned);
    writeln!(out, "{} {message}", prefix(module)).ok();
    // The next redraw paints over these blank rows.
    for _ in 0..pinned {
        writeln!(out).ok();
    }
    out.flush().ok();
}

fn prefix(module: &str) -> ColoredString {
    let label = format!("[{module}]");
    match module {
        "error" => label.bright_red().bold(),
        "warn" => label.bright_magenta().bold(),
        "verify" => label.bright_green().bold(),
        _ => label.bright_yellow().bold(),
    }
}

/// Move the cursor to the first pinned row and clear everything below it.
#[allow(clippy::cast_possible_truncation)] // a handful of rows
fn lift(out: &mut StdoutLock<'_>, rows: usize) {
    if rows > 0 {
        queue!(out, cursor::MoveUp(rows as u16)).ok();
    }
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::FromCursorDown)).ok();
}

// ============================================================================
// Progress
// ============================================================================

struct Row {
    name: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl Row {
    fn line(&self) -> String {
        let done = self.done.load(Ordering::Relaxed).min(self.total);
        let filled = gauge_fill(done, self.total);
        format!(
            "{} [{}{}] {done}/{}",
            prefix(self.name),
            "█".repeat(filled),
            "░".repeat(GAUGE_WIDTH - filled),
            self.total
        )
    }
}

fn gauge_fill(done: usize, total: usize) -> usize {
    if total == 0 {
        GAUGE_WIDTH
    } else {
        done * GAUGE_WIDTH / total
    }
}

/// One pinned row per output group, advanced from any thread.
pub struct Progress {
    rows: Vec<Row>,
}

impl Progress {
    /// Pin a row for every non-empty group; `None` when there is at most one
    /// file to write overall.
    pub fn start(groups: &[(&'static str, usize)]) -> Option<Self> {
        let rows: Vec<Row> = groups
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| Row {
                name,
                total,
                done: AtomicUsize::new(0),
            })
            .collect();
        if rows.iter().map(|row| row.total).sum::<usize>() <= 1 {
            return None;
        }

        let progress = Self { rows };
        let _guard = TERMINAL.lock().ok();
        let mut out = stdout().lock();
        for row in &progress.rows {
            writeln!(out, "{}", row.line()).ok();
        }
        out.flush().ok();
        PINNED_ROWS.store(progress.rows.len(), Ordering::SeqCst);
        Some(progress)
    }

    /// Count one finished file of group `name`.
    pub fn tick(&self, name: &str) {
        if let Some(row) = self.rows.iter().find(|row| row.name == name) {
            row.done.fetch_add(1, Ordering::Relaxed);
            self.redraw();
        }
    }

    fn redraw(&self) {
        let _guard = TERMINAL.lock().ok();
        let mut out = stdout().lock();
        lift(&mut out, self.rows.len());
        for row in &self.rows {
            writeln!(out, "{}", row.line()).ok();
        }
        out.flush().ok();
    }

    /// Remove the rows from the terminal. Safe to call more than once.
    pub fn finish(&self) {
        if PINNED_ROWS.swap(0, Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = TERMINAL.lock().ok();
        let mut out = stdout().lock();
        lift(&mut out, self.rows.len());
        out.flush().ok();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}
