use crate::board::Board;

/// Receives progress/record narration from the driver. Implementations must
/// be `Send + Sync` because Mode A of [`crate::algorithm::parallel`] shares
/// one logger across worker threads.
///
/// The donor crate has no such seam — `algorithm/progress.rs` prints
/// straight to its `ProgressBar` from inside the solve loop. Splitting that
/// out into a trait lets an embedding application redirect this crate's
/// narration anywhere (a file, a channel, nowhere) without the driver
/// knowing the difference.
pub trait Logger: Send + Sync {
    /// Narrate one event at the given search depth.
    fn log(&self, depth: usize, message: &str);
}

/// Forwards to the `log` crate's `info!` macro at the configured target.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn log(&self, depth: usize, message: &str) {
        log::info!(target: "eternity_solver::search", "[depth {depth}] {message}");
    }
}

/// Discards everything. The default collaborator for library callers who
/// have not opted into narration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _depth: usize, _message: &str) {}
}

/// Persists a labeled snapshot of the board, for resumable/checkpointed runs
/// (§4.10's `thread_state_save_interval_ms`). Implementations decide the
/// storage format and location; the driver only ever calls `save` with a
/// label and the current board.
pub trait SaveProvider: Send + Sync {
    /// Persist `board` under `label`. Errors propagate to the caller of
    /// `solve`/`solve_parallel` rather than aborting the search in progress.
    fn save(&self, label: &str, board: &Board) -> anyhow::Result<()>;
}

/// Discards every snapshot. The default collaborator when no checkpointing
/// is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSaveProvider;

impl SaveProvider for NullSaveProvider {
    fn save(&self, _label: &str, _board: &Board) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Renders the board for human consumption outside of log lines — an image,
/// a TUI redraw, a web socket push. Called at the same points `Logger::log`
/// is, but passed the actual board rather than a pre-formatted string.
pub trait Visualizer: Send + Sync {
    fn render(&self, board: &Board);
}

/// Renders nothing. The default collaborator for headless/library use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn render(&self, _board: &Board) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_collaborators_are_inert() {
        let board = Board::empty(1, 1).unwrap();
        NullLogger.log(0, "ignored");
        NullVisualizer.render(&board);
        assert!(NullSaveProvider.save("ignored", &board).is_ok());
    }
}
