//! # `eternity-solver`
//!
//! A constraint-satisfaction engine for edge-matching grid puzzles of the
//! "Eternity" family: square tiles with four colored edges are placed, one per
//! grid cell and in one of four rotations, so that every pair of touching
//! edges matches and every edge touching the outer frame carries the border
//! color. A subset of cells may be pre-fixed and is never revisited.
//!
//! This crate is the solver core only: backtracking search, AC-3 constraint
//! propagation, variable/value ordering heuristics, symmetry breaking,
//! resumable placement history, and multi-threaded coordination. Save-file
//! formats, terminal visualizers, CLIs, and dashboards are external
//! collaborators the core talks to through the traits in [`collaborators`].

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod algorithm;
mod board;
mod collaborators;
mod config;
mod context;
mod domain;
mod error;
mod heuristics;
mod history;
mod propagate;
mod singleton;
mod stats;
mod symmetry;
mod tile;
mod validator;

pub use algorithm::driver::solve;
pub use algorithm::parallel::{solve_parallel, solve_work_stealing, ParallelOutcome, SharedSearchState};
pub use algorithm::resume::solve_with_history;
pub use board::{Board, Placement, Side};
pub use collaborators::{Logger, NullLogger, NullSaveProvider, NullVisualizer, SaveProvider, Visualizer};
pub use config::{SolverConfig, SortOrder};
pub use error::SolverError;
pub use history::PlacementHistory;
pub use stats::Statistics;
pub use tile::{Color, Tile, TileSet, BORDER};
