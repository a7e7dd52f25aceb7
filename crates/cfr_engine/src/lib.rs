//! Matrix walks over rational-function matrices and the objects built on
//! them: conservative matrix fields, polynomial continued fractions and
//! linear recurrences, with exact convergent limits and convergence rates.

#![allow(clippy::needless_range_loop)] // Matrix loops index rows and columns together

pub mod cmf;
pub mod companion;
pub mod config;
pub mod error;
pub mod ffbar;
pub mod interlaced_pcf;
pub mod limit;
pub mod linear_recurrence;
pub mod matrix;
pub mod pcf;
pub mod position;
pub mod pslq;
pub mod walk;

/// The variable every reduced recurrence is written in
pub const N_SYMBOL: &str = "n";

pub use cmf::{Cmf, TrajectoryReport};
pub use companion::PcfFromMatrix;
pub use config::AnalysisConfig;
pub use error::{RecurrenceError, Result};
pub use interlaced_pcf::InterlacedPcf;
pub use limit::{log10_abs, IntegerRelation, Limit};
pub use linear_recurrence::{Decomposition, LinearRecurrence};
pub use matrix::Matrix;
pub use pcf::Pcf;
pub use position::Position;
