//! Rollout logging and static PNG charts.
//!
//! A [`TrajectoryLog`] collects per-step actions, forward velocity and
//! base position into fixed-size buffers; [`figures`] renders them to PNG
//! with the drawing primitives in [`plot`].
//!
//! ```no_run
//! use caterpillar_record::prelude::*;
//!
//! let mut log = TrajectoryLog::new(9, 1000, 1.0 / 240.0);
//! log.record(&[0.5; 9], 0.0, [0.0, 0.0]);
//! render_heatmap(&log, "results/Fig1_Heatmap.png".as_ref()).unwrap();
//! ```

pub mod error;
pub mod figures;
pub mod plot;
pub mod trajectory;

pub use error::RecordError;
pub use trajectory::TrajectoryLog;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        RecordError, TrajectoryLog,
        figures::{render_displacement, render_heatmap, render_phase_lag, render_showcase},
    };
}
