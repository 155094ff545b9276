//! Chart layouts for evaluation and showcase runs.

use std::ops::Range;
use std::path::Path;

use image::Rgb;
use tracing::info;

use crate::error::RecordError;
use crate::plot::{Axes, BLACK, BLUE, Canvas, PALETTE, PURPLE, RED, Rect, padded_range};
use crate::trajectory::TrajectoryLog;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 40;
const BOUNDARY: Rgb<u8> = Rgb([150, 150, 150]);

fn non_empty(log: &TrajectoryLog) -> Result<(), RecordError> {
    if log.is_empty() {
        Err(RecordError::EmptyTrajectory)
    } else {
        Ok(())
    }
}

fn times(log: &TrajectoryLog, steps: Range<usize>) -> Vec<f32> {
    steps.map(|s| log.time_at(s)).collect()
}

fn finish(canvas: &Canvas, path: &Path, figure: &str) -> Result<(), RecordError> {
    canvas.save(path)?;
    info!(figure, path = %path.display(), "chart written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn heatmap_panel(canvas: &mut Canvas, rect: Rect, log: &TrajectoryLog) {
    canvas.heatmap(rect, log.actions(), 0.0, 1.0);
}

/// Selected joints' actions over `window`, each in its own palette color.
fn phase_panel(
    canvas: &mut Canvas,
    rect: Rect,
    log: &TrajectoryLog,
    joints: &[usize],
    window: Range<usize>,
) -> Result<(), RecordError> {
    let end = window.end.min(log.len());
    let window = window.start.min(end)..end;
    let xs = times(log, window.clone());
    let x_range = (
        log.time_at(window.start),
        log.time_at(window.end.saturating_sub(1)),
    );
    let axes = canvas.panel(rect, x_range, (0.0, 1.0));
    for (k, &joint) in joints.iter().enumerate() {
        let series = log.joint_series(joint)?;
        canvas.series(&axes, &xs, &series[window.clone()], PALETTE[k % PALETTE.len()]);
    }
    Ok(())
}

/// A full-length series with dashed markers at episode boundaries.
fn time_series_panel(
    canvas: &mut Canvas,
    rect: Rect,
    log: &TrajectoryLog,
    ys: &[f32],
    color: Rgb<u8>,
) -> Axes {
    let xs = times(log, 0..ys.len());
    let x_range = (0.0, log.time_at(ys.len().saturating_sub(1)));
    let axes = canvas.panel(rect, x_range, padded_range(ys));
    for &step in log.discontinuities() {
        canvas.marker_line(&axes, log.time_at(step), BOUNDARY);
    }
    canvas.series(&axes, &xs, ys, color);
    axes
}

fn trajectory_panel(canvas: &mut Canvas, rect: Rect, log: &TrajectoryLog) {
    let xs: Vec<f32> = log.position().iter().map(|p| p[0]).collect();
    let ys: Vec<f32> = log.position().iter().map(|p| p[1]).collect();
    let (x_lo, x_hi) = padded_range(&xs);
    let (y_lo, y_hi) = padded_range(&ys);
    // Equal scale on both axes: grow the narrower window around its center.
    let half = (x_hi - x_lo).max(y_hi - y_lo) / 2.0;
    let (cx, cy) = ((x_lo + x_hi) / 2.0, (y_lo + y_hi) / 2.0);
    let axes = canvas.panel(rect, (cx - half, cx + half), (cy - half, cy + half));
    canvas.series(&axes, &xs, &ys, PURPLE);
    if let (Some(first), Some(last)) = (log.position().first(), log.position().last()) {
        canvas.dot(&axes, first[0], first[1], 4, PALETTE[1]);
        canvas.dot(&axes, last[0], last[1], 4, RED);
    }
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

/// Action intensity per joint (rows, head at top) over time.
pub fn render_heatmap(log: &TrajectoryLog, path: &Path) -> Result<(), RecordError> {
    non_empty(log)?;
    let mut canvas = Canvas::new(WIDTH, HEIGHT);
    let rect = canvas.bounds().inset(MARGIN);
    heatmap_panel(&mut canvas, rect, log);
    finish(&canvas, path, "heatmap")
}

/// Actions of `joints` over the first `steps` steps.
pub fn render_phase_lag(
    log: &TrajectoryLog,
    joints: &[usize],
    steps: usize,
    path: &Path,
) -> Result<(), RecordError> {
    non_empty(log)?;
    let mut canvas = Canvas::new(WIDTH, HEIGHT);
    let rect = canvas.bounds().inset(MARGIN);
    phase_panel(&mut canvas, rect, log, joints, 0..steps)?;
    finish(&canvas, path, "phase lag")
}

/// Base x position over time; respawns show as drops back to the start.
pub fn render_displacement(log: &TrajectoryLog, path: &Path) -> Result<(), RecordError> {
    non_empty(log)?;
    let mut canvas = Canvas::new(WIDTH * 2 / 3, HEIGHT);
    let rect = canvas.bounds().inset(MARGIN);
    time_series_panel(&mut canvas, rect, log, &log.x_series(), BLUE);
    finish(&canvas, path, "displacement")
}

/// Four panels: gait heatmap, forward velocity with its mean, top-view
/// trajectory, and a zoomed phase-lag window.
pub fn render_showcase(
    log: &TrajectoryLog,
    zoom: Range<usize>,
    joints: &[usize],
    path: &Path,
) -> Result<(), RecordError> {
    non_empty(log)?;
    let mut canvas = Canvas::new(WIDTH * 3 / 2, HEIGHT * 5 / 3);
    let panels: Vec<Rect> = canvas
        .bounds()
        .split(2, 2)
        .into_iter()
        .map(|r| r.inset(MARGIN))
        .collect();

    heatmap_panel(&mut canvas, panels[0], log);

    let axes = time_series_panel(&mut canvas, panels[1], log, log.velocity(), BLUE);
    canvas.mean_line(&axes, log.mean_velocity(), RED);

    trajectory_panel(&mut canvas, panels[2], log);
    phase_panel(&mut canvas, panels[3], log, joints, zoom)?;

    canvas.frame(canvas.bounds(), BLACK);
    finish(&canvas, path, "showcase")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
