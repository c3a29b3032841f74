use std::fmt::Display;
use std::path::Path;

use chainsweep_core::{ErrorInfo, SweepError};
use plotters::prelude::*;
use tracing::{info, warn};

use crate::aggregate::SummaryTable;

pub const CHART_TITLE: &str = "Ratio of Non-Unique Choices to Chain Length";
pub const X_LABEL: &str = "n";
pub const Y_LABEL: &str = "Non-Unique Choices / Chain Length";
const SERIES_LABEL: &str = "Non-Unique Choices / Chain Length";
const CHART_SIZE: (u32, u32) = (1000, 600);

/// Points with a finite ratio, in table order.
pub fn ratio_points(table: &SummaryTable) -> Vec<(i64, f64)> {
    table
        .rows()
        .iter()
        .filter(|row| row.ratio.is_finite())
        .map(|row| (i64::from(row.n), row.ratio))
        .collect()
}

/// Horizontal axis bounds; never a zero-width range.
pub fn x_bounds(table: &SummaryTable) -> (i64, i64) {
    match (table.rows().first(), table.rows().last()) {
        (Some(first), Some(last)) if first.n < last.n => (i64::from(first.n), i64::from(last.n)),
        (Some(only), _) => (i64::from(only.n) - 1, i64::from(only.n) + 1),
        _ => (0, 1),
    }
}

/// Tick label at `x`: the value itself for orders present in the table, blank elsewhere.
pub fn x_tick_label(table: &SummaryTable, x: i64) -> String {
    let present = table.rows().iter().any(|row| i64::from(row.n) == x);
    if present {
        x.to_string()
    } else {
        String::new()
    }
}

/// Upper bound of the ratio axis with a little headroom.
pub fn y_upper(points: &[(i64, f64)]) -> f64 {
    let max = points.iter().map(|(_, y)| *y).fold(0.0f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Renders the ratio chart as SVG.
///
/// An empty table yields axes without a series. Rows whose ratio is NaN
/// stay in the table but are not plotted.
pub fn render_chart(table: &SummaryTable, path: &Path) -> Result<(), SweepError> {
    let points = ratio_points(table);
    if table.is_empty() {
        warn!(path = %path.display(), "no rows to plot; rendering an empty chart");
    } else if points.len() < table.len() {
        warn!(
            skipped = table.len() - points.len(),
            "rows with an undefined ratio are left off the chart"
        );
    }
    let (x_lo, x_hi) = x_bounds(table);
    let y_hi = y_upper(&points);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|err| render_error(path, err))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, 0.0f64..y_hi)
        .map_err(|err| render_error(path, err))?;

    chart
        .configure_mesh()
        .x_labels((x_hi - x_lo + 1) as usize)
        .x_label_formatter(&|x| x_tick_label(table, *x))
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .draw()
        .map_err(|err| render_error(path, err))?;

    if !points.is_empty() {
        chart
            .draw_series(LineSeries::new(points.clone(), &BLUE))
            .map_err(|err| render_error(path, err))?
            .label(SERIES_LABEL)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())))
            .map_err(|err| render_error(path, err))?;
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|err| render_error(path, err))?;
    }

    root.present().map_err(|err| render_error(path, err))?;
    info!(path = %path.display(), points = points.len(), "chart written");
    Ok(())
}

fn render_error(path: &Path, err: impl Display) -> SweepError {
    SweepError::Render(
        ErrorInfo::new("chart-render", "failed to render ratio chart")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}
