//! Scalar-series plots for the comparison experiment.

use std::ops::Range;
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use plotters::prelude::*;

/// A labelled point plot of one `(x, y)` series, written as SVG.
#[derive(Debug, Clone, Copy)]
pub struct ScatterPlot<'a> {
    pub caption: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl ScatterPlot<'_> {
    /// Draw `xs` against `ys` into `path`.
    ///
    /// # Errors
    ///
    /// Fails if the series are empty or of different lengths, or if the
    /// file cannot be written.
    pub fn render(&self, path: &Path, xs: &[f64], ys: &[f64]) -> Result<()> {
        if xs.is_empty() || xs.len() != ys.len() {
            bail!(
                "cannot plot {} x values against {} y values",
                xs.len(),
                ys.len()
            );
        }

        let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(self.caption, ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(padded_range(xs), padded_range(ys))
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label)
            .y_desc(self.y_label)
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(
                xs.iter()
                    .zip(ys)
                    .map(|(&x, &y)| Circle::new((x, y), 4, RED.filled())),
            )
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
        Ok(())
    }
}

fn plot_error(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("plot rendering failed: {e}")
}

/// Data range with 5% headroom; a flat series gets a unit-wide window.
fn padded_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = span * 0.05;
    (min - pad)..(max + pad)
}
