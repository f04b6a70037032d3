use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use sentiment::{Polarity, SentimentScore};

const FILE_PREFIX: &str = "SentimentAnalysis_of_";
const FILE_SUFFIX: &str = ".png";

/// Turns a score sequence into an image on disk.
pub trait ChartRenderer {
    /// Render `scores` under the title `label` and return the written file.
    fn render(&self, label: &str, scores: &[SentimentScore]) -> Result<PathBuf>;
}

/// Line-and-marker PNG charts drawn with plotters.
pub struct PlottersRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl PlottersRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: (800, 600),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, label: &str, scores: &[SentimentScore]) -> Result<PathBuf> {
        if scores.is_empty() {
            anyhow::bail!("No scores to plot for {}", label);
        }

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create chart directory {:?}", self.output_dir))?;

        let path = chart_path(&self.output_dir, label);
        plot_sentiments(&path, self.size, label, scores)?;

        // Writes are synchronous; the file must be there now
        if !path.is_file() {
            anyhow::bail!("Chart {:?} was not written", path);
        }

        info!(path = %path.display(), points = scores.len(), "Saved sentiment chart");
        Ok(path)
    }
}

/// File the chart for `label` is written to inside `dir`.
pub fn chart_path(dir: &Path, label: &str) -> PathBuf {
    let safe: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{}{}{}", FILE_PREFIX, safe, FILE_SUFFIX))
}

pub fn marker_color(polarity: Polarity) -> RGBColor {
    match polarity {
        Polarity::Positive => GREEN,
        Polarity::Negative => RED,
    }
}

fn plot_sentiments(
    path: &Path,
    size: (u32, u32),
    title: &str,
    scores: &[SentimentScore],
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let points: Vec<(f64, f64)> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.compound))
        .collect();
    let x_max = (points.len() as f64 - 1.0).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, -1f64..1f64)?;

    chart.configure_mesh()
        .x_desc("Tweets")
        .y_desc("Sentiment score")
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        BLUE.mix(0.75).stroke_width(2),
    ))?;

    chart.draw_series(scores.iter().zip(points.iter()).map(|(score, point)| {
        Circle::new(*point, 4, marker_color(score.polarity()).mix(0.75).filled())
    }))?;

    root.present()?;
    Ok(())
}
