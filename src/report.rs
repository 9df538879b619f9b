//! Result rendering: console table and SVG bar chart

use crate::error::BenchResult;
use comfy_table::{presets::ASCII_FULL, Cell, CellAlignment, Color, Table};
use std::path::{Path, PathBuf};

/// Elapsed seconds per benchmark label, in the order the runs were requested
#[derive(Debug, Clone, Default)]
pub struct BenchmarkResults {
    entries: Vec<(String, f64)>,
}

impl BenchmarkResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result. A label seen before keeps its position and takes the new value.
    pub fn record(&mut self, label: &str, elapsed_secs: f64) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = elapsed_secs,
            None => self.entries.push((label.to_string(), elapsed_secs)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, secs)| *secs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, s)| (l.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn requests_per_second(repetitions: usize, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs > 0.0 {
        Some(repetitions as f64 / elapsed_secs)
    } else {
        None
    }
}

pub fn render_table(results: &BenchmarkResults, repetitions: usize) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Test").fg(Color::Green),
        Cell::new("Time taken (s)").fg(Color::Green),
        Cell::new("Requests/sec").fg(Color::Green),
    ]);

    for (label, secs) in results.iter() {
        let rate = requests_per_second(repetitions, secs)
            .map(|r| format!("{:.0}", r))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{:.2}", secs)).set_alignment(CellAlignment::Right),
            Cell::new(rate).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

const CHART_HEIGHT: f64 = 420.0;
const CHART_MARGIN_LEFT: f64 = 70.0;
const CHART_MARGIN_TOP: f64 = 30.0;
const CHART_MARGIN_BOTTOM: f64 = 150.0;
const BAR_SLOT: f64 = 90.0;
const BAR_WIDTH: f64 = 60.0;
const PALETTE: [&str; 8] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860", "#da8bc3", "#8c8c8c",
];

/// Bar chart of seconds per label as a standalone SVG document
pub fn render_chart_svg(results: &BenchmarkResults) -> String {
    let plot_height = CHART_HEIGHT - CHART_MARGIN_TOP - CHART_MARGIN_BOTTOM;
    let width = CHART_MARGIN_LEFT + BAR_SLOT * results.len().max(1) as f64 + 20.0;
    let max = results
        .iter()
        .map(|(_, s)| s)
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON);
    let baseline = CHART_MARGIN_TOP + plot_height;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" font-family=\"sans-serif\" font-size=\"12\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <line x1=\"{x:.0}\" y1=\"{top:.0}\" x2=\"{x:.0}\" y2=\"{base:.0}\" stroke=\"black\"/>\n\
         <line x1=\"{x:.0}\" y1=\"{base:.0}\" x2=\"{right:.0}\" y2=\"{base:.0}\" stroke=\"black\"/>\n\
         <text x=\"18\" y=\"{mid:.0}\" transform=\"rotate(-90 18 {mid:.0})\" text-anchor=\"middle\">seconds</text>\n",
        w = width,
        h = CHART_HEIGHT,
        x = CHART_MARGIN_LEFT,
        top = CHART_MARGIN_TOP,
        base = baseline,
        right = width - 10.0,
        mid = CHART_MARGIN_TOP + plot_height / 2.0,
    );

    for (i, (label, secs)) in results.iter().enumerate() {
        let bar_height = secs / max * plot_height;
        let x = CHART_MARGIN_LEFT + BAR_SLOT * i as f64 + (BAR_SLOT - BAR_WIDTH) / 2.0;
        let y = baseline - bar_height;
        let centre = x + BAR_WIDTH / 2.0;
        svg.push_str(&format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bw:.0}\" height=\"{bh:.1}\" fill=\"{colour}\"/>\n\
             <text x=\"{centre:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\">{secs:.2}s</text>\n\
             <text x=\"{centre:.1}\" y=\"{ly:.1}\" text-anchor=\"end\" transform=\"rotate(-45 {centre:.1} {ly:.1})\">{label}</text>\n",
            bw = BAR_WIDTH,
            bh = bar_height,
            colour = PALETTE[i % PALETTE.len()],
            ty = y - 5.0,
            ly = baseline + 15.0,
            label = escape_xml(label),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write the chart to `<dir>/<uuid>.svg` and return the path
pub fn write_chart(results: &BenchmarkResults, dir: &Path) -> BenchResult<PathBuf> {
    let path = dir.join(format!("{}.svg", uuid::Uuid::new_v4().simple()));
    std::fs::write(&path, render_chart_svg(results))?;
    tracing::debug!(path = %path.display(), "results chart written");
    Ok(path)
}
