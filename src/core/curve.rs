//! Conflict curve planning — chapter count + curve shape → per-chapter intensity.

use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};
use tracing::warn;

/// Chapters per wave in `wave_with_climax`.
const WAVE_PERIOD: f64 = 6.0;
/// Fraction of the book at which the final climax window opens.
const CLIMAX_START: f64 = 0.9;
const CLIMAX_BOOST: f64 = 0.3;
const START_INTENSITY: f64 = 0.2;

/// Shape of the planned conflict curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    /// Rising trend with decaying waves and a final climax boost.
    #[default]
    WaveWithClimax,
    Linear,
    /// Slow start, sharp late rise.
    Exponential,
}

impl CurveType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WaveWithClimax => "wave_with_climax",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }

    /// Parse a curve name. Unknown names fall back to `wave_with_climax`.
    pub fn parse(name: &str) -> CurveType {
        match name.trim() {
            "wave_with_climax" => Self::WaveWithClimax,
            "linear" => Self::Linear,
            "exponential" => Self::Exponential,
            other => {
                warn!(curve = other, "unknown curve type, using wave_with_climax");
                Self::WaveWithClimax
            }
        }
    }
}

impl std::fmt::Display for CurveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Plan one intensity in `[0, 1]` per chapter.
pub fn plan_curve(total_chapters: u32, curve_type: CurveType) -> Vec<f64> {
    match curve_type {
        CurveType::WaveWithClimax => wave_with_climax(total_chapters),
        CurveType::Linear => linear(total_chapters),
        CurveType::Exponential => exponential(total_chapters),
    }
}

fn wave_with_climax(total: u32) -> Vec<f64> {
    let n = total as f64;
    let climax_start = (n * CLIMAX_START).floor();

    (0..total)
        .map(|i| {
            let i = i as f64;
            let chapter = i + 1.0;

            let base_trend = START_INTENSITY + 0.5 * i / n;
            let amplitude = 0.15 * (1.0 - i / n);
            let wave = amplitude * (2.0 * PI * i / WAVE_PERIOD).sin();
            let mut intensity = base_trend + wave;

            if chapter >= climax_start {
                let progress = (chapter - climax_start) / (n - climax_start);
                intensity += CLIMAX_BOOST * progress;
            }

            intensity.clamp(0.0, 1.0)
        })
        .collect()
}

/// Fractional progress of 0-based chapter `i`; 0 for single-chapter books.
fn progress(i: u32, total: u32) -> f64 {
    if total > 1 {
        i as f64 / (total - 1) as f64
    } else {
        0.0
    }
}

fn linear(total: u32) -> Vec<f64> {
    (0..total)
        .map(|i| START_INTENSITY + (1.0 - START_INTENSITY) * progress(i, total))
        .collect()
}

fn exponential(total: u32) -> Vec<f64> {
    (0..total)
        .map(|i| {
            let p = progress(i, total);
            let normalized = ((2.0 * p).exp() - 1.0) / (E * E - 1.0);
            START_INTENSITY + (1.0 - START_INTENSITY) * normalized
        })
        .collect()
}

/// Render a planned curve as an ASCII chart `width` columns wide.
pub fn render_curve_chart(curve: &[f64], width: usize) -> String {
    if curve.is_empty() {
        return "conflict curve not planned".to_string();
    }

    const HEIGHT: usize = 15;
    let width = width.max(12);
    let mut grid = vec![vec![' '; width]; HEIGHT];

    for (i, intensity) in curve.iter().enumerate() {
        let x = i * (width - 1) / curve.len();
        let y = HEIGHT - 1 - (intensity.clamp(0.0, 1.0) * (HEIGHT - 1) as f64) as usize;
        grid[y][x] = '●';
    }

    let mut lines = Vec::with_capacity(HEIGHT + 4);
    lines.push("conflict intensity".to_string());
    lines.push(format!("1.0 ┬{}", "─".repeat(width - 2)));
    for row in grid {
        lines.push(format!("    │{}", row.into_iter().collect::<String>()));
    }
    lines.push(format!("0.0 ┴{}", "─".repeat(width - 2)));
    lines.push(format!(
        "    1{}chapter{}{}",
        " ".repeat(width.saturating_sub(12)),
        " ".repeat(3),
        curve.len()
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn linear_five_chapters() {
        let curve = plan_curve(5, CurveType::Linear);
        let expected = [0.2, 0.4, 0.6, 0.8, 1.0];
        for (got, want) in curve.iter().zip(expected) {
            assert!((got - want).abs() < 0.01, "{got} vs {want}");
        }
    }

    #[test]
    fn single_chapter_curves() {
        assert_eq!(plan_curve(1, CurveType::Linear), vec![0.2]);
        assert_eq!(plan_curve(1, CurveType::Exponential), vec![0.2]);
        let wave = plan_curve(1, CurveType::WaveWithClimax);
        assert_eq!(wave.len(), 1);
        assert!((0.0..=1.0).contains(&wave[0]));
    }

    #[test]
    fn exponential_endpoints_and_shape() {
        let curve = plan_curve(11, CurveType::Exponential);
        assert!((curve[0] - 0.2).abs() < 1e-9);
        assert!((curve[10] - 1.0).abs() < 1e-9);
        // Slow start: the midpoint sits below the straight line.
        assert!(curve[5] < 0.6);
        assert!(curve.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn wave_ends_higher_than_it_starts() {
        for n in [20, 30, 57, 120] {
            let curve = plan_curve(n, CurveType::WaveWithClimax);
            let tenth = (n as usize / 10).max(1);
            let head = mean(&curve[..tenth]);
            let tail = mean(&curve[curve.len() - tenth..]);
            assert!(tail >= head, "n={n}: tail {tail} < head {head}");
        }
    }

    #[test]
    fn wave_final_chapter_gets_full_boost() {
        let curve = plan_curve(30, CurveType::WaveWithClimax);
        // Chapter 30: base 0.2 + 0.5*29/30, a tiny wave term, plus the full 0.3 boost.
        assert!(curve[29] > 0.95, "{}", curve[29]);
        assert!(curve[29] > curve[26]);
    }

    #[test]
    fn zero_chapters_is_empty() {
        assert!(plan_curve(0, CurveType::WaveWithClimax).is_empty());
    }

    #[test]
    fn parse_falls_back() {
        assert_eq!(CurveType::parse("linear"), CurveType::Linear);
        assert_eq!(CurveType::parse("custom"), CurveType::WaveWithClimax);
        assert_eq!(CurveType::parse(""), CurveType::WaveWithClimax);
    }

    #[test]
    fn chart_has_expected_frame() {
        let chart = render_curve_chart(&plan_curve(30, CurveType::Linear), 60);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 19);
        assert!(lines[0].contains("conflict intensity"));
        assert_eq!(chart.matches('●').count(), 30);
        assert_eq!(render_curve_chart(&[], 60), "conflict curve not planned");
    }
}
