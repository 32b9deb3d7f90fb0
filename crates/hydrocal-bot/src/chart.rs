//! Progress chart rendering.
//!
//! Turns aggregated history buckets into a PNG line chart with one
//! series per tracked value. Rendering is synchronous (plotters draws
//! into a bitmap), so the caller runs it inside `spawn_blocking`.

use std::path::Path;

use anyhow::{Context, Result};
use hydrocal_core::{ChartRequest, HistoryBucket};
use hydrocal_store::Period;
use plotters::prelude::*;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 600;

/// Render a progress chart to `path` as a PNG.
pub fn render_chart(request: &ChartRequest, path: &Path) -> Result<()> {
    let buckets = &request.buckets;
    if buckets.is_empty() {
        anyhow::bail!("no history to chart");
    }

    let title = match request.period {
        Period::Day => "Progress by day",
        Period::Week => "Progress by week",
        Period::Month => "Progress by month",
        Period::Year => "Progress by year",
    };

    let y_max = buckets
        .iter()
        .flat_map(|b| {
            [b.water, b.calories, b.burned, b.water_goal, b.calorie_goal]
        })
        .fold(0.0_f64, f64::max)
        .max(1.0)
        * 1.1;

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("fill chart background")?;

    let x_max = (buckets.len() - 1).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(0..x_max, 0.0..y_max)
        .context("build chart axes")?;

    let labels: Vec<String> = buckets
        .iter()
        .map(|b| b.date.format("%Y-%m-%d").to_string())
        .collect();
    chart
        .configure_mesh()
        .x_labels(labels.len().min(10))
        .x_label_formatter(&|idx| {
            labels.get(*idx).cloned().unwrap_or_default()
        })
        .y_desc("ml / kcal")
        .draw()
        .context("draw chart mesh")?;

    let series: [(&str, fn(&HistoryBucket) -> f64, RGBColor); 5] = [
        ("Water (ml)", |b| b.water, BLUE),
        ("Water goal", |b| b.water_goal, CYAN),
        ("Calories (kcal)", |b| b.calories, GREEN),
        ("Calorie goal", |b| b.calorie_goal, MAGENTA),
        ("Burned (kcal)", |b| b.burned, RED),
    ];

    for (label, value, color) in series {
        chart
            .draw_series(LineSeries::new(
                buckets.iter().enumerate().map(|(i, b)| (i, value(b))),
                &color,
            ))
            .with_context(|| format!("draw series {label}"))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color)
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .context("draw chart legend")?;

    root.present().context("write chart png")?;
    Ok(())
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bucket(day: u32, water: f64) -> HistoryBucket {
        HistoryBucket {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            water,
            calories: 400.0,
            burned: 120.0,
            water_goal: 2600.0,
            calorie_goal: 2517.0,
        }
    }

    #[test]
    fn renders_a_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let request = ChartRequest {
            period: Period::Day,
            buckets: vec![bucket(1, 500.0), bucket(2, 900.0), bucket(3, 1500.0)],
        };

        render_chart(&request, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn single_bucket_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.png");
        let request = ChartRequest {
            period: Period::Week,
            buckets: vec![bucket(10, 2000.0)],
        };
        render_chart(&request, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_buckets_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let request = ChartRequest {
            period: Period::Day,
            buckets: vec![],
        };
        assert!(render_chart(&request, &path).is_err());
    }
}
