//! Contour a synthetic field and write the fitted paths as SVG.
//!
//! Run with:
//!   cargo run --package contour-engine --example grid_to_svg -- [config.json] [out.svg]
//!
//! Configuration comes from the optional JSON file, then `CONTOUR_*`
//! environment variables. Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use contour_engine::{
    ContourConfig, ContourMode, ContourPipeline, Grid, GridSpec, MissingValue, PathSource, Point,
};
use std::fmt::Write as _;
use test_utils::create_smooth_field;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const WIDTH: usize = 200;
const HEIGHT: usize = 150;
const CELL: f64 = 2.0;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let out_path = args.next().unwrap_or_else(|| "contours.svg".to_string());

    let mut config = match &config_path {
        Some(path) => ContourConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => {
            let mut config = ContourConfig::default();
            config.thresholds.interval = Some(0.5);
            config.thresholds.mode = ContourMode::Isobands;
            config.extract.close_frame = true;
            config
        }
    };
    config.apply_env();

    let data = create_smooth_field(WIDTH, HEIGHT);
    let spec = GridSpec::new(WIDTH, HEIGHT, CELL, Point::new(0.0, 0.0));
    let grid = Grid::new(spec, &data, MissingValue::Nan)?;

    let pipeline = ContourPipeline::new(config)?;
    let set = pipeline.run_auto(&grid)?;

    for (threshold, error) in set.failures() {
        warn!(threshold = %threshold, error = %error, "threshold skipped");
    }

    let bbox = grid.spec().bbox();
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        bbox.min_x,
        bbox.min_y,
        bbox.width(),
        bbox.height()
    )?;
    // Flip y so the lattice origin sits bottom-left
    writeln!(
        svg,
        r#"<g transform="translate(0 {}) scale(1 -1)" fill-rule="evenodd">"#,
        bbox.min_y + bbox.max_y
    )?;

    let outputs: Vec<_> = set.successes().collect();
    for (idx, output) in outputs.iter().enumerate() {
        // Grey ramp from low to high thresholds
        let shade = 40 + (idx * 180) / outputs.len().max(1);
        for contour in &output.paths {
            let fill = match contour.source {
                PathSource::Polygon(_) => format!("rgb({s},{s},{s})", s = shade),
                PathSource::Polyline(_) | PathSource::Ring(_) => "none".to_string(),
            };
            writeln!(
                svg,
                r#"<path d="{}" fill="{}" stroke="black" stroke-width="0.3"/>"#,
                contour.path.to_svg_data(),
                fill
            )?;
        }
    }
    svg.push_str("</g>\n</svg>\n");

    std::fs::write(&out_path, svg).with_context(|| format!("writing {}", out_path))?;

    let polygons: usize = outputs.iter().map(|o| o.polygons.len()).sum();
    info!(
        thresholds = set.len(),
        polygons = polygons,
        warnings = set.warnings().count(),
        output = %out_path,
        "wrote contours"
    );

    Ok(())
}
