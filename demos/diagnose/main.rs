//! Sketchwire diagnosis demo.
//!
//! Builds a small sketch with typical wire defects, prints the topology
//! report, applies the repairs and prints the report again.
//!
//! Usage:
//! ```text
//! cargo run --example diagnose                         # default sketch
//! cargo run --example diagnose -- quick                # quick preset
//! RUST_LOG=sketchwire=debug cargo run --example diagnose
//! ```

use sketchwire::geometry::matching::MatchMode;
use sketchwire::math::Point2;
use sketchwire::operations::diagnose::IssueKind;
use sketchwire::operations::repair::{
    CoincideVertices, DeleteDuplicates, DeleteZeroLength, MakeConstruction, Selection,
};
use sketchwire::operations::{run_analysis, DiagnoseConfig, ReProfile};
use sketchwire::sketch::{Sketch, SketchSnapshot};
use sketchwire::Result;

fn defective_sketch() -> Sketch {
    let p = Point2::new;
    let mut s = Sketch::new();

    // Bisected rectangle with a small gap at one corner.
    let corners = [
        p(0.0, 0.0),
        p(20.0, 0.0),
        p(40.0, 0.0),
        p(40.0, 20.0),
        p(20.0, 20.0),
        p(0.0, 20.0),
    ];
    for (i, &start) in corners.iter().enumerate() {
        let end = corners.get(i + 1).copied().unwrap_or(p(0.0, 3e-6));
        s.push_line(start, end, false);
    }
    s.push_line(p(20.0, 0.0), p(20.0, 20.0), false);

    // Leftovers from an import.
    s.push_line(p(40.0, 0.0), p(20.0, 0.0), false);
    s.push_line(p(5.0, 5.0), p(5.0, 5.0), false);

    // Tessellated hole, drawn as construction.
    let ring: Vec<Point2> = (0..16)
        .map(|i| {
            let a = std::f64::consts::TAU * f64::from(i) / 16.0;
            p(30.0 + 4.0 * a.cos(), 10.0 + 4.0 * a.sin())
        })
        .collect();
    s.push_polygon(&ring);
    s
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for sketchwire.
    // Override with RUST_LOG (e.g. RUST_LOG=sketchwire=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("diagnose=info".parse().unwrap_or_default())
        .add_directive("sketchwire=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = match std::env::args().nth(1).as_deref() {
        Some("quick") => DiagnoseConfig::quick(),
        Some("strict") => DiagnoseConfig::strict(),
        _ => DiagnoseConfig::default(),
    };

    let mut sketch = defective_sketch();
    let summary = ReProfile::default().execute(&mut sketch)?;
    println!(
        "reprofile: {} circle(s), {} arc run(s), {} edge(s) toggled",
        summary.equilateral, summary.arc_runs, summary.toggled
    );

    let report = run_analysis(&sketch, &config)?;
    println!("{report}");

    let snapshot = SketchSnapshot::capture(&sketch)?;
    for entry in snapshot.normal() {
        let overlaps: Vec<_> = snapshot
            .matching(&entry.curve, MatchMode::Similar, config.match_tolerance)
            .into_iter()
            .filter(|&id| id > entry.id && !snapshot.is_construction(id))
            .collect();
        if !overlaps.is_empty() {
            println!("geometry {} overlaps {overlaps:?}", entry.id);
        }
    }

    let zero = DeleteZeroLength::from_config(&config).execute(&mut sketch)?;
    let duplicates = DeleteDuplicates::from_config(&config).execute(&mut sketch)?;
    let joined = CoincideVertices::from_config(&config).execute(&mut sketch)?;
    println!(
        "repairs: {} zero-length, {duplicates} duplicate(s), {} coincident constraint(s)",
        zero.len(),
        joined.added
    );

    let report = run_analysis(&sketch, &config)?;
    let converted = MakeConstruction::new(IssueKind::Subdivision, Selection::Strong)
        .execute(&mut sketch, &report)?;
    println!("converted to construction: {converted:?}");

    println!("{}", run_analysis(&sketch, &config)?);
    Ok(())
}
