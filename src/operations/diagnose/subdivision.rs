use tracing::{debug, info};

use super::config::DiagnoseConfig;
use super::resolve::{Resolution, Wire};
use super::types::{Confidence, IssueKind, Severity, TopologyIssue};
use crate::error::Result;
use crate::sketch::SketchSnapshot;
use crate::topology::{count_loops_bounded, loop_groups, Loop};

/// Sum of the curve lengths of a loop's geometry.
fn perimeter(snapshot: &SketchSnapshot, res: &Resolution, l: &Loop) -> f64 {
    l.geos(&res.loop_graph)
        .into_iter()
        .filter_map(|geo| match snapshot.curve(geo)?.length() {
            Ok(len) => Some(len),
            Err(err) => {
                debug!(geo, error = %err, "length unavailable");
                None
            }
        })
        .sum()
}

/// Wires whose endpoints are both junctions (degree above two).
fn candidates(res: &Resolution) -> impl Iterator<Item = &Wire> {
    res.wires.iter().filter(|w| {
        w.edge.is_some()
            && res.graph.degree(w.start_vertex) > 2
            && res.graph.degree(w.end_vertex) > 2
    })
}

/// Grades a subdivision edge against the largest loop of its loop group.
///
/// The edge's group is the first group holding a loop that contains it.
/// When the edge's own largest loop is also the group's largest loop it is
/// probably outer boundary (weak); otherwise it splits the group's interior
/// (strong).
fn confidence(
    snapshot: &SketchSnapshot,
    res: &Resolution,
    wire: &Wire,
    loops: &[Loop],
    groups: &[Vec<usize>],
) -> (Confidence, String, Severity) {
    let containing: Vec<usize> = (0..loops.len())
        .filter(|&i| loops[i].geos(&res.loop_graph).contains(&wire.geo))
        .collect();
    if containing.is_empty() {
        return (
            Confidence::Weak,
            "WEAK (not part of any loop)".to_string(),
            Severity::Medium,
        );
    }
    let Some(group) = groups
        .iter()
        .find(|g| containing.iter().any(|i| g.contains(i)))
    else {
        return (
            Confidence::Weak,
            "WEAK (cannot determine group membership)".to_string(),
            Severity::Medium,
        );
    };

    let mut largest: Option<(usize, f64)> = None;
    for &i in group {
        let p = perimeter(snapshot, res, &loops[i]);
        if largest.is_none_or(|(_, best)| p > best) {
            largest = Some((i, p));
        }
    }
    let mut own: Option<(usize, f64)> = None;
    for &i in containing.iter().filter(|i| group.contains(i)) {
        let p = perimeter(snapshot, res, &loops[i]);
        if p > own.map_or(0.0, |(_, best)| best) {
            own = Some((i, p));
        }
    }
    let own_perimeter = own.map_or(0.0, |(_, p)| p);
    debug!(
        geo = wire.geo,
        group_loops = group.len(),
        largest = largest.map_or(0.0, |(_, p)| p),
        own = own_perimeter,
        "subdivision confidence"
    );

    if own.map(|(i, _)| i) == largest.map(|(i, _)| i) {
        (
            Confidence::Weak,
            format!("WEAK (part of main boundary, {own_perimeter:.1} units)"),
            Severity::Medium,
        )
    } else {
        (
            Confidence::Strong,
            format!("STRONG (internal subdivision, {own_perimeter:.1} units)"),
            Severity::High,
        )
    }
}

/// Junction-to-junction edges whose removal lowers the loop count.
///
/// Loop counts before and after removal use the same bounded search, so
/// only the comparison between them is meaningful.
///
/// # Errors
///
/// Returns an error if a candidate's curve edge is missing from the graph.
pub fn find_subdivisions(
    snapshot: &SketchSnapshot,
    res: &Resolution,
    loops: &[Loop],
    config: &DiagnoseConfig,
) -> Result<Vec<TopologyIssue>> {
    if loops.is_empty() {
        return Ok(Vec::new());
    }
    let base = count_loops_bounded(&res.graph, config.removal_path_cap, config.max_loops);
    let groups = loop_groups(loops);
    let mut issues = Vec::new();

    for wire in candidates(res) {
        let Some(edge) = wire.edge else { continue };
        res.graph.edge(edge)?;
        let after = count_loops_bounded(
            &res.graph.without_edge(edge),
            config.removal_path_cap,
            config.max_loops,
        );
        if after >= base {
            continue;
        }
        debug!(geo = wire.geo, reduction = base - after, "subdivision edge");
        let (confidence, description, severity) =
            confidence(snapshot, res, wire, loops, &groups);
        issues.push(
            TopologyIssue::new(
                wire.geo,
                wire.curve,
                IssueKind::Subdivision,
                description,
                severity,
            )
            .with_confidence(confidence),
        );
    }
    info!(base_loops = base, found = issues.len(), "subdivision scan complete");
    Ok(issues)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::diagnose::resolve;
    use crate::sketch::Sketch;
    use crate::topology::enumerate_loops;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn run(s: &Sketch) -> Vec<TopologyIssue> {
        let cfg = DiagnoseConfig::default();
        let snap = SketchSnapshot::capture(s).unwrap();
        let res = resolve(&snap, &cfg).unwrap();
        let loops = enumerate_loops(&res.loop_graph, cfg.max_loops, res.normal.len()).loops;
        find_subdivisions(&snap, &res, &loops, &cfg).unwrap()
    }

    #[test]
    fn chord_of_bisected_rectangle_is_strong() {
        let mut s = Sketch::new();
        let corners = [p(0.0, 0.0), p(2.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(2.0, 2.0), p(0.0, 2.0)];
        for i in 0..6 {
            s.push_line(corners[i], corners[(i + 1) % 6], false);
        }
        let chord = s.push_line(p(2.0, 0.0), p(2.0, 2.0), false);
        let found = run(&s);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].geo, chord);
        assert_eq!(found[0].confidence, Some(Confidence::Strong));
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(found[0].description, "STRONG (internal subdivision, 8.0 units)");
    }

    #[test]
    fn plain_rectangle_has_no_candidates() {
        let mut s = Sketch::new();
        let corners = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(0.0, 2.0)];
        for i in 0..4 {
            s.push_line(corners[i], corners[(i + 1) % 4], false);
        }
        assert!(run(&s).is_empty());
    }

    #[test]
    fn no_loops_means_no_subdivisions() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        assert!(run(&s).is_empty());
    }
}
