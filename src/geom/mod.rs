//! Planar geometry helpers for snapping query points onto edge polylines
//! and splitting those polylines in two.
//!
//! Every input is assumed to share one projected coordinate system, so all
//! distances here are Euclidean.

use geo::{Coord, Distance, Euclidean, LineInterpolatePoint, LineLocatePoint, LineString, Point};

#[cfg(test)]
mod test;

/// Decimal places kept when comparing snapped geometry for identity.
pub const CANON_DECIMALS: u32 = 3;

const CANON_SCALE: f64 = 1_000.0;

/// A coordinate rounded to [`CANON_DECIMALS`] places and scaled to integers,
/// usable as an exact equality / hash key for "same physical location".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonKey(i64, i64);

/// Canonicalises a point for identity comparisons.
pub fn canon(point: Point<f64>) -> CanonKey {
    CanonKey(
        (point.x() * CANON_SCALE).round() as i64,
        (point.y() * CANON_SCALE).round() as i64,
    )
}

/// Projects `point` onto the closest position along `line`.
///
/// Degenerate polylines (fewer than two coordinates) resolve to their first
/// vertex; an empty polyline echoes the query point back.
pub fn project_onto(line: &LineString<f64>, point: Point<f64>) -> Point<f64> {
    line.line_locate_point(&point)
        .and_then(|fraction| line.line_interpolate_point(fraction))
        .or_else(|| line.points().next())
        .unwrap_or(point)
}

/// Euclidean length of a polyline.
pub fn polyline_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| Euclidean.distance(segment.start_point(), segment.end_point()))
        .sum()
}

/// Closest point to `point` on the segment `start`–`end`.
pub fn closest_on_segment(start: Coord<f64>, end: Coord<f64>, point: Point<f64>) -> Point<f64> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return Point::from(start);
    }

    let t = (((point.x() - start.x) * dx + (point.y() - start.y) * dy) / len2).clamp(0.0, 1.0);
    Point::new(start.x + t * dx, start.y + t * dy)
}

/// Euclidean distance from `point` to the segment `start`–`end`.
pub fn segment_distance(start: Point<f64>, end: Point<f64>, point: Point<f64>) -> f64 {
    Euclidean.distance(closest_on_segment(start.into(), end.into(), point), point)
}

/// Shortest Euclidean distance from `point` to any segment of `line`.
///
/// Degenerate polylines fall back to the distance to their first vertex;
/// an empty polyline is infinitely far away.
pub fn nearest_distance(line: &LineString<f64>, point: Point<f64>) -> f64 {
    if line.0.len() < 2 {
        return match line.0.first() {
            Some(coord) => Euclidean.distance(Point::from(*coord), point),
            None => f64::INFINITY,
        };
    }

    line.lines()
        .map(|segment| Euclidean.distance(closest_on_segment(segment.start, segment.end, point), point))
        .fold(f64::INFINITY, f64::min)
}

/// Cuts `line` in two at `at`, which must already lie on the polyline
/// (i.e. be an output of [`project_onto`]).
///
/// When the cut position coincides with one of the polyline's endpoints, the
/// single remaining part is returned twice so downstream logic always
/// observes two parts.
pub fn split_at(line: &LineString<f64>, at: Point<f64>) -> (LineString<f64>, LineString<f64>) {
    let key = canon(at);
    let coords = &line.0;

    let endpoint_hit = match (coords.first(), coords.last()) {
        (Some(first), Some(last)) => {
            key == canon(Point::from(*first)) || key == canon(Point::from(*last))
        }
        _ => true,
    };
    if coords.len() < 2 || endpoint_hit {
        return (line.clone(), line.clone());
    }

    // Segment whose closest approach to the cut position is minimal.
    let nearest = line
        .lines()
        .enumerate()
        .map(|(i, segment)| {
            let closest = closest_on_segment(segment.start, segment.end, at);
            (i, Euclidean.distance(closest, at))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    let Some((cut, _)) = nearest else {
        return (line.clone(), line.clone());
    };

    let mut head: Vec<Coord<f64>> = coords[..=cut].to_vec();
    if head.last().map(|c| canon(Point::from(*c))) != Some(key) {
        head.push(at.into());
    }

    // When the cut lands on the shared vertex of two segments, skip the
    // would-be duplicate coordinate so neither half starts or ends with a
    // zero-length segment.
    let mut tail: Vec<Coord<f64>> = Vec::with_capacity(coords.len() - cut);
    if canon(Point::from(coords[cut + 1])) != key {
        tail.push(at.into());
    }
    tail.extend_from_slice(&coords[cut + 1..]);

    (LineString::new(head), LineString::new(tail))
}
