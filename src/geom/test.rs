use approx::assert_relative_eq;
use geo::{line_string, point, LineString};

use super::*;

fn bent_line() -> LineString<f64> {
    line_string![
        (x: 0.0, y: 0.0),
        (x: 10.0, y: 0.0),
        (x: 10.0, y: 10.0),
    ]
}

#[test]
fn canon_rounds_to_three_decimals() {
    assert_eq!(canon(point! { x: 1.0001, y: 2.0 }), canon(point! { x: 1.0004, y: 2.0 }));
    assert_ne!(canon(point! { x: 1.0001, y: 2.0 }), canon(point! { x: 1.0006, y: 2.0 }));
}

#[test]
fn projection_is_perpendicular_foot() {
    let projected = project_onto(&bent_line(), point! { x: 4.0, y: 3.0 });

    assert_relative_eq!(projected.x(), 4.0);
    assert_relative_eq!(projected.y(), 0.0);
}

#[test]
fn projection_clamps_past_the_end() {
    let projected = project_onto(&bent_line(), point! { x: 25.0, y: 25.0 });

    assert_relative_eq!(projected.x(), 10.0);
    assert_relative_eq!(projected.y(), 10.0);
}

#[test]
fn length_follows_every_segment() {
    assert_relative_eq!(polyline_length(&bent_line()), 20.0);
}

#[test]
fn nearest_distance_picks_the_closest_segment() {
    assert_relative_eq!(nearest_distance(&bent_line(), point! { x: 12.0, y: 5.0 }), 2.0);
    assert_relative_eq!(nearest_distance(&bent_line(), point! { x: 5.0, y: -3.0 }), 3.0);
}

#[test]
fn split_conserves_length() {
    let line = bent_line();
    let at = project_onto(&line, point! { x: 10.0, y: 4.0 });

    let (head, tail) = split_at(&line, at);

    assert_relative_eq!(polyline_length(&head), 14.0);
    assert_relative_eq!(polyline_length(&tail), 6.0);
    assert_relative_eq!(polyline_length(&head) + polyline_length(&tail), polyline_length(&line));
}

#[test]
fn split_on_an_interior_vertex_keeps_halves_clean() {
    let (head, tail) = split_at(&bent_line(), point! { x: 10.0, y: 0.0 });

    assert_eq!(head.0.len(), 2);
    assert_eq!(tail.0.len(), 2);
    assert_relative_eq!(polyline_length(&head), 10.0);
    assert_relative_eq!(polyline_length(&tail), 10.0);
}

#[test]
fn split_on_an_endpoint_duplicates_the_part() {
    let line = bent_line();
    let (head, tail) = split_at(&line, point! { x: 0.0, y: 0.0 });

    assert_eq!(head, line);
    assert_eq!(tail, line);
}
