use geo::{LineString, Point};
use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geom::nearest_distance;
use crate::network::EdgeRecord;

/// An edge geometry as stored in the spatial index.
#[derive(Debug)]
pub struct IndexedEdge {
    pub edge_id: i64,
    pub line: LineString<f64>,
}

impl RTreeObject for IndexedEdge {
    type Envelope = AABB<Point<f64>>;

    fn envelope(&self) -> Self::Envelope {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for coord in &self.line.0 {
            min_x = min_x.min(coord.x);
            min_y = min_y.min(coord.y);
            max_x = max_x.max(coord.x);
            max_y = max_y.max(coord.y);
        }

        AABB::from_corners(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }
}

impl PointDistance for IndexedEdge {
    fn distance_2(&self, point: &Point<f64>) -> f64 {
        let distance = nearest_distance(&self.line, *point);
        distance * distance
    }
}

/// Nearest-edge lookup over the loaded edge geometries.
///
/// The R-tree answers the common case; the stored lines remain available so
/// a failed index lookup degrades to a full linear scan instead of no
/// answer at all.
#[derive(Debug)]
pub struct EdgeIndex {
    tree: RTree<IndexedEdge>,
    lines: Vec<(i64, LineString<f64>)>,
}

impl EdgeIndex {
    pub fn new(edges: &[EdgeRecord]) -> EdgeIndex {
        let indexed = edges
            .iter()
            .map(|edge| IndexedEdge {
                edge_id: edge.edge_id,
                line: edge.geometry.clone(),
            })
            .collect();

        EdgeIndex {
            tree: RTree::bulk_load(indexed),
            lines: edges
                .iter()
                .map(|edge| (edge.edge_id, edge.geometry.clone()))
                .collect(),
        }
    }

    /// The `edge_id` of the edge geometry nearest to `point`. `None` only
    /// when the index holds nothing at all.
    pub fn nearest(&self, point: Point<f64>) -> Option<i64> {
        if let Some(hit) = self.tree.nearest_neighbor(&point) {
            return Some(hit.edge_id);
        }

        debug!("Index lookup failed, falling back to linear scan");
        self.scan(point)
    }

    /// Linear fallback: scans every stored line for the closest one.
    pub fn scan(&self, point: Point<f64>) -> Option<i64> {
        self.lines
            .iter()
            .map(|(edge_id, line)| (*edge_id, nearest_distance(line, point)))
            .filter(|(_, distance)| distance.is_finite())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(edge_id, _)| edge_id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
