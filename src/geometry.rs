//! Spatial relations between axis-aligned bounding boxes.
//!
//! All functions in this module are pure. Thresholds come from a [`GeometryConfig`], whose
//! defaults are the constants defined here. The vertical axis is `y`; `x` and `z` are horizontal.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;

/// Minimum vertical clearance for one box to count as above another.
pub const ABOVE_MARGIN: f64 = 0.1;

/// Separation distance below which two boxes are near each other.
pub const NEAR_THRESHOLD: f64 = 0.5;

/// Vertical tolerance between a box's bottom and another box's top for resting on it.
pub const ON_TOP_EPSILON: f64 = 0.08;

/// Slack allowed on every face when testing geometric containment.
pub const INSIDE_MARGIN: f64 = 0.02;

/// Half extents of the box standing in for the agent's body, centred on its position.
pub const AGENT_HALF_EXTENTS: Point3 = Point3 {
    x: 0.25,
    y: 0.9,
    z: 0.25,
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn from_axes([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

impl BoundingBox {
    /// Create a box from two opposite corners, in any order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self::from_corners([a, b]).unwrap_or(Self { min: a, max: b })
    }

    /// The smallest box enclosing every corner. Returns `None` if no corners are given.
    pub fn from_corners<I>(corners: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut corners = corners.into_iter();
        let first = corners.next()?.axes().map(OrderedFloat);

        let (lo, hi) = corners.fold((first, first), |(mut lo, mut hi), corner| {
            for (axis, value) in corner.axes().into_iter().enumerate() {
                lo[axis] = lo[axis].min(OrderedFloat(value));
                hi[axis] = hi[axis].max(OrderedFloat(value));
            }

            (lo, hi)
        });

        Some(Self {
            min: Point3::from_axes(lo.map(OrderedFloat::into_inner)),
            max: Point3::from_axes(hi.map(OrderedFloat::into_inner)),
        })
    }

    /// A box centred on a point with the given half extents.
    pub fn around(center: Point3, half_extents: Point3) -> Self {
        Self {
            min: Point3::new(
                center.x - half_extents.x,
                center.y - half_extents.y,
                center.z - half_extents.z,
            ),
            max: Point3::new(
                center.x + half_extents.x,
                center.y + half_extents.y,
                center.z + half_extents.z,
            ),
        }
    }

    pub fn min(&self) -> Point3 {
        self.min
    }

    pub fn max(&self) -> Point3 {
        self.max
    }
}

/// Something that may take part in a spatial relation: an identifier, an optional box, and the
/// containment hints reported by the simulator.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    pub id: &'a str,
    pub bounds: Option<&'a BoundingBox>,
    pub contents: &'a [String],
    pub parents: &'a [String],
}

/// `a` is above `b` when its bottom clears `b`'s top by more than the above margin.
pub fn is_above(a: &BoundingBox, b: &BoundingBox, config: &GeometryConfig) -> bool {
    a.min.y - b.max.y > config.above_margin
}

pub fn is_below(a: &BoundingBox, b: &BoundingBox, config: &GeometryConfig) -> bool {
    is_above(b, a, config)
}

/// Minimum Euclidean distance between two boxes. Zero when they touch or overlap.
pub fn box_distance(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let (a_min, a_max) = (a.min.axes(), a.max.axes());
    let (b_min, b_max) = (b.min.axes(), b.max.axes());

    (0..3)
        .map(|axis| {
            let gap = a_min[axis].max(b_min[axis]) - a_max[axis].min(b_max[axis]);
            gap.max(0.0).powi(2)
        })
        .sum::<f64>()
        .sqrt()
}

pub fn is_near(a: &BoundingBox, b: &BoundingBox, config: &GeometryConfig) -> bool {
    box_distance(a, b) < config.near_threshold
}

/// Geometric containment of `inner` within `outer`, allowing the inside margin on every face.
pub fn is_contained(inner: &BoundingBox, outer: &BoundingBox, config: &GeometryConfig) -> bool {
    let margin = config.inside_margin;
    let (inner_min, inner_max) = (inner.min.axes(), inner.max.axes());
    let (outer_min, outer_max) = (outer.min.axes(), outer.max.axes());

    (0..3).all(|axis| {
        inner_min[axis] >= outer_min[axis] - margin && inner_max[axis] <= outer_max[axis] + margin
    })
}

/// `a` is inside `b` if the simulator says so, or failing that, if `a`'s box lies within `b`'s.
pub fn is_inside(a: &Body<'_>, b: &Body<'_>, config: &GeometryConfig) -> bool {
    let hinted = b.contents.iter().any(|id| id == a.id) || a.parents.iter().any(|id| id == b.id);

    hinted
        || match (a.bounds, b.bounds) {
            (Some(inner), Some(outer)) => is_contained(inner, outer, config),
            _ => false,
        }
}

fn horizontal_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    let overlap_x = a.min.x <= b.max.x && b.min.x <= a.max.x;
    let overlap_z = a.min.z <= b.max.z && b.min.z <= a.max.z;

    overlap_x && overlap_z
}

/// `a` rests on `b` when they overlap horizontally and `a`'s bottom is level with `b`'s top.
pub fn is_on_top(a: &BoundingBox, b: &BoundingBox, config: &GeometryConfig) -> bool {
    (a.min.y - b.max.y).abs() <= config.on_top_epsilon && horizontal_overlap(a, b)
}
