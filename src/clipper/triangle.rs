use std::array;
use std::iter::Flatten;

use rayon::prelude::*;

use super::plane::Plane;
use crate::triangle::{Triangle, Vertex};

/// Outcome of clipping one triangle against one plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Clipped {
    /// Every vertex was outside.
    Culled,
    /// Every vertex was inside; the input is returned untouched.
    Whole(Triangle),
    /// One vertex inside.
    Single(Triangle),
    /// Two vertices inside; the clipped quad is tiled by two triangles.
    Split(Triangle, Triangle),
}

impl Clipped {
    pub fn len(&self) -> usize {
        match self {
            Clipped::Culled => 0,
            Clipped::Whole(_) | Clipped::Single(_) => 1,
            Clipped::Split(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Clipped::Culled)
    }
}

impl IntoIterator for Clipped {
    type Item = Triangle;
    type IntoIter = Flatten<array::IntoIter<Option<Triangle>, 2>>;

    fn into_iter(self) -> Self::IntoIter {
        let slots = match self {
            Clipped::Culled => [None, None],
            Clipped::Whole(t) | Clipped::Single(t) => [Some(t), None],
            Clipped::Split(a, b) => [Some(a), Some(b)],
        };
        slots.into_iter().flatten()
    }
}

/// Clips `triangle` against the inside half-space of `plane`.
///
/// Every attribute of a new vertex is interpolated with the same parameter
/// used for its position. Output triangles keep the input winding.
pub fn clip_triangle(plane: &Plane, triangle: &Triangle) -> Clipped {
    let v = &triangle.vertices;
    let d = v.map(|vertex| plane.signed_distance(vertex.position.to_vec3()));
    let inside = d.map(|dist| dist >= 0.0);

    let crossing = |a: usize, b: usize| -> Vertex {
        v[a].lerp(&v[b], Plane::intersection(d[a], d[b]))
    };

    match inside.iter().filter(|&&i| i).count() {
        3 => Clipped::Whole(*triangle),
        0 => Clipped::Culled,
        1 => {
            let i = inside.iter().position(|&i| i).unwrap_or(0);
            let (n1, n2) = ((i + 1) % 3, (i + 2) % 3);
            Clipped::Single(triangle.with_vertices([v[i], crossing(i, n1), crossing(i, n2)]))
        }
        _ => {
            let o = inside.iter().position(|&i| !i).unwrap_or(0);
            // Cyclic order o -> in0 -> in1 keeps the original winding.
            let (in0, in1) = ((o + 1) % 3, (o + 2) % 3);
            let x0 = crossing(in0, o);
            let x1 = crossing(in1, o);
            Clipped::Split(
                triangle.with_vertices([v[in0], v[in1], x0]),
                triangle.with_vertices([v[in1], x1, x0]),
            )
        }
    }
}

/// Clips a whole triangle list against one plane in parallel.
pub fn clip_triangles(plane: &Plane, triangles: &[Triangle]) -> Vec<Triangle> {
    triangles
        .par_iter()
        .flat_map_iter(|t| clip_triangle(plane, t))
        .collect()
}
