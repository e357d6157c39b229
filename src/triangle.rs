//! Denormalized triangle representation shared by every pipeline stage.
//!
//! Each [`Triangle`] owns three full copies of its vertex attributes. Stages
//! consume a triangle list and produce a new one, so no two triangles alias.

use crate::math::{Vec2, Vec3, Vec4};

/// Per-corner attributes carried through transform, clip and raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// Homogeneous position in whichever space the current stage works in.
    pub position: Vec4,
    pub normal: Vec3,
    /// Linear RGB colour or lit radiance.
    pub color: Vec3,
    pub uv: Vec2,
    /// World-space position, kept for per-pixel lighting and shadow lookup.
    pub world: Vec3,
    /// Reciprocal of clip-space W, used for perspective-correct interpolation.
    pub inv_w: f32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec4::point(0.0, 0.0, 0.0),
            normal: Vec3::ZERO,
            color: Vec3::ONE,
            uv: Vec2::ZERO,
            world: Vec3::ZERO,
            inv_w: 1.0,
        }
    }
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: Vec4::from_vec3(position, 1.0),
            normal,
            uv,
            world: position,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Interpolates every attribute with the same parameter `t`.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
            color: self.color.lerp(other.color, t),
            uv: self.uv.lerp(other.uv, t),
            world: self.world.lerp(other.world, t),
            inv_w: self.inv_w + (other.inv_w - self.inv_w) * t,
        }
    }
}

/// World-space tangent and bitangent used to lift normal-map samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentBasis {
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl TangentBasis {
    /// Builds the basis from world positions and texture coordinates.
    ///
    /// Returns `None` when the UV mapping is degenerate.
    pub fn from_vertices(vertices: &[Vertex; 3]) -> Option<Self> {
        let edge1 = vertices[1].world - vertices[0].world;
        let edge2 = vertices[2].world - vertices[0].world;
        let duv1 = vertices[1].uv - vertices[0].uv;
        let duv2 = vertices[2].uv - vertices[0].uv;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let r = 1.0 / det;
        Some(Self {
            tangent: ((edge1 * duv2.y - edge2 * duv1.y) * r).normalize(),
            bitangent: ((edge2 * duv1.x - edge1 * duv2.x) * r).normalize(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    /// Index into the owning model's material list.
    pub material: Option<usize>,
    pub tangents: Option<TangentBasis>,
}

impl Triangle {
    pub fn new(vertices: [Vertex; 3]) -> Self {
        Self {
            vertices,
            material: None,
            tangents: None,
        }
    }

    pub fn with_material(mut self, material: Option<usize>) -> Self {
        self.material = material;
        self
    }

    /// Copy of this triangle with every vertex replaced by `f(vertex)`.
    pub fn map_vertices(&self, f: impl Fn(&Vertex) -> Vertex) -> Self {
        Self {
            vertices: [
                f(&self.vertices[0]),
                f(&self.vertices[1]),
                f(&self.vertices[2]),
            ],
            ..*self
        }
    }

    /// Same triangle with new corners, keeping material and tangent basis.
    pub fn with_vertices(&self, vertices: [Vertex; 3]) -> Self {
        Self { vertices, ..*self }
    }

    /// Unnormalized geometric normal from the position edges.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices.map(|v| v.position.to_vec3());
        (b - a).cross(c - a)
    }

    /// Smallest and largest position Y.
    pub fn y_range(&self) -> (f32, f32) {
        let ys = self.vertices.map(|v| v.position.y);
        (
            ys[0].min(ys[1]).min(ys[2]),
            ys[0].max(ys[1]).max(ys[2]),
        )
    }
}
