//! Geometry stages of a frame.
//!
//! Each stage is a pure map over a triangle list that returns a new list;
//! the `collect()` at the end of every stage is the barrier before the next
//! one. The fixed order is:
//!
//! 1. [`to_world`]: model matrix, normal matrix, tangent basis
//! 2. [`cull_back_faces`]
//! 3. shadow maps, see [`shadow`]
//! 4. [`to_view`]
//! 5. [`clip_near`]
//! 6. [`project`]: projection·viewport and homogeneous divide
//! 7. [`clip_viewport`]: the four screen edges in turn
//! 8. [`reconstruct_world`]
//!
//! [`rasterize`] and [`draw_wireframe`] then hand the final list to the
//! framebuffer bands.

pub mod shadow;

use rayon::prelude::*;

use crate::clipper::clip_triangles;
use crate::math::{Mat4, Vec3, Vec4};
use crate::projection::{Projection, Viewport};
use crate::render::framebuffer::FrameBuffer;
use crate::render::rasterizer::{PixelShader, Rasterizer};
use crate::render::shading::{phong, ShadingContext};
use crate::render::wireframe::draw_triangle_edges;
use crate::transform::normal_matrix;
use crate::triangle::{TangentBasis, Triangle};

/// The matrices of one frame, row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,
}

impl FrameMatrices {
    pub fn projection_viewport(&self) -> Mat4 {
        self.projection * self.viewport
    }

    /// World to screen.
    pub fn view_projection_viewport(&self) -> Mat4 {
        self.view * self.projection * self.viewport
    }
}

/// Model space to world space.
///
/// Positions and `world` take the model matrix, normals its inverse
/// transpose. The tangent basis is rebuilt from the world positions.
pub fn to_world(triangles: &[Triangle], model: &Mat4) -> Vec<Triangle> {
    let normals = normal_matrix(model);
    triangles
        .par_iter()
        .map(|t| {
            let mut out = t.map_vertices(|v| {
                let mut v = *v;
                let world = model.transform_point(v.position.to_vec3());
                v.position = Vec4::from_vec3(world, 1.0);
                v.world = world;
                v.normal = normals.transform_direction(v.normal).normalize();
                v
            });
            out.tangents = TangentBasis::from_vertices(&out.vertices);
            out
        })
        .collect()
}

/// Whether any corner of a world-space triangle faces `eye`.
pub fn faces_camera(triangle: &Triangle, eye: Vec3) -> bool {
    triangle
        .vertices
        .iter()
        .any(|v| v.normal.dot(v.world - eye) < 0.0)
}

/// Drops triangles whose every vertex normal points away from `eye`.
pub fn cull_back_faces(triangles: Vec<Triangle>, eye: Vec3) -> Vec<Triangle> {
    triangles
        .into_par_iter()
        .filter(|t| faces_camera(t, eye))
        .collect()
}

/// Replaces vertex colours with Phong lighting evaluated at each corner.
pub fn light_vertices(triangles: Vec<Triangle>, ctx: &ShadingContext) -> Vec<Triangle> {
    triangles
        .into_par_iter()
        .map(|t| {
            t.map_vertices(|v| {
                let mut lit = *v;
                lit.color = phong::light_vertex(ctx, &t, v.world, v.normal, v.color);
                lit
            })
        })
        .collect()
}

pub fn to_view(triangles: Vec<Triangle>, view: &Mat4) -> Vec<Triangle> {
    triangles
        .into_par_iter()
        .map(|t| {
            t.map_vertices(|v| {
                let mut v = *v;
                v.position = v.position * *view;
                v
            })
        })
        .collect()
}

pub fn clip_near(triangles: Vec<Triangle>, projection: &Projection) -> Vec<Triangle> {
    clip_triangles(&projection.near_plane(), &triangles)
}

/// View space to screen space. Each vertex keeps `1 / w` for
/// perspective-correct interpolation and ends with `w == 1`.
pub fn project(triangles: Vec<Triangle>, projection_viewport: &Mat4) -> Vec<Triangle> {
    triangles
        .into_par_iter()
        .map(|t| {
            t.map_vertices(|v| {
                let mut v = *v;
                let clip = v.position * *projection_viewport;
                v.inv_w = if clip.w != 0.0 { 1.0 / clip.w } else { 1.0 };
                v.position = clip.perspective_divide();
                v
            })
        })
        .collect()
}

/// Clips against the top, bottom, left and right edges, each pass running on
/// the previous pass's output.
pub fn clip_viewport(triangles: Vec<Triangle>, viewport: &Viewport) -> Vec<Triangle> {
    viewport
        .edge_planes()
        .iter()
        .fold(triangles, |tris, plane| clip_triangles(plane, &tris))
}

/// Recomputes every vertex's world position from its screen position.
///
/// Vertices created by the viewport clip were interpolated in screen space;
/// the inverse of `view_projection_viewport` restores their exact world
/// position. A singular matrix leaves the list unchanged.
pub fn reconstruct_world(
    triangles: Vec<Triangle>,
    view_projection_viewport: &Mat4,
) -> Vec<Triangle> {
    let Some(inverse) = view_projection_viewport.inverse() else {
        log::warn!("singular view-projection-viewport, keeping interpolated world positions");
        return triangles;
    };
    triangles
        .into_par_iter()
        .map(|t| {
            t.map_vertices(|v| {
                let mut v = *v;
                v.world = inverse.transform_point(v.position.to_vec3());
                v
            })
        })
        .collect()
}

/// Indices of the triangles touching each band of `rows` rows.
fn bin_by_band(triangles: &[Triangle], rows: u32, height: u32) -> Vec<Vec<usize>> {
    let rows = rows.max(1);
    let bands = height.div_ceil(rows) as usize;
    let mut bins = vec![Vec::new(); bands];
    if bands == 0 {
        return bins;
    }
    for (i, t) in triangles.iter().enumerate() {
        let (lo, hi) = t.y_range();
        let (lo, hi) = (lo.round(), hi.round());
        if lo.is_nan() || hi.is_nan() || hi < 0.0 || lo >= height as f32 {
            continue;
        }
        let first = (lo.max(0.0) as u32 / rows) as usize;
        let last = ((hi as u32 / rows) as usize).min(bands - 1);
        for bin in &mut bins[first..=last] {
            bin.push(i);
        }
    }
    bins
}

/// Fills screen-space triangles into `framebuffer`, one rayon task per band
/// of `rows` rows. Returns the number of dropped out-of-frame writes.
pub fn rasterize<R, S>(
    triangles: &[Triangle],
    framebuffer: &mut FrameBuffer,
    rows: u32,
    rasterizer: &R,
    shader: &S,
) -> usize
where
    R: Rasterizer + Sync,
    S: PixelShader,
{
    let rows = rows.max(1);
    let bins = bin_by_band(triangles, rows, framebuffer.height());
    framebuffer.for_each_band(rows, |slice| {
        let band = slice.y0() / rows as usize;
        for &i in bins.get(band).map(Vec::as_slice).unwrap_or_default() {
            rasterizer.fill_triangle(&triangles[i], slice, shader);
        }
    })
}

/// Draws triangle outlines without depth testing.
pub fn draw_wireframe(
    triangles: &[Triangle],
    framebuffer: &mut FrameBuffer,
    rows: u32,
    color: u32,
) -> usize {
    let rows = rows.max(1);
    let bins = bin_by_band(triangles, rows, framebuffer.height());
    framebuffer.for_each_band(rows, |slice| {
        let band = slice.y0() / rows as usize;
        for &i in bins.get(band).map(Vec::as_slice).unwrap_or_default() {
            draw_triangle_edges(&triangles[i], slice, color);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::Vec2;
    use crate::model::Model;
    use crate::render::rasterizer::{FlatShader, RasterizerDispatcher, RasterizerType};
    use crate::triangle::Vertex;
    use approx::assert_relative_eq;

    fn screen_tri(points: [(f32, f32); 3]) -> Triangle {
        Triangle::new(
            points.map(|(x, y)| Vertex::new(Vec3::new(x, y, 0.5), Vec3::FORWARD, Vec2::ZERO)),
        )
    }

    #[test]
    fn world_transform_moves_positions_and_normals() {
        let t = Triangle::new([
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec3::UP, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec3::UP, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 0.0, 1.0), Vec3::UP, Vec2::new(0.0, 1.0)),
        ]);
        let model = Mat4::scaling(2.0, 1.0, 1.0) * Mat4::translation(0.0, 3.0, 0.0);
        let out = to_world(&[t], &model);
        assert_relative_eq!(out[0].vertices[1].world, Vec3::new(2.0, 3.0, 0.0));
        assert_relative_eq!(out[0].vertices[1].normal, Vec3::UP, epsilon = 1e-6);
        assert!(out[0].tangents.is_some());
    }

    #[test]
    fn cube_culls_to_facing_sides() {
        let cube = Model::cube();
        let world = to_world(cube.triangles(), &Mat4::identity());
        let kept = cull_back_faces(world, Vec3::new(0.0, 0.0, -5.0));
        // Only the -Z face is visible head-on.
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn projection_sets_unit_w_and_inverse_depth() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, -5.0));
        let projection = camera.projection(1.0);
        let viewport = Viewport::new(100, 100);
        let matrices = FrameMatrices {
            model: Mat4::identity(),
            view: camera.view_matrix(),
            projection: projection.matrix(),
            viewport: viewport.matrix(),
        };
        let world = to_world(Model::cube().triangles(), &matrices.model);
        let view = to_view(cull_back_faces(world, camera.position()), &matrices.view);
        let screen = project(clip_near(view, &projection), &matrices.projection_viewport());
        assert!(!screen.is_empty());
        for v in screen.iter().flat_map(|t| t.vertices.iter()) {
            assert_relative_eq!(v.position.w, 1.0, epsilon = 1e-5);
            assert!(v.inv_w > 0.0);
            assert!((0.0..=1.0).contains(&v.position.z));
        }
    }

    #[test]
    fn viewport_clip_keeps_triangles_on_screen() {
        let viewport = Viewport::new(20, 20);
        let big = screen_tri([(-30.0, -30.0), (50.0, -30.0), (-30.0, 50.0)]);
        let clipped = clip_viewport(vec![big], &viewport);
        assert!(!clipped.is_empty());
        for v in clipped.iter().flat_map(|t| t.vertices.iter()) {
            assert!(v.position.x >= -1e-3 && v.position.x <= 19.0 + 1e-3);
            assert!(v.position.y >= -1e-3 && v.position.y <= 19.0 + 1e-3);
        }
    }

    #[test]
    fn world_reconstruction_inverts_projection() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, -5.0));
        let projection = camera.projection(1.0);
        let viewport = Viewport::new(64, 64);
        let vpv = camera.view_matrix() * projection.matrix() * viewport.matrix();

        let world = to_world(Model::cube().triangles(), &Mat4::identity());
        let expected: Vec<Vec3> = world.iter().flat_map(|t| t.vertices.map(|v| v.world)).collect();
        let view = to_view(world, &camera.view_matrix());
        let screen = project(view, &(projection.matrix() * viewport.matrix()));
        let mut scrambled = screen;
        for t in &mut scrambled {
            for v in &mut t.vertices {
                v.world = Vec3::ZERO;
            }
        }
        let rebuilt = reconstruct_world(scrambled, &vpv);
        let got: Vec<Vec3> = rebuilt.iter().flat_map(|t| t.vertices.map(|v| v.world)).collect();
        for (a, b) in got.iter().zip(&expected) {
            assert_relative_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn bins_cover_every_band_a_triangle_touches() {
        let t = screen_tri([(0.0, 5.0), (4.0, 5.0), (0.0, 17.0)]);
        let bins = bin_by_band(&[t], 4, 20);
        let touched: Vec<usize> = (0..bins.len()).filter(|b| !bins[*b].is_empty()).collect();
        assert_eq!(touched, vec![1, 2, 3, 4]);
    }

    #[test]
    fn banded_raster_matches_single_band() {
        let tris = vec![
            screen_tri([(1.0, 1.0), (30.0, 4.0), (8.0, 28.0)]),
            screen_tri([(25.0, 2.0), (31.0, 31.0), (3.0, 20.0)]),
        ];
        let rasterizer = RasterizerDispatcher::new(RasterizerType::Scanline);
        let mut banded = FrameBuffer::new(32, 32);
        let mut whole = FrameBuffer::new(32, 32);
        assert_eq!(rasterize(&tris, &mut banded, 3, &rasterizer, &FlatShader::new(6)), 0);
        assert_eq!(rasterize(&tris, &mut whole, 32, &rasterizer, &FlatShader::new(6)), 0);
        assert_eq!(banded.color(), whole.color());
    }
}
