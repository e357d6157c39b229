//! Triangle-soup models.
//!
//! A [`Model`] is built from polygonal faces by fan triangulation and owns
//! its material list and world transform. OBJ files are read through `tobj`
//! without triangulation so that the fan expansion here is the only one.

use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::material::Material;
use crate::math::{Vec2, Vec3};
use crate::texture::Texture;
use crate::transform::Transform;
use crate::triangle::{Triangle, Vertex};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("problem while loading model: {0}")]
    Load(#[from] tobj::LoadError),
    /// `face` is `None` when the problem concerns the model as a whole.
    #[error(
        "malformed model{}: {reason}",
        .face.map(|f| format!(" at face {f}")).unwrap_or_default()
    )]
    Malformed { face: Option<usize>, reason: String },
    #[error("problem while loading texture {path:?}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// One corner of a polygon: indices into the shared attribute arrays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceCorner {
    pub position: usize,
    pub uv: Option<usize>,
    pub normal: Option<usize>,
}

impl FaceCorner {
    pub fn new(position: usize, uv: Option<usize>, normal: Option<usize>) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    pub corners: Vec<FaceCorner>,
    pub material: Option<usize>,
}

/// Indexed polygon data as produced by a model reader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Face>,
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    name: String,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    transform: Transform,
}

fn lookup<T: Copy>(items: &[T], index: usize, face: usize, what: &str) -> Result<T, ModelError> {
    items.get(index).copied().ok_or_else(|| ModelError::Malformed {
        face: Some(face),
        reason: format!("{what} index {index} out of range ({} available)", items.len()),
    })
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        triangles: Vec<Triangle>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            name: name.into(),
            triangles,
            materials,
            transform: Transform::default(),
        }
    }

    /// Builds a model by fan-triangulating every face.
    ///
    /// An N-gon `[v0, v1, ..., vn-1]` becomes `(v0, vi, vi+1)` for
    /// `i in 1..n-1`. Corners without a normal get the face normal from the
    /// cross product of the first two edges.
    pub fn from_faces(
        name: impl Into<String>,
        mesh: &MeshData,
        materials: Vec<Material>,
    ) -> Result<Self, ModelError> {
        let mut triangles = Vec::with_capacity(mesh.faces.len() * 2);

        for (index, face) in mesh.faces.iter().enumerate() {
            if face.corners.len() < 3 {
                return Err(ModelError::Malformed {
                    face: Some(index),
                    reason: format!("{} corners, need at least 3", face.corners.len()),
                });
            }
            if let Some(m) = face.material.filter(|&m| m >= materials.len()) {
                return Err(ModelError::Malformed {
                    face: Some(index),
                    reason: format!("material {m} out of range ({} available)", materials.len()),
                });
            }

            let positions = face
                .corners
                .iter()
                .map(|c| lookup(&mesh.positions, c.position, index, "position"))
                .collect::<Result<Vec<_>, _>>()?;
            let face_normal = (positions[1] - positions[0])
                .cross(positions[2] - positions[0])
                .normalize();

            let vertices = face
                .corners
                .iter()
                .zip(&positions)
                .map(|(corner, &position)| {
                    let normal = match corner.normal {
                        Some(n) => lookup(&mesh.normals, n, index, "normal")?.normalize(),
                        None => face_normal,
                    };
                    let uv = match corner.uv {
                        Some(t) => lookup(&mesh.uvs, t, index, "uv")?,
                        None => Vec2::ZERO,
                    };
                    Ok::<_, ModelError>(Vertex::new(position, normal, uv))
                })
                .collect::<Result<Vec<_>, _>>()?;

            triangles.extend(fan(&vertices).map(|t| t.with_material(face.material)));
        }

        if triangles.is_empty() {
            return Err(ModelError::Malformed {
                face: None,
                reason: "model has no faces".into(),
            });
        }

        Ok(Self::new(name, triangles, materials))
    }

    /// Loads an OBJ file and its MTL materials and texture maps.
    ///
    /// A missing or unreadable MTL file is tolerated: the model falls back to
    /// the default material.
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let options = tobj::LoadOptions {
            single_index: false,
            triangulate: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &options)?;
        let materials = match materials {
            Ok(m) => m,
            Err(e) => {
                warn!("no materials for {}: {e}", path.display());
                Vec::new()
            }
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut materials = materials
            .iter()
            .map(|m| convert_material(m, base))
            .collect::<Result<Vec<_>, _>>()?;

        let mut mesh = MeshData::default();
        for model in &models {
            append_mesh(&mut mesh, &model.mesh);
        }
        if materials.is_empty() {
            materials.push(Material::default());
            for face in &mut mesh.faces {
                face.material = Some(0);
            }
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let model = Self::from_faces(name, &mesh, materials)?;
        info!(
            "loaded {} ({} triangles, {} materials)",
            path.display(),
            model.triangles.len(),
            model.materials.len()
        );
        Ok(model)
    }

    /// Axis-aligned unit-radius cube with per-face normals and UVs.
    pub fn cube() -> Self {
        const FACES: [[[f32; 3]; 4]; 6] = [
            [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
            [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]],
            [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
            [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
            [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],
            [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        ];
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        let triangles = FACES
            .iter()
            .flat_map(|quad| {
                let corners: Vec<Vec3> = quad.iter().map(|&[x, y, z]| Vec3::new(x, y, z)).collect();
                let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]).normalize();
                let vertices: Vec<Vertex> = corners
                    .iter()
                    .zip(uvs)
                    .map(|(&p, uv)| Vertex::new(p, normal, uv))
                    .collect();
                fan(&vertices)
                    .map(|t| t.with_material(Some(0)))
                    .collect::<Vec<_>>()
            })
            .collect();

        Self::new("cube", triangles, vec![Material::default()])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut Vec<Material> {
        &mut self.materials
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

/// Fan triangulation around the first vertex.
fn fan(vertices: &[Vertex]) -> impl Iterator<Item = Triangle> + '_ {
    (1..vertices.len().saturating_sub(1))
        .map(move |i| Triangle::new([vertices[0], vertices[i], vertices[i + 1]]))
}

fn append_mesh(out: &mut MeshData, mesh: &tobj::Mesh) {
    let position_base = out.positions.len();
    let normal_base = out.normals.len();
    let uv_base = out.uvs.len();

    out.positions.extend(
        mesh.positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2])),
    );
    out.normals.extend(
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2])),
    );
    out.uvs
        .extend(mesh.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], t[1])));

    // An empty arity list means every face is a triangle.
    let arities: Vec<usize> = if mesh.face_arities.is_empty() {
        vec![3; mesh.indices.len() / 3]
    } else {
        mesh.face_arities.iter().map(|&a| a as usize).collect()
    };

    let mut start = 0;
    for arity in arities {
        let corners = (start..start + arity)
            .filter_map(|k| {
                let position = *mesh.indices.get(k)? as usize + position_base;
                let uv = mesh.texcoord_indices.get(k).map(|&t| t as usize + uv_base);
                let normal = mesh.normal_indices.get(k).map(|&n| n as usize + normal_base);
                Some(FaceCorner::new(position, uv, normal))
            })
            .collect();
        out.faces.push(Face {
            corners,
            material: mesh.material_id,
        });
        start += arity;
    }
}

fn load_map(base: &Path, file: &Option<String>) -> Result<Option<Texture>, ModelError> {
    let Some(file) = file.as_deref().filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let path = base.join(file);
    Texture::from_file(&path)
        .map(Some)
        .map_err(|source| ModelError::Texture { path, source })
}

fn convert_material(m: &tobj::Material, base: &Path) -> Result<Material, ModelError> {
    let defaults = Material::default();
    let rgb = |c: Option<[f32; 3]>, fallback: Vec3| {
        c.map_or(fallback, |[r, g, b]| Vec3::new(r, g, b))
    };
    let reflection = m.unknown_param.get("refl").cloned();

    Ok(Material {
        name: m.name.clone(),
        ambient: rgb(m.ambient, defaults.ambient),
        diffuse: rgb(m.diffuse, defaults.diffuse),
        specular: rgb(m.specular, defaults.specular),
        shininess: m.shininess.unwrap_or(defaults.shininess),
        dissolve: m.dissolve.unwrap_or(defaults.dissolve),
        optical_density: m.optical_density.unwrap_or(defaults.optical_density),
        illumination_model: m.illumination_model.unwrap_or(defaults.illumination_model),
        metallic: defaults.metallic,
        ambient_map: load_map(base, &m.ambient_texture)?,
        diffuse_map: load_map(base, &m.diffuse_texture)?,
        specular_map: load_map(base, &m.specular_texture)?,
        shininess_map: load_map(base, &m.shininess_texture)?,
        dissolve_map: load_map(base, &m.dissolve_texture)?,
        normal_map: load_map(base, &m.normal_texture)?,
        reflection_map: load_map(base, &reflection)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad_mesh() -> MeshData {
        MeshData {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![],
            uvs: vec![],
            faces: vec![Face {
                corners: (0..4).map(|i| FaceCorner::new(i, None, None)).collect(),
                material: None,
            }],
        }
    }

    #[test]
    fn quad_triangulates_into_two_fan_triangles() {
        let mesh = quad_mesh();
        let model = Model::from_faces("quad", &mesh, vec![]).expect("valid quad");
        let positions: Vec<[Vec3; 3]> = model
            .triangles()
            .iter()
            .map(|t| t.vertices.map(|v| v.position.to_vec3()))
            .collect();
        let p = &mesh.positions;
        assert_eq!(positions, vec![[p[0], p[1], p[2]], [p[0], p[2], p[3]]]);
    }

    #[test]
    fn missing_normals_come_from_cross_product() {
        let model = Model::from_faces("quad", &quad_mesh(), vec![]).expect("valid quad");
        for t in model.triangles() {
            for v in &t.vertices {
                assert_relative_eq!(v.normal, Vec3::FORWARD);
            }
        }
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let mut mesh = quad_mesh();
        mesh.faces[0].corners[2].position = 17;
        let err = Model::from_faces("broken", &mesh, vec![]).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { face: Some(0), .. }));
    }

    #[test]
    fn face_with_two_corners_is_malformed() {
        let mut mesh = quad_mesh();
        mesh.faces[0].corners.truncate(2);
        assert!(matches!(
            Model::from_faces("line", &mesh, vec![]),
            Err(ModelError::Malformed { .. })
        ));
    }

    #[test]
    fn unknown_material_is_malformed() {
        let mut mesh = quad_mesh();
        mesh.faces[0].material = Some(1);
        assert!(matches!(
            Model::from_faces("quad", &mesh, vec![Material::default()]),
            Err(ModelError::Malformed { face: Some(0), .. })
        ));
    }

    #[test]
    fn mesh_without_faces_is_malformed() {
        let err = Model::from_faces("empty", &MeshData::default(), vec![]).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { face: None, .. }));
        assert_eq!(err.to_string(), "malformed model: model has no faces");
    }

    #[test]
    fn obj_without_faces_is_malformed() {
        let dir = std::env::temp_dir().join(format!("shadeline-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("points.obj");
        std::fs::write(&path, "v 0 0 0
v 1 0 0
").expect("write obj");

        let result = Model::load_obj(&path);
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(ModelError::Malformed { face: None, .. })));
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = Model::cube();
        assert_eq!(cube.triangles().len(), 12);
        for t in cube.triangles() {
            let center = t
                .vertices
                .iter()
                .fold(Vec3::ZERO, |acc, v| acc + v.position.to_vec3())
                / 3.0;
            assert!(t.vertices[0].normal.dot(center) > 0.0);
        }
    }
}
