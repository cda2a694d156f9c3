//! Reads numbered models and textures from the models-textures directory.

use super::{xfile, AssetError, AssetImporter, AssetKind, MeshData, TextureData};
use std::path::{Path, PathBuf};

/// `model<N>.x` (or `model<N>.obj`) and `texture<N>.bmp` files in one
/// directory.
#[derive(Debug, Clone)]
pub struct FileImporter {
    data_dir: PathBuf,
}

impl FileImporter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn mesh_path(&self, id: u32) -> PathBuf {
        self.data_dir.join(format!("model{id}.x"))
    }

    pub fn obj_mesh_path(&self, id: u32) -> PathBuf {
        self.data_dir.join(format!("model{id}.obj"))
    }

    pub fn texture_path(&self, id: u32) -> PathBuf {
        self.data_dir.join(format!("texture{id}.bmp"))
    }
}

impl AssetImporter for FileImporter {
    /// Prefers `model<N>.x`; falls back to `model<N>.obj` when only that
    /// exists.
    fn import_mesh(&mut self, id: u32) -> Result<MeshData, AssetError> {
        let x_path = self.mesh_path(id);
        let obj_path = self.obj_mesh_path(id);
        let (mesh, path) = if !x_path.is_file() && obj_path.is_file() {
            (import_obj(id, &obj_path)?, obj_path)
        } else {
            (import_x(id, &x_path)?, x_path)
        };
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            return Err(AssetError::EmptyMesh {
                kind: AssetKind::Mesh,
                id,
                path,
            });
        }
        Ok(mesh)
    }

    fn import_texture(&mut self, id: u32) -> Result<TextureData, AssetError> {
        let path = self.texture_path(id);
        let image = image::open(&path).map_err(|err| AssetError::Import {
            kind: AssetKind::Texture,
            id,
            path: path.clone(),
            reason: err.to_string(),
        })?;
        // GL-style uploads expect the bottom row first.
        let rgb = image.flipv().to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(TextureData {
            width,
            height,
            rgb: rgb.into_raw(),
        })
    }
}

fn mesh_error(id: u32, path: &Path, reason: String) -> AssetError {
    AssetError::Import {
        kind: AssetKind::Mesh,
        id,
        path: path.to_path_buf(),
        reason,
    }
}

fn import_x(id: u32, path: &Path) -> Result<MeshData, AssetError> {
    let bytes = std::fs::read(path).map_err(|err| mesh_error(id, path, err.to_string()))?;
    xfile::parse_mesh(&bytes).map_err(|err| mesh_error(id, path, err.to_string()))
}

fn import_obj(id: u32, path: &Path) -> Result<MeshData, AssetError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|err| mesh_error(id, path, err.to_string()))?;

    // Only the first mesh in the file is used.
    Ok(models
        .into_iter()
        .next()
        .map(|model| mesh_from_obj(model.mesh))
        .unwrap_or_default())
}

fn mesh_from_obj(mesh: tobj::Mesh) -> MeshData {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        calculate_vertex_normals(&positions, &mesh.indices)
    };

    let tex_coords = if mesh.texcoords.len() / 2 == positions.len() {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect()
    } else {
        vec![[0.0, 0.0]; positions.len()]
    };

    MeshData {
        positions,
        normals,
        tex_coords,
        indices: mesh.indices,
        bones: None,
    }
}

/// Averages the face normals touching each vertex.
pub fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![glam::Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let v0 = glam::Vec3::from(positions[i0]);
        let v1 = glam::Vec3::from(positions[i1]);
        let v2 = glam::Vec3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);
        for index in [i0, i1, i2] {
            sums[index] += face_normal;
        }
    }
    sums.into_iter()
        .map(|sum| sum.normalize_or_zero().to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    const TRIANGLE_X: &str = "xof 0303txt 0032
Mesh Triangle {
 3;
 0.0;0.0;0.0;,
 1.0;0.0;0.0;,
 0.0;1.0;0.0;;
 1;
 3;0,1,2;;
 MeshTextureCoords {
  3;
  0.0;0.0;,
  1.0;0.0;,
  0.0;1.0;;
 }
}
";

    #[test]
    fn paths_follow_numbering_scheme() {
        let importer = FileImporter::new("/data");
        assert_eq!(importer.mesh_path(12), PathBuf::from("/data/model12.x"));
        assert_eq!(
            importer.obj_mesh_path(12),
            PathBuf::from("/data/model12.obj")
        );
        assert_eq!(
            importer.texture_path(3),
            PathBuf::from("/data/texture3.bmp")
        );
    }

    #[test]
    fn imports_x_model_from_data_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model0.x"), TRIANGLE_X).unwrap();
        std::fs::write(dir.path().join("model0.obj"), "v 0 0 0\n").unwrap();

        let mut importer = FileImporter::new(dir.path());
        let mesh = importer.import_mesh(0).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.tex_coords[1], [1.0, 0.0]);
    }

    #[test]
    fn broken_x_model_is_an_import_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model5.x"), "xof 0303bin 0032....").unwrap();

        let mut importer = FileImporter::new(dir.path());
        let err = importer.import_mesh(5).unwrap_err();
        assert!(matches!(err, AssetError::Import { id: 5, .. }));
        assert!(err.to_string().contains("model5.x"));
    }

    #[test]
    fn imports_obj_and_fills_missing_normals() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model1.obj"), TRIANGLE_OBJ).unwrap();

        let mut importer = FileImporter::new(dir.path());
        let mesh = importer.import_mesh(1).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert_eq!(mesh.tex_coords.len(), 3);
    }

    #[test]
    fn imports_bmp_as_rgb_bottom_row_first() {
        let dir = TempDir::new().unwrap();
        let mut pixels = image::RgbImage::new(1, 2);
        pixels.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        pixels.put_pixel(0, 1, image::Rgb([0, 0, 255]));
        pixels.save(dir.path().join("texture2.bmp")).unwrap();

        let mut importer = FileImporter::new(dir.path());
        let texture = importer.import_texture(2).unwrap();
        assert_eq!((texture.width, texture.height), (1, 2));
        assert_eq!(texture.rgb, vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn missing_file_names_the_id() {
        let dir = TempDir::new().unwrap();
        let mut importer = FileImporter::new(dir.path());
        let err = importer.import_mesh(9).unwrap_err();
        assert!(matches!(
            err,
            AssetError::Import {
                kind: AssetKind::Mesh,
                id: 9,
                ..
            }
        ));
        assert!(err.to_string().contains("mesh 9"));
        assert!(importer.import_texture(9).is_err());
    }
}
