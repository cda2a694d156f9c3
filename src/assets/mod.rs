pub mod import;
mod xfile;

use std::fmt;
use std::path::PathBuf;

pub use import::FileImporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Mesh,
    Texture,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Mesh => f.write_str("mesh"),
            AssetKind::Texture => f.write_str("texture"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("no such {kind} number: {id} (only {count} exist)")]
    UnknownId { kind: AssetKind, id: u32, count: u32 },
    #[error("failed to read {kind} {id} from {path}: {reason}")]
    Import {
        kind: AssetKind,
        id: u32,
        path: PathBuf,
        reason: String,
    },
    #[error("{kind} {id} at {path} contains no geometry")]
    EmptyMesh {
        kind: AssetKind,
        id: u32,
        path: PathBuf,
    },
}

/// Per-vertex skinning data, four influences per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneWeights {
    pub ids: Vec<[i32; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Normalized geometry handed over by the importer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub bones: Option<BoneWeights>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Tightly packed RGB pixels, bottom row first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Loads raw asset data by number.
pub trait AssetImporter {
    fn import_mesh(&mut self, id: u32) -> Result<MeshData, AssetError>;
    fn import_texture(&mut self, id: u32) -> Result<TextureData, AssetError>;
}

/// Opaque handle to an uploaded GPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuHandle(pub u32);

/// Receives decoded assets exactly once and hands back a handle for drawing.
pub trait GpuUploader {
    fn upload_mesh(&mut self, id: u32, mesh: &MeshData) -> GpuHandle;
    fn upload_texture(&mut self, id: u32, texture: &TextureData) -> GpuHandle;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub meshes_loaded: usize,
    pub textures_loaded: usize,
}

/// Grow-only store of loaded meshes and textures, indexed by asset number.
///
/// Entries are created on first reference and kept for the lifetime of the
/// cache. Decoded data is dropped once the uploader has it; only the handle
/// stays.
pub struct ResourceCache {
    meshes: Vec<Option<GpuHandle>>,
    textures: Vec<Option<GpuHandle>>,
    stats: CacheStats,
}

impl ResourceCache {
    pub fn new(mesh_count: u32, texture_count: u32) -> Self {
        Self {
            meshes: (0..mesh_count).map(|_| None).collect(),
            textures: (0..texture_count).map(|_| None).collect(),
            stats: CacheStats::default(),
        }
    }

    pub fn mesh_count(&self) -> u32 {
        self.meshes.len() as u32
    }

    pub fn texture_count(&self) -> u32 {
        self.textures.len() as u32
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns the mesh handle, importing and uploading it on first use.
    pub fn load_mesh_if_absent(
        &mut self,
        id: u32,
        importer: &mut dyn AssetImporter,
        uploader: &mut dyn GpuUploader,
    ) -> Result<GpuHandle, AssetError> {
        let count = self.mesh_count();
        let slot = self
            .meshes
            .get_mut(id as usize)
            .ok_or(AssetError::UnknownId {
                kind: AssetKind::Mesh,
                id,
                count,
            })?;
        if let Some(handle) = *slot {
            return Ok(handle);
        }

        let data = importer.import_mesh(id)?;
        let handle = uploader.upload_mesh(id, &data);
        log::info!(
            "Loaded mesh {} ({} vertices, {} triangles)",
            id,
            data.vertex_count(),
            data.triangle_count()
        );
        *slot = Some(handle);
        self.stats.meshes_loaded += 1;
        Ok(handle)
    }

    /// Returns the texture handle, importing and uploading it on first use.
    pub fn load_texture_if_absent(
        &mut self,
        id: u32,
        importer: &mut dyn AssetImporter,
        uploader: &mut dyn GpuUploader,
    ) -> Result<GpuHandle, AssetError> {
        let count = self.texture_count();
        let slot = self
            .textures
            .get_mut(id as usize)
            .ok_or(AssetError::UnknownId {
                kind: AssetKind::Texture,
                id,
                count,
            })?;
        if let Some(handle) = *slot {
            return Ok(handle);
        }

        let data = importer.import_texture(id)?;
        let handle = uploader.upload_texture(id, &data);
        log::info!(
            "Loaded a {} by {} texture ({})",
            data.width,
            data.height,
            id
        );
        *slot = Some(handle);
        self.stats.textures_loaded += 1;
        Ok(handle)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    /// Importer that fabricates tiny assets and records every request.
    #[derive(Default)]
    pub struct FakeImporter {
        pub mesh_requests: Vec<u32>,
        pub texture_requests: Vec<u32>,
        pub failing_meshes: HashSet<u32>,
    }

    impl AssetImporter for FakeImporter {
        fn import_mesh(&mut self, id: u32) -> Result<MeshData, AssetError> {
            self.mesh_requests.push(id);
            if self.failing_meshes.contains(&id) {
                return Err(AssetError::Import {
                    kind: AssetKind::Mesh,
                    id,
                    path: PathBuf::from(format!("model{id}.obj")),
                    reason: "missing".to_string(),
                });
            }
            Ok(MeshData {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
                indices: vec![0, 1, 2],
                bones: None,
            })
        }

        fn import_texture(&mut self, id: u32) -> Result<TextureData, AssetError> {
            self.texture_requests.push(id);
            Ok(TextureData {
                width: 1,
                height: 1,
                rgb: vec![255, 0, 0],
            })
        }
    }

    /// Uploader that hands out sequential handles and counts uploads.
    #[derive(Default)]
    pub struct CountingUploader {
        pub next: u32,
        pub uploads: usize,
    }

    impl GpuUploader for CountingUploader {
        fn upload_mesh(&mut self, _id: u32, _mesh: &MeshData) -> GpuHandle {
            self.uploads += 1;
            self.next += 1;
            GpuHandle(self.next)
        }

        fn upload_texture(&mut self, _id: u32, _texture: &TextureData) -> GpuHandle {
            self.uploads += 1;
            self.next += 1;
            GpuHandle(self.next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{CountingUploader, FakeImporter};
    use super::*;

    #[test]
    fn second_mesh_load_reuses_handle() {
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        let mut uploader = CountingUploader::default();

        let first = cache
            .load_mesh_if_absent(12, &mut importer, &mut uploader)
            .unwrap();
        let second = cache
            .load_mesh_if_absent(12, &mut importer, &mut uploader)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(importer.mesh_requests, vec![12]);
        assert_eq!(uploader.uploads, 1);
        assert_eq!(cache.stats().meshes_loaded, 1);
    }

    #[test]
    fn texture_load_is_idempotent() {
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        let mut uploader = CountingUploader::default();

        let first = cache
            .load_texture_if_absent(3, &mut importer, &mut uploader)
            .unwrap();
        for _ in 0..3 {
            assert_eq!(
                cache
                    .load_texture_if_absent(3, &mut importer, &mut uploader)
                    .unwrap(),
                first
            );
        }
        assert_eq!(importer.texture_requests, vec![3]);
        assert_eq!(cache.stats().textures_loaded, 1);
    }

    #[test]
    fn unknown_id_creates_no_state() {
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        let mut uploader = CountingUploader::default();

        let err = cache
            .load_mesh_if_absent(59, &mut importer, &mut uploader)
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::UnknownId {
                kind: AssetKind::Mesh,
                id: 59,
                count: 59
            }
        ));
        assert!(cache
            .load_texture_if_absent(31, &mut importer, &mut uploader)
            .is_err());
        assert!(importer.mesh_requests.is_empty());
        assert_eq!(uploader.uploads, 0);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn failed_import_leaves_slot_empty() {
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        importer.failing_meshes.insert(4);
        let mut uploader = CountingUploader::default();

        assert!(cache
            .load_mesh_if_absent(4, &mut importer, &mut uploader)
            .is_err());
        assert_eq!(uploader.uploads, 0);
        assert_eq!(cache.stats().meshes_loaded, 0);

        // The slot stays empty, so the next frame asks the importer again.
        importer.failing_meshes.clear();
        assert!(cache
            .load_mesh_if_absent(4, &mut importer, &mut uploader)
            .is_ok());
        assert_eq!(importer.mesh_requests, vec![4, 4]);
    }

    #[test]
    fn distinct_ids_get_distinct_handles() {
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        let mut uploader = CountingUploader::default();

        let a = cache
            .load_mesh_if_absent(1, &mut importer, &mut uploader)
            .unwrap();
        let b = cache
            .load_mesh_if_absent(2, &mut importer, &mut uploader)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.stats().meshes_loaded, 2);
    }
}
