use crate::assets::{GpuHandle, GpuUploader, MeshData, TextureData};

/// Uploader for running without a GPU: hands out sequential handles and keeps
/// a tally of what would have been uploaded.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u32,
    uploaded_bytes: usize,
}

impl HeadlessDevice {
    fn allocate(&mut self, bytes: usize) -> GpuHandle {
        self.next_handle += 1;
        self.uploaded_bytes += bytes;
        GpuHandle(self.next_handle)
    }
}

impl GpuUploader for HeadlessDevice {
    fn upload_mesh(&mut self, id: u32, mesh: &MeshData) -> GpuHandle {
        let vertex_bytes = mesh.positions.len() * 12 + mesh.normals.len() * 12 + mesh.tex_coords.len() * 8;
        let bone_bytes = mesh
            .bones
            .as_ref()
            .map_or(0, |bones| bones.ids.len() * 16 + bones.weights.len() * 16);
        let bytes = vertex_bytes + bone_bytes + mesh.indices.len() * 4;
        let handle = self.allocate(bytes);
        log::debug!(
            "Mesh {id} -> {handle:?} ({bytes} bytes, {} in total)",
            self.uploaded_bytes
        );
        handle
    }

    fn upload_texture(&mut self, id: u32, texture: &TextureData) -> GpuHandle {
        let handle = self.allocate(texture.rgb.len());
        log::debug!(
            "Texture {id} -> {handle:?} ({}x{}, {} bytes in total)",
            texture.width,
            texture.height,
            self.uploaded_bytes
        );
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential_and_bytes_tallied() {
        let mut device = HeadlessDevice::default();
        let mesh = MeshData {
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0; 3]; 3],
            tex_coords: vec![[0.0; 2]; 3],
            indices: vec![0, 1, 2],
            bones: None,
        };
        let texture = TextureData {
            width: 2,
            height: 1,
            rgb: vec![0; 6],
        };
        assert_eq!(device.upload_mesh(1, &mesh), GpuHandle(1));
        assert_eq!(device.upload_texture(1, &texture), GpuHandle(2));
        assert_eq!(device.uploaded_bytes, 3 * 12 + 3 * 12 + 3 * 8 + 12 + 6);
    }
}
