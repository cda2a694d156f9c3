pub mod camera;
mod headless;

use camera::CameraController;
pub use headless::HeadlessDevice;

use crate::assets::{AssetError, AssetImporter, CacheStats, GpuHandle, GpuUploader, ResourceCache};
use crate::scene::{LightSlot, SceneStore};
use glam::{Mat4, Vec3, Vec4};
use winit::dpi::PhysicalSize;

/// Meshes from this number on carry an animation.
pub const ANIMATED_MESH_START: u32 = 56;
pub const ANIMATION_FPS: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniform {
    /// Eye-space position.
    pub position: Vec4,
    pub color: Vec3,
    pub brightness: f32,
}

/// Everything needed to draw one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDraw {
    pub model_view: Mat4,
    pub ambient_product: Vec3,
    pub diffuse_product: Vec3,
    pub specular_product: Vec3,
    pub shininess: f32,
    pub tex_scale: f32,
    pub mesh: GpuHandle,
    pub texture: GpuHandle,
    /// Animation time in frames for animated meshes.
    pub pose_frame: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub lights: [LightUniform; 2],
    pub draws: Vec<ObjectDraw>,
}

/// Light 1 follows the full view, light 2 only the camera rotation.
fn light_uniforms(store: &SceneStore, camera: &CameraController) -> [LightUniform; 2] {
    let first = store.light(LightSlot::First);
    let second = store.light(LightSlot::Second);
    [
        LightUniform {
            position: camera.view_matrix() * first.loc,
            color: first.rgb,
            brightness: first.brightness,
        },
        LightUniform {
            position: camera.rotation() * second.loc,
            color: second.rgb,
            brightness: second.brightness,
        },
    ]
}

/// Computes the uniforms for one frame, loading any mesh or texture that is
/// referenced for the first time.
pub fn prepare_frame(
    store: &SceneStore,
    camera: &CameraController,
    projection: Mat4,
    elapsed_secs: f32,
    cache: &mut ResourceCache,
    importer: &mut dyn AssetImporter,
    uploader: &mut dyn GpuUploader,
) -> Result<FrameUniforms, AssetError> {
    let view = camera.view_matrix();
    let mut draws = Vec::with_capacity(store.len());
    for object in store.objects() {
        let texture = cache.load_texture_if_absent(object.tex_id, importer, uploader)?;
        let mesh = cache.load_mesh_if_absent(object.mesh_id, importer, uploader)?;

        let rgb = object.rgb * object.brightness * 2.0;
        draws.push(ObjectDraw {
            model_view: view * object.model_matrix(),
            ambient_product: object.ambient * rgb,
            diffuse_product: object.diffuse * rgb,
            specular_product: object.specular * rgb,
            shininess: object.shine,
            tex_scale: object.tex_scale,
            mesh,
            texture,
            pose_frame: (object.mesh_id >= ANIMATED_MESH_START)
                .then_some(elapsed_secs * ANIMATION_FPS),
        });
    }
    Ok(FrameUniforms {
        projection,
        view,
        lights: light_uniforms(store, camera),
        draws,
    })
}

/// Owns the resource cache and the collaborators that fill it, plus the
/// projection for the current window size.
pub struct RenderContext {
    cache: ResourceCache,
    importer: Box<dyn AssetImporter>,
    uploader: Box<dyn GpuUploader>,
    projection: Mat4,
    viewport_width: u32,
    viewport_height: u32,
}

impl RenderContext {
    pub fn new(
        cache: ResourceCache,
        importer: Box<dyn AssetImporter>,
        uploader: Box<dyn GpuUploader>,
        size: PhysicalSize<u32>,
    ) -> Self {
        let mut render = Self {
            cache,
            importer,
            uploader,
            projection: Mat4::IDENTITY,
            viewport_width: 1,
            viewport_height: 1,
        };
        render.resize(size);
        render
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.viewport_width = new_size.width.max(1);
        self.viewport_height = new_size.height.max(1);
        self.projection = camera::projection_for_window(self.viewport_width, self.viewport_height);
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn prepare_frame(
        &mut self,
        store: &SceneStore,
        camera: &CameraController,
        elapsed_secs: f32,
    ) -> Result<FrameUniforms, AssetError> {
        prepare_frame(
            store,
            camera,
            self.projection,
            elapsed_secs,
            &mut self.cache,
            self.importer.as_mut(),
            self.uploader.as_mut(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::{CountingUploader, FakeImporter};
    use crate::scene::{ObjectHandle, SceneObject};

    fn scene() -> SceneStore {
        let mut store = SceneStore::new(16, 1);
        store.push(SceneObject::new(12, 3, 0.5, -0.5));
        store.push(SceneObject::new(12, 3, 1.0, 1.0));
        store
    }

    #[test]
    fn repeated_frames_load_each_asset_once() {
        let store = scene();
        let camera = CameraController::default();
        let mut cache = ResourceCache::new(59, 31);
        let mut importer = FakeImporter::default();
        let mut uploader = CountingUploader::default();

        for _ in 0..3 {
            let frame = prepare_frame(
                &store,
                &camera,
                Mat4::IDENTITY,
                0.0,
                &mut cache,
                &mut importer,
                &mut uploader,
            )
            .unwrap();
            assert_eq!(frame.draws.len(), 5);
        }
        // Meshes 0, 55, 12 and textures 1, 0, 3.
        assert_eq!(uploader.uploads, 6);
        assert_eq!(importer.mesh_requests.len(), 3);
        assert_eq!(cache.stats().meshes_loaded, 3);
        assert_eq!(cache.stats().textures_loaded, 3);
    }

    #[test]
    fn material_products_scale_by_brightness() {
        let mut store = scene();
        let object = store.get_mut(ObjectHandle(3)).unwrap();
        object.brightness = 0.5;
        object.rgb = Vec3::new(1.0, 0.5, 0.0);
        let camera = CameraController::default();
        let mut cache = ResourceCache::new(59, 31);
        let frame = prepare_frame(
            &store,
            &camera,
            Mat4::IDENTITY,
            0.0,
            &mut cache,
            &mut FakeImporter::default(),
            &mut CountingUploader::default(),
        )
        .unwrap();

        let draw = frame.draws[3];
        // rgb * brightness * 2 = (1, 0.5, 0)
        assert!((draw.ambient_product - Vec3::new(0.7, 0.35, 0.0)).length() < 1e-6);
        assert!((draw.diffuse_product - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-6);
        assert!((draw.specular_product - Vec3::new(0.5, 0.25, 0.0)).length() < 1e-6);
        assert_eq!(draw.pose_frame, None);
    }

    #[test]
    fn lights_use_view_and_rotation() {
        let store = scene();
        let camera = CameraController::new(5.0, 30.0, 20.0);
        let frame = prepare_frame(
            &store,
            &camera,
            Mat4::IDENTITY,
            0.0,
            &mut ResourceCache::new(59, 31),
            &mut FakeImporter::default(),
            &mut CountingUploader::default(),
        )
        .unwrap();

        let first = store.light(LightSlot::First).loc;
        let second = store.light(LightSlot::Second).loc;
        assert_eq!(frame.lights[0].position, camera.view_matrix() * first);
        assert_eq!(frame.lights[1].position, camera.rotation() * second);
        assert_eq!(frame.lights[1].brightness, 0.5);
    }

    #[test]
    fn failing_import_aborts_frame() {
        let mut store = scene();
        store.push(SceneObject::new(57, 2, 0.0, 0.0));
        let mut importer = FakeImporter::default();
        importer.failing_meshes.insert(57);
        let err = prepare_frame(
            &store,
            &CameraController::default(),
            Mat4::IDENTITY,
            1.0,
            &mut ResourceCache::new(59, 31),
            &mut importer,
            &mut CountingUploader::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AssetError::Import { id: 57, .. }));
    }

    #[test]
    fn animated_meshes_get_pose_time() {
        let mut store = scene();
        store.push(SceneObject::new(57, 2, 0.0, 0.0));
        let frame = prepare_frame(
            &store,
            &CameraController::default(),
            Mat4::IDENTITY,
            2.0,
            &mut ResourceCache::new(59, 31),
            &mut FakeImporter::default(),
            &mut CountingUploader::default(),
        )
        .unwrap();
        assert_eq!(frame.draws.last().unwrap().pose_frame, Some(60.0));
    }

    #[test]
    fn context_tracks_window_size() {
        let mut render = RenderContext::new(
            ResourceCache::new(59, 31),
            Box::new(FakeImporter::default()),
            Box::new(HeadlessDevice::default()),
            PhysicalSize::new(960, 640),
        );
        assert_eq!(render.viewport_size(), (960, 640));
        render.resize(PhysicalSize::new(0, 0));
        assert_eq!(render.viewport_size(), (1, 1));
        let frame = render
            .prepare_frame(&scene(), &CameraController::default(), 0.0)
            .unwrap();
        assert_eq!(frame.draws.len(), 5);
        assert_eq!(render.cache_stats().meshes_loaded, 3);
    }
}
