//! Edit modes and the operations the menus and pointer drive.
//!
//! [`Editor`] owns the scene, the camera and the drag bindings. Every mode is
//! nothing more than a pair of [`gesture::Binding`]s installed over the
//! camera, a light, or the current object.

pub mod gesture;
pub mod menu;

use crate::config::EditorConfig;
use crate::render::camera::{CameraController, CameraField};
use crate::scene::serialization::{DecodeLimits, PersistenceError, SceneSnapshot, SlotStore};
use crate::scene::{LightSlot, ObjectField, ObjectHandle, SceneObject, SceneStore};
use gesture::{row_major, Binding, Channel, DragButton, GestureBindings, Param, ParamSink};
use glam::{Mat2, Vec2};
use menu::{MenuCommand, MenuKind, MenuRanges};
use rand::rngs::StdRng;
use rand::Rng;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("unknown {kind:?} menu id {id}")]
    UnknownMenuId { kind: MenuKind, id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    CameraOrbit,
    PositionScale,
    RotateAndTexScale,
    MaterialColor,
    MaterialLighting,
    LightMove(LightSlot),
    LightColor(LightSlot),
}

/// What the host should do after a menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Continue,
    Exit,
}

/// Applies gesture deltas to the store and camera.
struct EditTargets<'a> {
    store: &'a mut SceneStore,
    camera: &'a mut CameraController,
}

impl ParamSink for EditTargets<'_> {
    fn adjust(&mut self, param: Param, amount: f32, floor: Option<f32>) {
        match param {
            Param::Camera(field) => self.camera.adjust(field, amount, floor),
            Param::Object(handle, field) => {
                if let Some(object) = self.store.get_mut(handle) {
                    object.adjust(field, amount, floor);
                }
            }
        }
    }
}

fn camera_bindings() -> (Binding, Binding) {
    let cam = |field| Channel::free(Param::Camera(field));
    (
        Binding::new(
            row_major(400.0, 0.0, 0.0, -10.0),
            cam(CameraField::RotSideways),
            cam(CameraField::ViewDist),
        ),
        Binding::new(
            row_major(400.0, 0.0, 0.0, -90.0),
            cam(CameraField::RotSideways),
            cam(CameraField::RotUpOver),
        ),
    )
}

/// Bindings for `mode` acting on `target`.
fn object_bindings(mode: EditMode, target: ObjectHandle, ground_drag: Mat2) -> (Binding, Binding) {
    let free = |field| Channel::free(Param::Object(target, field));
    let floored = |field| Channel::non_negative(Param::Object(target, field));
    match mode {
        EditMode::CameraOrbit => camera_bindings(),
        EditMode::PositionScale => (
            Binding::new(ground_drag, free(ObjectField::LocX), free(ObjectField::LocZ)),
            Binding::new(
                row_major(0.05, 0.0, 0.0, 10.0),
                free(ObjectField::Scale),
                free(ObjectField::LocY),
            ),
        ),
        EditMode::RotateAndTexScale => (
            Binding::new(
                row_major(400.0, 0.0, 0.0, 400.0),
                free(ObjectField::AngleY),
                free(ObjectField::AngleX),
            ),
            Binding::new(
                row_major(-400.0, 0.0, 0.0, 15.0),
                free(ObjectField::AngleZ),
                free(ObjectField::TexScale),
            ),
        ),
        EditMode::MaterialColor | EditMode::LightColor(_) => (
            Binding::new(
                Mat2::IDENTITY,
                floored(ObjectField::Red),
                floored(ObjectField::Green),
            ),
            Binding::new(
                Mat2::IDENTITY,
                floored(ObjectField::Blue),
                floored(ObjectField::Brightness),
            ),
        ),
        EditMode::MaterialLighting => (
            Binding::new(
                Mat2::IDENTITY,
                floored(ObjectField::Ambient),
                floored(ObjectField::Diffuse),
            ),
            Binding::new(
                row_major(1.0, 0.0, 0.0, 10.0),
                floored(ObjectField::Specular),
                floored(ObjectField::Shine),
            ),
        ),
        EditMode::LightMove(_) => (
            Binding::new(ground_drag, free(ObjectField::LocX), free(ObjectField::LocZ)),
            Binding::new(
                row_major(1.0, 0.0, 0.0, 10.0),
                floored(ObjectField::Brightness),
                free(ObjectField::LocY),
            ),
        ),
    }
}

pub struct Editor {
    store: SceneStore,
    camera: CameraController,
    gestures: GestureBindings,
    mode: EditMode,
    rng: StdRng,
    slots: SlotStore,
    limits: DecodeLimits,
    menus: MenuRanges,
}

impl Editor {
    /// Fresh scene with the ground and both lights, in camera mode.
    pub fn new(config: &EditorConfig, mut rng: StdRng) -> Self {
        let ground_tex = rng.random_range(1..config.texture_count);
        let mut editor = Self {
            store: SceneStore::new(config.max_objects, ground_tex),
            camera: CameraController::default(),
            gestures: GestureBindings::new(config.window_width, config.window_height),
            mode: EditMode::CameraOrbit,
            rng,
            slots: SlotStore::new(config.save_dir.clone(), config.slot_count),
            limits: DecodeLimits {
                max_objects: config.max_objects,
                mesh_count: config.mesh_count,
                texture_count: config.texture_count,
            },
            menus: MenuRanges {
                mesh_count: config.mesh_count,
                texture_count: config.texture_count,
                slot_count: config.slot_count,
            },
        };
        editor.install_camera();
        editor
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn menu_ranges(&self) -> &MenuRanges {
        &self.menus
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    fn install_camera(&mut self) {
        let (primary, secondary) = camera_bindings();
        self.gestures.install(primary, secondary);
        self.store.pin_tool(None);
        self.mode = EditMode::CameraOrbit;
    }

    fn install(&mut self, mode: EditMode, target: ObjectHandle) {
        let (primary, secondary) =
            object_bindings(mode, target, self.camera.ground_drag_transform());
        self.gestures.install(primary, secondary);
        self.mode = mode;
    }

    /// Switches edit mode. Returns `false` when an object mode is requested
    /// without a current object.
    pub fn set_mode(&mut self, mode: EditMode) -> bool {
        self.gestures.deactivate();
        match mode {
            EditMode::CameraOrbit => {
                self.install_camera();
            }
            EditMode::LightMove(slot) | EditMode::LightColor(slot) => {
                let handle = slot.handle();
                self.store.pin_tool(Some(handle));
                self.install(mode, handle);
            }
            _ => {
                let Some(current) = self.store.current() else {
                    log::debug!("{mode:?} needs a current object");
                    return false;
                };
                self.store.pin_tool(Some(current));
                self.install(mode, current);
            }
        }
        log::debug!("Mode {:?}", self.mode);
        true
    }

    fn select_for_placement(&mut self, handle: ObjectHandle) {
        self.store.select(handle);
        self.install(EditMode::PositionScale, handle);
    }

    /// Places a new object under the pointer with a random texture.
    pub fn add_object(&mut self, mesh_id: u32) -> Option<ObjectHandle> {
        let ground = self.camera.screen_to_ground(self.gestures.pointer_normalized());
        let tex_id = self.rng.random_range(1..self.limits.texture_count);
        let handle = self
            .store
            .push(SceneObject::new(mesh_id, tex_id, ground.x, ground.y))?;
        log::debug!("Added mesh {mesh_id} as object {}", handle.index());
        self.select_for_placement(handle);
        Some(handle)
    }

    pub fn duplicate_current(&mut self) -> Option<ObjectHandle> {
        let Some(current) = self.store.current() else {
            log::debug!("Nothing to duplicate");
            return None;
        };
        let handle = self.store.duplicate(current)?;
        self.select_for_placement(handle);
        Some(handle)
    }

    /// Removes the highest-index object and returns to camera mode. The three
    /// reserved objects are never removed.
    pub fn delete_last(&mut self) -> Option<SceneObject> {
        let Some(removed) = self.store.remove_last() else {
            log::debug!("Only reserved objects left, nothing to delete");
            return None;
        };
        self.store.clear_selection();
        self.install_camera();
        Some(removed)
    }

    pub fn set_current_texture(&mut self, tex_id: u32) -> bool {
        self.gestures.deactivate();
        let Some(object) = self.store.current().and_then(|h| self.store.get_mut(h)) else {
            return false;
        };
        object.tex_id = tex_id;
        true
    }

    pub fn set_ground_texture(&mut self, tex_id: u32) {
        self.gestures.deactivate();
        if let Some(ground) = self.store.get_mut(ObjectHandle::GROUND) {
            ground.tex_id = tex_id;
        }
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            camera: self.camera,
            objects: self.store.to_vec(),
        }
    }

    pub fn save_slot(&mut self, slot: u32) -> Result<PathBuf, PersistenceError> {
        let path = self.slots.save(slot, &self.snapshot())?;
        log::info!(
            "Saved {} objects to {}",
            self.store.len(),
            path.display()
        );
        Ok(path)
    }

    /// Restores a slot. Nothing changes unless the whole file decodes and
    /// passes validation.
    pub fn load_slot(&mut self, slot: u32) -> Result<(), PersistenceError> {
        let snapshot = self.slots.load(slot, self.limits)?;
        let count = snapshot.objects.len();
        let camera = snapshot.camera;
        if !self.store.replace_all(snapshot.objects) {
            return Err(PersistenceError::ObjectCount {
                count: count as i32,
                min: crate::scene::RESERVED_COUNT,
                max: self.store.capacity(),
            });
        }
        self.camera = camera;
        self.store.set_current(self.store.last_handle());
        self.install_camera();
        log::info!("Loaded {count} objects from slot {slot}");
        Ok(())
    }

    /// Applies a decoded menu selection.
    pub fn apply(&mut self, command: MenuCommand) -> MenuOutcome {
        self.gestures.deactivate();
        match command {
            MenuCommand::AddObject(mesh_id) => {
                self.add_object(mesh_id);
            }
            MenuCommand::SetTexture(tex_id) => {
                self.set_current_texture(tex_id);
            }
            MenuCommand::SetGroundTexture(tex_id) => self.set_ground_texture(tex_id),
            MenuCommand::Mode(mode) => {
                self.set_mode(mode);
            }
            MenuCommand::Duplicate => {
                self.duplicate_current();
            }
            MenuCommand::Delete => {
                self.delete_last();
            }
            MenuCommand::Save(slot) => {
                if let Err(err) = self.save_slot(slot) {
                    log::warn!("Save to slot {slot} failed: {err}");
                }
            }
            MenuCommand::Load(slot) => {
                if let Err(err) = self.load_slot(slot) {
                    log::warn!("Load from slot {slot} failed: {err}");
                }
            }
            MenuCommand::Exit => return MenuOutcome::Exit,
        }
        MenuOutcome::Continue
    }

    /// Decodes and applies a raw menu id.
    pub fn handle_menu(&mut self, kind: MenuKind, id: u32) -> Result<MenuOutcome, EditorError> {
        let command = MenuCommand::decode(kind, id, &self.menus)?;
        Ok(self.apply(command))
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) -> Option<Vec2> {
        let mut targets = EditTargets {
            store: &mut self.store,
            camera: &mut self.camera,
        };
        self.gestures.on_pointer_move(x, y, &mut targets)
    }

    pub fn button_pressed(&mut self, button: DragButton) {
        self.gestures.activate(button);
    }

    pub fn button_released(&mut self) {
        self.gestures.deactivate();
    }

    /// Positive `lines` scroll towards the scene.
    pub fn scroll(&mut self, lines: f32) {
        if lines > 0.0 {
            self.camera.zoom_in();
        } else if lines < 0.0 {
            self.camera.zoom_out();
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gestures.resize(width, height);
    }
}
