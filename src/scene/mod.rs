pub mod serialization;

use glam::{Mat4, Vec3, Vec4};

/// Mesh used for the ground plane.
pub const GROUND_MESH_ID: u32 = 0;
/// Sphere mesh used to visualize the two lights.
pub const LIGHT_MESH_ID: u32 = 55;
/// Ground plus two lights.
pub const RESERVED_COUNT: usize = 3;

/// Stable index of an object in the store.
///
/// Objects are only ever removed from the high end, so a handle stays valid
/// until the store shrinks below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub usize);

impl ObjectHandle {
    pub const GROUND: ObjectHandle = ObjectHandle(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSlot {
    First,
    Second,
}

impl LightSlot {
    pub fn handle(self) -> ObjectHandle {
        match self {
            LightSlot::First => ObjectHandle(1),
            LightSlot::Second => ObjectHandle(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    Ground,
    Light(LightSlot),
    Generic,
}

impl ObjectRole {
    /// Role implied by a position in the store.
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => ObjectRole::Ground,
            1 => ObjectRole::Light(LightSlot::First),
            2 => ObjectRole::Light(LightSlot::Second),
            _ => ObjectRole::Generic,
        }
    }

    pub fn is_reserved(self) -> bool {
        !matches!(self, ObjectRole::Generic)
    }
}

/// A placed mesh instance with its own transform, material and resource ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub loc: Vec4,
    pub scale: f32,
    /// Rotations around X, Y and Z in degrees.
    pub angles: [f32; 3],
    pub diffuse: f32,
    pub specular: f32,
    pub ambient: f32,
    pub shine: f32,
    pub rgb: Vec3,
    /// Multiplies all colours.
    pub brightness: f32,
    pub mesh_id: u32,
    pub tex_id: u32,
    pub tex_scale: f32,
}

impl SceneObject {
    /// Default material and orientation for a freshly added mesh at `(x, 0, z)`.
    pub fn new(mesh_id: u32, tex_id: u32, x: f32, z: f32) -> Self {
        let scale = if mesh_id == GROUND_MESH_ID || mesh_id == LIGHT_MESH_ID {
            1.0
        } else {
            0.005
        };
        Self {
            loc: Vec4::new(x, 0.0, z, 1.0),
            scale,
            angles: [0.0, 180.0, 0.0],
            diffuse: 1.0,
            specular: 0.5,
            ambient: 0.7,
            shine: 10.0,
            rgb: Vec3::splat(0.7),
            brightness: 1.0,
            mesh_id,
            tex_id,
            tex_scale: 2.0,
        }
    }

    pub fn ground(tex_id: u32) -> Self {
        Self {
            loc: Vec4::new(0.0, 0.0, 0.0, 1.0),
            scale: 10.0,
            angles: [90.0, 180.0, 0.0],
            tex_scale: 5.0,
            ..Self::new(GROUND_MESH_ID, tex_id, 0.0, 0.0)
        }
    }

    pub fn light(slot: LightSlot) -> Self {
        let (loc, brightness) = match slot {
            LightSlot::First => (Vec4::new(2.0, 1.0, 1.0, 1.0), 0.2),
            LightSlot::Second => (Vec4::new(-2.0, 1.0, -1.0, 1.0), 0.5),
        };
        Self {
            loc,
            scale: 0.1,
            brightness,
            ..Self::new(LIGHT_MESH_ID, 0, 0.0, 0.0)
        }
    }

    /// Adds `amount` to a field, clamping the result to `floor` when given.
    pub fn adjust(&mut self, field: ObjectField, amount: f32, floor: Option<f32>) {
        let slot = match field {
            ObjectField::LocX => &mut self.loc.x,
            ObjectField::LocY => &mut self.loc.y,
            ObjectField::LocZ => &mut self.loc.z,
            ObjectField::Scale => &mut self.scale,
            ObjectField::AngleX => &mut self.angles[0],
            ObjectField::AngleY => &mut self.angles[1],
            ObjectField::AngleZ => &mut self.angles[2],
            ObjectField::Red => &mut self.rgb.x,
            ObjectField::Green => &mut self.rgb.y,
            ObjectField::Blue => &mut self.rgb.z,
            ObjectField::Brightness => &mut self.brightness,
            ObjectField::Ambient => &mut self.ambient,
            ObjectField::Diffuse => &mut self.diffuse,
            ObjectField::Specular => &mut self.specular,
            ObjectField::Shine => &mut self.shine,
            ObjectField::TexScale => &mut self.tex_scale,
        };
        let value = *slot + amount;
        *slot = match floor {
            Some(min) => value.max(min),
            None => value,
        };
    }

    pub fn model_matrix(&self) -> Mat4 {
        compose_transform_matrix(self.loc.truncate(), self.angles, self.scale)
    }
}

/// Numeric fields of a [`SceneObject`] that gestures can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectField {
    LocX,
    LocY,
    LocZ,
    Scale,
    AngleX,
    AngleY,
    AngleZ,
    Red,
    Green,
    Blue,
    Brightness,
    Ambient,
    Diffuse,
    Specular,
    Shine,
    TexScale,
}

#[derive(Debug, Clone)]
struct SceneEntry {
    role: ObjectRole,
    object: SceneObject,
}

/// Ordered, bounded object list with the current/tool selection.
#[derive(Debug, Clone)]
pub struct SceneStore {
    entries: Vec<SceneEntry>,
    capacity: usize,
    current: Option<ObjectHandle>,
    tool: Option<ObjectHandle>,
}

impl SceneStore {
    /// Store seeded with the ground plane and both lights.
    pub fn new(capacity: usize, ground_tex_id: u32) -> Self {
        let capacity = capacity.max(RESERVED_COUNT);
        let mut entries = Vec::with_capacity(capacity.min(64));
        entries.push(SceneEntry {
            role: ObjectRole::Ground,
            object: SceneObject::ground(ground_tex_id),
        });
        for slot in [LightSlot::First, LightSlot::Second] {
            entries.push(SceneEntry {
                role: ObjectRole::Light(slot),
                object: SceneObject::light(slot),
            });
        }
        Self {
            entries,
            capacity,
            current: None,
            tool: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.entries.get(handle.0).map(|entry| &entry.object)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.entries.get_mut(handle.0).map(|entry| &mut entry.object)
    }

    #[cfg(test)]
    pub fn role(&self, handle: ObjectHandle) -> Option<ObjectRole> {
        self.entries.get(handle.0).map(|entry| entry.role)
    }

    pub fn light(&self, slot: LightSlot) -> &SceneObject {
        &self.entries[slot.handle().0].object
    }

    pub fn objects(&self) -> impl ExactSizeIterator<Item = &SceneObject> + '_ {
        self.entries.iter().map(|entry| &entry.object)
    }

    pub fn to_vec(&self) -> Vec<SceneObject> {
        self.objects().copied().collect()
    }

    /// Appends a generic object; `None` when the store is full.
    pub fn push(&mut self, object: SceneObject) -> Option<ObjectHandle> {
        if self.is_full() {
            log::debug!("Store full ({} objects), ignoring add", self.capacity);
            return None;
        }
        let handle = ObjectHandle(self.entries.len());
        self.entries.push(SceneEntry {
            role: ObjectRole::Generic,
            object,
        });
        Some(handle)
    }

    /// Appends a copy of `source`. The copy is always a generic object.
    pub fn duplicate(&mut self, source: ObjectHandle) -> Option<ObjectHandle> {
        let object = *self.get(source)?;
        self.push(object)
    }

    /// Removes the highest-index object unless it is reserved.
    pub fn remove_last(&mut self) -> Option<SceneObject> {
        let last = self.entries.last()?;
        if last.role.is_reserved() {
            return None;
        }
        let removed = self.entries.pop().map(|entry| entry.object);
        let len = self.entries.len();
        if self.current.is_some_and(|handle| handle.0 >= len) {
            self.current = None;
        }
        if self.tool.is_some_and(|handle| handle.0 >= len) {
            self.tool = None;
        }
        removed
    }

    /// Replaces every object, assigning roles by position.
    ///
    /// The caller validates the count; this only refuses lists that would
    /// break the reserved prefix or the capacity, leaving the store untouched.
    pub fn replace_all(&mut self, objects: Vec<SceneObject>) -> bool {
        if objects.len() < RESERVED_COUNT || objects.len() > self.capacity {
            return false;
        }
        self.entries = objects
            .into_iter()
            .enumerate()
            .map(|(index, object)| SceneEntry {
                role: ObjectRole::for_index(index),
                object,
            })
            .collect();
        self.current = None;
        self.tool = None;
        true
    }

    pub fn last_handle(&self) -> Option<ObjectHandle> {
        self.entries.len().checked_sub(1).map(ObjectHandle)
    }

    pub fn current(&self) -> Option<ObjectHandle> {
        self.current
    }

    pub fn tool(&self) -> Option<ObjectHandle> {
        self.tool
    }

    /// Makes `handle` both the current and the tool object.
    pub fn select(&mut self, handle: ObjectHandle) {
        if handle.0 < self.entries.len() {
            self.current = Some(handle);
            self.tool = Some(handle);
        }
    }

    pub fn set_current(&mut self, handle: Option<ObjectHandle>) {
        self.current = handle.filter(|handle| handle.0 < self.entries.len());
    }

    /// Points gesture edits at `handle` without touching the current object.
    pub fn pin_tool(&mut self, handle: Option<ObjectHandle>) {
        self.tool = handle.filter(|handle| handle.0 < self.entries.len());
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
        self.tool = None;
    }
}

/// Model matrix: translate, then rotate X·Y·Z (degrees), then uniform scale.
pub fn compose_transform_matrix(position: Vec3, rotation_deg: [f32; 3], scale: f32) -> Mat4 {
    let rotation = Mat4::from_rotation_x(rotation_deg[0].to_radians())
        * Mat4::from_rotation_y(rotation_deg[1].to_radians())
        * Mat4::from_rotation_z(rotation_deg[2].to_radians());
    Mat4::from_translation(position) * rotation * Mat4::from_scale(Vec3::splat(scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_holds_reserved_objects() {
        let store = SceneStore::new(16, 1);
        assert_eq!(store.len(), RESERVED_COUNT);
        assert_eq!(store.role(ObjectHandle(0)), Some(ObjectRole::Ground));
        assert_eq!(
            store.role(ObjectHandle(1)),
            Some(ObjectRole::Light(LightSlot::First))
        );
        assert_eq!(
            store.role(ObjectHandle(2)),
            Some(ObjectRole::Light(LightSlot::Second))
        );
        assert_eq!(store.light(LightSlot::First).mesh_id, LIGHT_MESH_ID);
        assert_eq!(store.light(LightSlot::Second).brightness, 0.5);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn push_stops_at_capacity() {
        let mut store = SceneStore::new(4, 1);
        assert_eq!(
            store.push(SceneObject::new(12, 3, 0.0, 0.0)),
            Some(ObjectHandle(3))
        );
        assert_eq!(store.push(SceneObject::new(13, 3, 0.0, 0.0)), None);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn remove_last_never_touches_reserved() {
        let mut store = SceneStore::new(8, 1);
        assert!(store.remove_last().is_none());
        assert_eq!(store.len(), RESERVED_COUNT);

        store.push(SceneObject::new(12, 3, 0.0, 0.0));
        store.push(SceneObject::new(20, 4, 0.0, 0.0));
        store.select(ObjectHandle(4));
        let removed = store.remove_last().unwrap();
        assert_eq!(removed.mesh_id, 20);
        assert_eq!(store.len(), 4);
        assert_eq!(store.current(), None);
        assert_eq!(store.tool(), None);
    }

    #[test]
    fn duplicate_is_generic_copy() {
        let mut store = SceneStore::new(8, 1);
        let copy = store.duplicate(LightSlot::First.handle()).unwrap();
        assert_eq!(store.role(copy), Some(ObjectRole::Generic));
        assert_eq!(store.get(copy), Some(store.light(LightSlot::First)));
        assert!(store.remove_last().is_some());
    }

    #[test]
    fn replace_all_rejects_missing_reserved_prefix() {
        let mut store = SceneStore::new(8, 1);
        let before = store.to_vec();
        assert!(!store.replace_all(vec![SceneObject::ground(1)]));
        assert_eq!(store.to_vec(), before);
    }

    #[test]
    fn adjust_clamps_to_floor() {
        let mut object = SceneObject::new(12, 3, 0.0, 0.0);
        object.adjust(ObjectField::Brightness, -5.0, Some(0.0));
        assert_eq!(object.brightness, 0.0);
        object.adjust(ObjectField::LocY, -5.0, None);
        assert_eq!(object.loc.y, -5.0);
    }

    #[test]
    fn pin_tool_leaves_current_alone() {
        let mut store = SceneStore::new(8, 1);
        let handle = store.push(SceneObject::new(12, 3, 0.0, 0.0)).unwrap();
        store.select(handle);
        store.pin_tool(Some(LightSlot::Second.handle()));
        assert_eq!(store.current(), Some(handle));
        assert_eq!(store.tool(), Some(ObjectHandle(2)));
    }

    #[test]
    fn model_matrix_places_origin_at_location() {
        let mut object = SceneObject::new(12, 3, 1.5, -2.0);
        object.loc.y = 0.25;
        let origin = object.model_matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.5, 0.25, -2.0)).length() < 1e-5);
    }
}
