//! Slot files: a little-endian, fixed-width snapshot of the camera and every
//! scene object.
//!
//! ```text
//! [b"SAVE"][f32 view_dist][f32 rot_sideways][f32 rot_up_over][i32 count][count × record]
//! ```
//!
//! Each record is written field by field in [`RECORD_FIELDS`] order, so the
//! layout never depends on how `SceneObject` is laid out in memory.

use crate::render::camera::CameraController;
use crate::scene::{SceneObject, RESERVED_COUNT};
use glam::{Vec3, Vec4};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SAVE_MAGIC: [u8; 4] = *b"SAVE";
pub const HEADER_SIZE: usize = 4 + 3 * 4 + 4;

/// One 4-byte slot of an object record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordField {
    LocX,
    LocY,
    LocZ,
    LocW,
    Scale,
    AngleX,
    AngleY,
    AngleZ,
    Diffuse,
    Specular,
    Ambient,
    Shine,
    Red,
    Green,
    Blue,
    Brightness,
    MeshId,
    TexId,
    TexScale,
}

const RECORD_FIELDS: [RecordField; 19] = [
    RecordField::LocX,
    RecordField::LocY,
    RecordField::LocZ,
    RecordField::LocW,
    RecordField::Scale,
    RecordField::AngleX,
    RecordField::AngleY,
    RecordField::AngleZ,
    RecordField::Diffuse,
    RecordField::Specular,
    RecordField::Ambient,
    RecordField::Shine,
    RecordField::Red,
    RecordField::Green,
    RecordField::Blue,
    RecordField::Brightness,
    RecordField::MeshId,
    RecordField::TexId,
    RecordField::TexScale,
];

pub const RECORD_SIZE: usize = RECORD_FIELDS.len() * 4;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("could not access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid save file header {found:?}")]
    InvalidHeader { found: [u8; 4] },
    #[error("save file ends after {available} bytes, expected {expected}")]
    Truncated { expected: usize, available: usize },
    #[error("save file holds {count} objects, expected {min}..={max}")]
    ObjectCount { count: i32, min: usize, max: usize },
    #[error("object {index} references {kind} {id}, only {count} exist")]
    AssetOutOfRange {
        index: usize,
        kind: &'static str,
        id: i32,
        count: u32,
    },
    #[error("slot {slot} is outside 1..={max}")]
    InvalidSlot { slot: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Everything a slot holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub camera: CameraController,
    pub objects: Vec<SceneObject>,
}

/// Bounds a decoded snapshot must satisfy before it may replace live state.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    pub max_objects: usize,
    pub mesh_count: u32,
    pub texture_count: u32,
}

pub fn encode_snapshot(snapshot: &SceneSnapshot) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + snapshot.objects.len() * RECORD_SIZE);
    bytes.extend_from_slice(&SAVE_MAGIC);
    bytes.extend_from_slice(&snapshot.camera.view_dist.to_le_bytes());
    bytes.extend_from_slice(&snapshot.camera.rot_sideways_deg.to_le_bytes());
    bytes.extend_from_slice(&snapshot.camera.rot_up_over_deg.to_le_bytes());
    bytes.extend_from_slice(&(snapshot.objects.len() as i32).to_le_bytes());
    for object in &snapshot.objects {
        for field in RECORD_FIELDS {
            bytes.extend_from_slice(&encode_field(object, field));
        }
    }
    bytes
}

fn encode_field(object: &SceneObject, field: RecordField) -> [u8; 4] {
    let value = match field {
        RecordField::LocX => object.loc.x,
        RecordField::LocY => object.loc.y,
        RecordField::LocZ => object.loc.z,
        RecordField::LocW => object.loc.w,
        RecordField::Scale => object.scale,
        RecordField::AngleX => object.angles[0],
        RecordField::AngleY => object.angles[1],
        RecordField::AngleZ => object.angles[2],
        RecordField::Diffuse => object.diffuse,
        RecordField::Specular => object.specular,
        RecordField::Ambient => object.ambient,
        RecordField::Shine => object.shine,
        RecordField::Red => object.rgb.x,
        RecordField::Green => object.rgb.y,
        RecordField::Blue => object.rgb.z,
        RecordField::Brightness => object.brightness,
        RecordField::MeshId => return (object.mesh_id as i32).to_le_bytes(),
        RecordField::TexId => return (object.tex_id as i32).to_le_bytes(),
        RecordField::TexScale => object.tex_scale,
    };
    value.to_le_bytes()
}

/// Little-endian cursor over a byte slice that reports truncation.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn word(&mut self) -> Result<[u8; 4]> {
        let end = self.offset + 4;
        let word = self
            .bytes
            .get(self.offset..end)
            .ok_or(PersistenceError::Truncated {
                expected: end,
                available: self.bytes.len(),
            })?;
        self.offset = end;
        Ok([word[0], word[1], word[2], word[3]])
    }

    fn f32(&mut self) -> Result<f32> {
        self.word().map(f32::from_le_bytes)
    }

    fn i32(&mut self) -> Result<i32> {
        self.word().map(i32::from_le_bytes)
    }
}

/// Decodes and validates a whole snapshot. Nothing is returned unless every
/// record is present and in range.
pub fn decode_snapshot(bytes: &[u8], limits: DecodeLimits) -> Result<SceneSnapshot> {
    let mut reader = Reader::new(bytes);
    let header = reader.word()?;
    if header != SAVE_MAGIC {
        return Err(PersistenceError::InvalidHeader { found: header });
    }

    let camera = CameraController::new(reader.f32()?, reader.f32()?, reader.f32()?);
    let count = reader.i32()?;
    if count < RESERVED_COUNT as i32 || count as i64 > limits.max_objects as i64 {
        return Err(PersistenceError::ObjectCount {
            count,
            min: RESERVED_COUNT,
            max: limits.max_objects,
        });
    }
    let count = count as usize;
    let expected = HEADER_SIZE + count * RECORD_SIZE;
    if bytes.len() < expected {
        return Err(PersistenceError::Truncated {
            expected,
            available: bytes.len(),
        });
    }
    if bytes.len() > expected {
        log::debug!(
            "Ignoring {} trailing bytes after {} records",
            bytes.len() - expected,
            count
        );
    }

    let mut objects = Vec::with_capacity(count);
    for index in 0..count {
        objects.push(decode_record(&mut reader, index, limits)?);
    }
    Ok(SceneSnapshot { camera, objects })
}

fn decode_record(reader: &mut Reader<'_>, index: usize, limits: DecodeLimits) -> Result<SceneObject> {
    let mut object = SceneObject::new(0, 0, 0.0, 0.0);
    let mut loc = Vec4::ZERO;
    let mut rgb = Vec3::ZERO;
    for field in RECORD_FIELDS {
        let word = reader.word()?;
        let value = f32::from_le_bytes(word);
        match field {
            RecordField::MeshId => {
                object.mesh_id =
                    checked_id(i32::from_le_bytes(word), index, "mesh", limits.mesh_count)?
            }
            RecordField::TexId => {
                object.tex_id =
                    checked_id(i32::from_le_bytes(word), index, "texture", limits.texture_count)?
            }
            RecordField::LocX => loc.x = value,
            RecordField::LocY => loc.y = value,
            RecordField::LocZ => loc.z = value,
            RecordField::LocW => loc.w = value,
            RecordField::Scale => object.scale = value,
            RecordField::AngleX => object.angles[0] = value,
            RecordField::AngleY => object.angles[1] = value,
            RecordField::AngleZ => object.angles[2] = value,
            RecordField::Diffuse => object.diffuse = value,
            RecordField::Specular => object.specular = value,
            RecordField::Ambient => object.ambient = value,
            RecordField::Shine => object.shine = value,
            RecordField::Red => rgb.x = value,
            RecordField::Green => rgb.y = value,
            RecordField::Blue => rgb.z = value,
            RecordField::Brightness => object.brightness = value,
            RecordField::TexScale => object.tex_scale = value,
        }
    }
    object.loc = loc;
    object.rgb = rgb;
    Ok(object)
}

fn checked_id(id: i32, index: usize, kind: &'static str, count: u32) -> Result<u32> {
    if id < 0 || id as u32 >= count {
        return Err(PersistenceError::AssetOutOfRange {
            index,
            kind,
            id,
            count,
        });
    }
    Ok(id as u32)
}

/// Numbered save slots stored as `slot<N>.sav` in one directory.
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
    slot_count: u32,
}

impl SlotStore {
    pub fn new(dir: impl Into<PathBuf>, slot_count: u32) -> Self {
        Self {
            dir: dir.into(),
            slot_count,
        }
    }

    pub fn path(&self, slot: u32) -> Result<PathBuf> {
        if slot == 0 || slot > self.slot_count {
            return Err(PersistenceError::InvalidSlot {
                slot,
                max: self.slot_count,
            });
        }
        Ok(self.dir.join(format!("slot{slot}.sav")))
    }

    /// Writes the snapshot through a temporary file so a failed save never
    /// leaves a half-written slot behind.
    pub fn save(&self, slot: u32, snapshot: &SceneSnapshot) -> Result<PathBuf> {
        let path = self.path(slot)?;
        let bytes = encode_snapshot(snapshot);
        write_via_temp(&path, |file| file.write_all(&bytes))?;
        Ok(path)
    }

    pub fn load(&self, slot: u32, limits: DecodeLimits) -> Result<SceneSnapshot> {
        let path = self.path(slot)?;
        let bytes = read_file(&path)?;
        decode_snapshot(&bytes, limits)
    }
}

/// Writes `<path>.tmp` and renames it over `path`. The temporary file is
/// removed whenever any step fails.
fn write_via_temp(
    path: &Path,
    write: impl FnOnce(&mut std::fs::File) -> std::io::Result<()>,
) -> Result<()> {
    let tmp_path = path.with_extension("sav.tmp");
    let result = std::fs::File::create(&tmp_path)
        .and_then(|mut file| {
            write(&mut file)?;
            file.flush()
        })
        .map_err(|source| PersistenceError::Io {
            path: tmp_path.clone(),
            source,
        })
        .and_then(|()| {
            std::fs::rename(&tmp_path, path).map_err(|source| PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let io_err = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;
    Ok(bytes)
}
