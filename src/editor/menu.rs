//! Numeric menu ids and the commands they stand for.

use super::{EditMode, EditorError};
use crate::scene::LightSlot;

/// The menus a selection can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Main,
    Material,
    Light,
    Object,
    Texture,
    GroundTexture,
    Save,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    AddObject(u32),
    SetTexture(u32),
    SetGroundTexture(u32),
    Mode(EditMode),
    Duplicate,
    Delete,
    Save(u32),
    Load(u32),
    Exit,
}

/// Upper bounds for the id-carrying menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuRanges {
    pub mesh_count: u32,
    pub texture_count: u32,
    pub slot_count: u32,
}

impl MenuCommand {
    pub fn decode(kind: MenuKind, id: u32, ranges: &MenuRanges) -> Result<Self, EditorError> {
        let unknown = || EditorError::UnknownMenuId { kind, id };
        let command = match kind {
            MenuKind::Main => match id {
                41 => MenuCommand::Mode(EditMode::PositionScale),
                50 => MenuCommand::Mode(EditMode::CameraOrbit),
                55 => MenuCommand::Mode(EditMode::RotateAndTexScale),
                90 => MenuCommand::Duplicate,
                91 => MenuCommand::Delete,
                99 => MenuCommand::Exit,
                _ => return Err(unknown()),
            },
            MenuKind::Material => match id {
                10 => MenuCommand::Mode(EditMode::MaterialColor),
                20 => MenuCommand::Mode(EditMode::MaterialLighting),
                _ => return Err(unknown()),
            },
            MenuKind::Light => match id {
                70 => MenuCommand::Mode(EditMode::LightMove(LightSlot::First)),
                71 => MenuCommand::Mode(EditMode::LightColor(LightSlot::First)),
                80 => MenuCommand::Mode(EditMode::LightMove(LightSlot::Second)),
                81 => MenuCommand::Mode(EditMode::LightColor(LightSlot::Second)),
                _ => return Err(unknown()),
            },
            MenuKind::Object if (1..ranges.mesh_count).contains(&id) => {
                MenuCommand::AddObject(id)
            }
            MenuKind::Texture if (1..ranges.texture_count).contains(&id) => {
                MenuCommand::SetTexture(id)
            }
            MenuKind::GroundTexture if (1..ranges.texture_count).contains(&id) => {
                MenuCommand::SetGroundTexture(id)
            }
            MenuKind::Save if (1..=ranges.slot_count).contains(&id) => MenuCommand::Save(id),
            MenuKind::Load if (1..=ranges.slot_count).contains(&id) => MenuCommand::Load(id),
            _ => return Err(unknown()),
        };
        Ok(command)
    }

    /// Menu and id that produce this command.
    pub fn menu_id(&self) -> (MenuKind, u32) {
        match *self {
            MenuCommand::AddObject(id) => (MenuKind::Object, id),
            MenuCommand::SetTexture(id) => (MenuKind::Texture, id),
            MenuCommand::SetGroundTexture(id) => (MenuKind::GroundTexture, id),
            MenuCommand::Save(slot) => (MenuKind::Save, slot),
            MenuCommand::Load(slot) => (MenuKind::Load, slot),
            MenuCommand::Duplicate => (MenuKind::Main, 90),
            MenuCommand::Delete => (MenuKind::Main, 91),
            MenuCommand::Exit => (MenuKind::Main, 99),
            MenuCommand::Mode(mode) => match mode {
                EditMode::PositionScale => (MenuKind::Main, 41),
                EditMode::CameraOrbit => (MenuKind::Main, 50),
                EditMode::RotateAndTexScale => (MenuKind::Main, 55),
                EditMode::MaterialColor => (MenuKind::Material, 10),
                EditMode::MaterialLighting => (MenuKind::Material, 20),
                EditMode::LightMove(LightSlot::First) => (MenuKind::Light, 70),
                EditMode::LightColor(LightSlot::First) => (MenuKind::Light, 71),
                EditMode::LightMove(LightSlot::Second) => (MenuKind::Light, 80),
                EditMode::LightColor(LightSlot::Second) => (MenuKind::Light, 81),
            },
        }
    }
}

const MESH_LABELS: [&str; 58] = [
    "Thin Dinosaur",
    "Big Dog",
    "Saddle Dinosaur",
    "Dragon",
    "Cleopatra",
    "Bone I",
    "Bone II",
    "Rabbit",
    "Long Dragon",
    "Buddha",
    "Sitting Rabbit",
    "Frog",
    "Cow",
    "Monster",
    "Sea Horse",
    "Head",
    "Pelican",
    "Horse",
    "Kneeling Angel",
    "Porsche I",
    "Truck",
    "Statue of Liberty",
    "Sitting Angel",
    "Metal Part",
    "Car",
    "Apatosaurus",
    "Airliner",
    "Motorbike",
    "Dolphin",
    "Spaceman",
    "Winnie the Pooh",
    "Shark",
    "Crocodile",
    "Toddler",
    "Fat Dinosaur",
    "Chihuahua",
    "Sabre-toothed Tiger",
    "Lioness",
    "Fish",
    "Horse (head down)",
    "Horse (head up)",
    "Skull",
    "Fighter Jet I",
    "Toad",
    "Convertible",
    "Porsche II",
    "Hare",
    "Vintage Car",
    "Fighter Jet II",
    "Gargoyle",
    "Chef",
    "Parasaurolophus",
    "Rooster",
    "T-rex",
    "Sphere",
    "Gingerbread Man",
    "Monkey Head",
    "Thriller",
];

const TEXTURE_LABELS: [&str; 30] = [
    "Plain",
    "Rust",
    "Concrete",
    "Carpet",
    "Beach Sand",
    "Rocky",
    "Brick",
    "Water",
    "Paper",
    "Marble",
    "Wood",
    "Scales",
    "Fur",
    "Denim",
    "Hessian",
    "Orange Peel",
    "Ice Crystals",
    "Grass",
    "Corrugated Iron",
    "Styrofoam",
    "Bubble Wrap",
    "Leather",
    "Camouflage",
    "Asphalt",
    "Scratched Ice",
    "Rattan",
    "Snow",
    "Dry Mud",
    "Old Concrete",
    "Leopard Skin",
];

/// Display name for an object menu entry. Meshes past the stock set have none.
pub fn mesh_label(id: u32) -> Option<&'static str> {
    let index = (id as usize).checked_sub(1)?;
    MESH_LABELS.get(index).copied()
}

pub fn texture_label(id: u32) -> Option<&'static str> {
    let index = (id as usize).checked_sub(1)?;
    TEXTURE_LABELS.get(index).copied()
}

/// Label of the menu entry that selects `mode`.
pub fn mode_label(mode: EditMode, ranges: &MenuRanges) -> String {
    let (kind, id) = MenuCommand::Mode(mode).menu_id();
    entries(kind, ranges)
        .into_iter()
        .find(|(entry, _)| *entry == id)
        .map(|(_, label)| label)
        .unwrap_or_else(|| format!("{mode:?}"))
}

/// `(id, label)` pairs for a menu, in display order.
pub fn entries(kind: MenuKind, ranges: &MenuRanges) -> Vec<(u32, String)> {
    let labelled = |id: u32, label: Option<&str>| match label {
        Some(label) => (id, format!("{id} {label}")),
        None => (id, id.to_string()),
    };
    match kind {
        MenuKind::Object => (1..ranges.mesh_count)
            .map(|id| labelled(id, mesh_label(id)))
            .collect(),
        MenuKind::Texture | MenuKind::GroundTexture => (1..ranges.texture_count)
            .map(|id| labelled(id, texture_label(id)))
            .collect(),
        MenuKind::Save | MenuKind::Load => (1..=ranges.slot_count)
            .map(|slot| (slot, format!("Slot {slot}")))
            .collect(),
        MenuKind::Main => vec![
            (41, "Position/Scale".to_string()),
            (55, "Rotation/Texture Scale".to_string()),
            (90, "Duplicate".to_string()),
            (91, "Delete".to_string()),
            (50, "Camera".to_string()),
            (99, "Exit".to_string()),
        ],
        MenuKind::Material => vec![
            (10, "R/G/B/All".to_string()),
            (20, "Ambient/Diffuse/Specular/Shine".to_string()),
        ],
        MenuKind::Light => vec![
            (70, "Move Light 1".to_string()),
            (71, "R/G/B All Light 1".to_string()),
            (80, "Move Light 2".to_string()),
            (81, "R/G/B All Light 2".to_string()),
        ],
    }
}
