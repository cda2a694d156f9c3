use crate::editor::gesture::DragButton;
use crate::editor::menu::MenuKind;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard stand-ins for the menus. Digits build up a number that the next
/// asset or slot key consumes.
pub const SHORTCUT_HELP: &[&str] = &[
    "C camera   P position/scale   R rotation/texture scale",
    "M colour   L ambient/diffuse/specular/shine",
    "F1/F2 move/colour light 1   F3/F4 move/colour light 2",
    "D duplicate   Delete delete   Esc exit",
    "<n>A add mesh n   <n>T texture n   <n>G ground texture n",
    "<n>S save slot n   <n>O load slot n",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    /// A fixed menu entry.
    Menu(MenuKind, u32),
    /// A typed number for an asset or slot menu; may be out of range.
    Numbered(MenuKind, u32),
    /// An asset or slot key was pressed with no number typed first.
    MissingNumber(MenuKind),
}

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pending_number: Option<u32>,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        if !pressed {
            return InputAction::None;
        }
        let PhysicalKey::Code(code) = key else {
            return InputAction::None;
        };
        if let Some(digit) = digit_value(code) {
            let number = self.pending_number.unwrap_or(0);
            self.pending_number = Some(number.saturating_mul(10).saturating_add(digit));
            return InputAction::None;
        }

        let fixed = match code {
            KeyCode::KeyC => Some((MenuKind::Main, 50)),
            KeyCode::KeyP => Some((MenuKind::Main, 41)),
            KeyCode::KeyR => Some((MenuKind::Main, 55)),
            KeyCode::KeyD => Some((MenuKind::Main, 90)),
            KeyCode::Delete | KeyCode::Backspace => Some((MenuKind::Main, 91)),
            KeyCode::Escape => Some((MenuKind::Main, 99)),
            KeyCode::KeyM => Some((MenuKind::Material, 10)),
            KeyCode::KeyL => Some((MenuKind::Material, 20)),
            KeyCode::F1 => Some((MenuKind::Light, 70)),
            KeyCode::F2 => Some((MenuKind::Light, 71)),
            KeyCode::F3 => Some((MenuKind::Light, 80)),
            KeyCode::F4 => Some((MenuKind::Light, 81)),
            _ => None,
        };
        if let Some((kind, id)) = fixed {
            self.pending_number = None;
            return InputAction::Menu(kind, id);
        }

        let numbered = match code {
            KeyCode::KeyA => MenuKind::Object,
            KeyCode::KeyT => MenuKind::Texture,
            KeyCode::KeyG => MenuKind::GroundTexture,
            KeyCode::KeyS => MenuKind::Save,
            KeyCode::KeyO => MenuKind::Load,
            _ => return InputAction::None,
        };
        match self.pending_number.take() {
            Some(number) => InputAction::Numbered(numbered, number),
            None => InputAction::MissingNumber(numbered),
        }
    }
}

fn digit_value(code: KeyCode) -> Option<u32> {
    let digit = match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => 0,
        KeyCode::Digit1 | KeyCode::Numpad1 => 1,
        KeyCode::Digit2 | KeyCode::Numpad2 => 2,
        KeyCode::Digit3 | KeyCode::Numpad3 => 3,
        KeyCode::Digit4 | KeyCode::Numpad4 => 4,
        KeyCode::Digit5 | KeyCode::Numpad5 => 5,
        KeyCode::Digit6 | KeyCode::Numpad6 => 6,
        KeyCode::Digit7 | KeyCode::Numpad7 => 7,
        KeyCode::Digit8 | KeyCode::Numpad8 => 8,
        KeyCode::Digit9 | KeyCode::Numpad9 => 9,
        _ => return None,
    };
    Some(digit)
}

/// Left drags the primary binding; middle, or shift with left, the
/// secondary one.
pub fn drag_button(button: MouseButton, shift: bool) -> Option<DragButton> {
    match button {
        MouseButton::Left if shift => Some(DragButton::Secondary),
        MouseButton::Left => Some(DragButton::Primary),
        MouseButton::Middle => Some(DragButton::Secondary),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputState, code: KeyCode) -> InputAction {
        input.handle_key(PhysicalKey::Code(code), true)
    }

    #[test]
    fn digits_feed_numbered_menus() {
        let mut input = InputState::default();
        assert_eq!(press(&mut input, KeyCode::Digit1), InputAction::None);
        assert_eq!(press(&mut input, KeyCode::Numpad2), InputAction::None);
        assert_eq!(input.pending_number, Some(12));
        assert_eq!(
            press(&mut input, KeyCode::KeyA),
            InputAction::Numbered(MenuKind::Object, 12)
        );
        assert_eq!(input.pending_number, None);
        assert_eq!(
            press(&mut input, KeyCode::KeyS),
            InputAction::MissingNumber(MenuKind::Save)
        );
    }

    #[test]
    fn fixed_keys_clear_pending_number() {
        let mut input = InputState::default();
        press(&mut input, KeyCode::Digit7);
        assert_eq!(
            press(&mut input, KeyCode::F3),
            InputAction::Menu(MenuKind::Light, 80)
        );
        assert_eq!(
            press(&mut input, KeyCode::KeyG),
            InputAction::MissingNumber(MenuKind::GroundTexture)
        );
    }

    #[test]
    fn releases_are_ignored() {
        let mut input = InputState::default();
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::KeyC), false),
            InputAction::None
        );
    }

    #[test]
    fn shift_left_is_secondary() {
        assert_eq!(
            drag_button(MouseButton::Left, false),
            Some(DragButton::Primary)
        );
        assert_eq!(
            drag_button(MouseButton::Left, true),
            Some(DragButton::Secondary)
        );
        assert_eq!(
            drag_button(MouseButton::Middle, false),
            Some(DragButton::Secondary)
        );
        assert_eq!(drag_button(MouseButton::Right, false), None);
    }
}
