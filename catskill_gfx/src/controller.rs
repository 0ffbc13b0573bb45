use intbits::Bits;
use strum::EnumCount;
use strum::IntoEnumIterator;

/// Logical buttons of the handheld.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumCount,
)]
pub enum Button {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    Select = 4,
    Start = 5,
    A = 6,
    B = 7,
    C = 8,
    None = 9,
}

impl Button {
    /// Maps a keyboard key code of the desktop frontend to a button.
    ///
    /// WASD and the arrow keys control the D-pad, Enter and Shift are A, Ctrl is B and Space
    /// is C. Any other key maps to `Button::None`.
    pub fn from_key_code(code: u8) -> Button {
        match code {
            97 | 81 => Button::Left,
            119 | 82 => Button::Up,
            100 | 83 => Button::Right,
            115 | 84 => Button::Down,
            131 | 13 | 233 => Button::A,
            227 | 228 => Button::B,
            32 => Button::C,
            _ => Button::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Debounce {
    enabled: bool,
    /// Number of released frames required before the button triggers again.
    start: u8,
    timer: u8,
}

impl Debounce {
    const fn new(enabled: bool, start: u8) -> Self {
        Self {
            enabled,
            start,
            timer: 0,
        }
    }
}

/// Button state with per-button debounce.
///
/// A debounced button reports a press once, and then has to be released for a number of frames
/// before it reports a press again. This is used for menus and single-shot actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Controller {
    pressed: u16,
    debounce: [Debounce; Button::COUNT],
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            pressed: 0,
            debounce: [
                Debounce::new(false, 0), // Up
                Debounce::new(false, 0), // Down
                Debounce::new(false, 0), // Left
                Debounce::new(false, 0), // Right
                Debounce::new(true, 5),  // Select
                Debounce::new(true, 5),  // Start
                Debounce::new(true, 1),  // A
                Debounce::new(true, 1),  // B
                Debounce::new(true, 1),  // C
                Debounce::new(false, 0), // None
            ],
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key press or release reported by the frontend.
    pub fn set_key(&mut self, key_code: u8, pressed: bool) {
        self.set_button(Button::from_key_code(key_code), pressed);
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if button == Button::None {
            return;
        }
        self.pressed.set_bit(button as u32, pressed);
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        button != Button::None && self.pressed.bit(button as u32)
    }

    /// Returns true if `button` is pressed, honoring debounce.
    ///
    /// A debounced button only reports a press when its timer has expired, and reporting the
    /// press restarts the timer.
    pub fn button(&mut self, button: Button) -> bool {
        if !self.is_pressed(button) {
            return false;
        }
        let debounce = &mut self.debounce[button as usize];
        if !debounce.enabled {
            return true;
        }
        if debounce.timer == 0 {
            debounce.timer = debounce.start;
            true
        } else {
            false
        }
    }

    /// Enables or disables debounce for `button`.
    ///
    /// `frames` is scaled by 4, with a minimum of one frame when debounce is enabled. The timer
    /// is restarted so that switching modes does not produce a false press.
    pub fn set_button_debounce(&mut self, button: Button, enabled: bool, frames: u8) {
        let start = if enabled && frames < 1 {
            1
        } else {
            frames.saturating_mul(4)
        };
        let debounce = &mut self.debounce[button as usize];
        *debounce = Debounce {
            enabled,
            start,
            timer: start,
        };
    }

    /// Advances debounce timers by one frame. Must be called every frame, including while the
    /// renderer is paused.
    pub fn service_debounce(&mut self) {
        for button in Button::iter().filter(|b| *b != Button::None) {
            let released = !self.is_pressed(button);
            let debounce = &mut self.debounce[button as usize];
            if debounce.enabled && debounce.timer > 0 && released {
                debounce.timer -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(Button::from_key_code(b'w'), Button::Up);
        assert_eq!(Button::from_key_code(b'a'), Button::Left);
        assert_eq!(Button::from_key_code(b's'), Button::Down);
        assert_eq!(Button::from_key_code(b'd'), Button::Right);
        assert_eq!(Button::from_key_code(82), Button::Up);
        assert_eq!(Button::from_key_code(13), Button::A);
        assert_eq!(Button::from_key_code(227), Button::B);
        assert_eq!(Button::from_key_code(32), Button::C);
        assert_eq!(Button::from_key_code(b'x'), Button::None);
    }

    #[test]
    fn test_dpad_without_debounce() {
        let mut controller = Controller::new();
        controller.set_button(Button::Left, true);
        assert!(controller.button(Button::Left));
        assert!(controller.button(Button::Left));
        assert!(!controller.button(Button::Right));
        controller.set_button(Button::Left, false);
        assert!(!controller.button(Button::Left));
    }

    #[test]
    fn test_multiple_buttons() {
        let mut controller = Controller::new();
        controller.set_key(b'w', true);
        controller.set_key(b'd', true);
        assert!(controller.button(Button::Up));
        assert!(controller.button(Button::Right));
        controller.set_key(b'w', false);
        assert!(!controller.button(Button::Up));
        assert!(controller.button(Button::Right));
    }

    #[test]
    fn test_debounce() {
        let mut controller = Controller::new();
        controller.set_button(Button::A, true);
        assert!(controller.button(Button::A));
        // Held down: no repeat, and the timer does not run.
        controller.service_debounce();
        assert!(!controller.button(Button::A));

        controller.set_button(Button::A, false);
        controller.service_debounce();
        controller.set_button(Button::A, true);
        assert!(controller.button(Button::A));
    }

    #[test]
    fn test_set_button_debounce() {
        let mut controller = Controller::new();
        controller.set_button_debounce(Button::Up, true, 2);
        controller.set_button(Button::Up, true);
        // Timer is armed with 2 * 4 frames.
        assert!(!controller.button(Button::Up));
        controller.set_button(Button::Up, false);
        for _ in 0..7 {
            controller.service_debounce();
        }
        controller.set_button(Button::Up, true);
        assert!(!controller.button(Button::Up));
        controller.set_button(Button::Up, false);
        controller.service_debounce();
        controller.set_button(Button::Up, true);
        assert!(controller.button(Button::Up));

        controller.set_button_debounce(Button::Start, true, 0);
        controller.set_button(Button::Start, false);
        controller.service_debounce();
        controller.set_button(Button::Start, true);
        assert!(controller.button(Button::Start));

        controller.set_button_debounce(Button::A, false, 3);
        controller.set_button(Button::A, true);
        assert!(controller.button(Button::A));
        assert!(controller.button(Button::A));
    }

    #[test]
    fn test_button_names() {
        let names: Vec<String> = Button::iter().map(|b| b.to_string()).collect();
        assert_eq!(
            names,
            ["Up", "Down", "Left", "Right", "Select", "Start", "A", "B", "C", "None"]
        );
    }
}
