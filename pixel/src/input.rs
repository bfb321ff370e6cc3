use std::collections::HashSet;

use pixel_math::{v2, Vec2};
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Shift,
    Control,
}

impl Key {
    /// Maps a physical key, ignoring keys that have no counterpart.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::KeyA => Key::A,
            KeyCode::KeyB => Key::B,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyE => Key::E,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyI => Key::I,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyL => Key::L,
            KeyCode::KeyM => Key::M,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyQ => Key::Q,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyT => Key::T,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyX => Key::X,
            KeyCode::KeyY => Key::Y,
            KeyCode::KeyZ => Key::Z,
            KeyCode::Digit0 | KeyCode::Numpad0 => Key::Num0,
            KeyCode::Digit1 | KeyCode::Numpad1 => Key::Num1,
            KeyCode::Digit2 | KeyCode::Numpad2 => Key::Num2,
            KeyCode::Digit3 | KeyCode::Numpad3 => Key::Num3,
            KeyCode::Digit4 | KeyCode::Numpad4 => Key::Num4,
            KeyCode::Digit5 | KeyCode::Numpad5 => Key::Num5,
            KeyCode::Digit6 | KeyCode::Numpad6 => Key::Num6,
            KeyCode::Digit7 | KeyCode::Numpad7 => Key::Num7,
            KeyCode::Digit8 | KeyCode::Numpad8 => Key::Num8,
            KeyCode::Digit9 | KeyCode::Numpad9 => Key::Num9,
            KeyCode::ArrowUp => Key::Up,
            KeyCode::ArrowDown => Key::Down,
            KeyCode::ArrowLeft => Key::Left,
            KeyCode::ArrowRight => Key::Right,
            KeyCode::Space => Key::Space,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Escape => Key::Escape,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
            KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
            _ => return None,
        };

        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            winit::event::MouseButton::Back => MouseButton::Back,
            winit::event::MouseButton::Forward => MouseButton::Forward,
            winit::event::MouseButton::Other(id) => MouseButton::Other(id),
        }
    }
}

/// Input as seen by one frame. Pressed and released hold the edges since the
/// previous frame, held holds everything down at the end of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pressed: HashSet<Key>,
    released: HashSet<Key>,
    held: HashSet<Key>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    buttons_held: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputSnapshot {
    pub fn key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    pub fn key_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn mouse_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    pub fn mouse_button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    /// Physical pixels from the top left of the window.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn with_pressed(mut self, key: Key) -> Self {
        self.pressed.insert(key);
        self.held.insert(key);
        self
    }

    pub fn with_released(mut self, key: Key) -> Self {
        self.released.insert(key);
        self.held.remove(&key);
        self
    }

    pub fn with_held(mut self, key: Key) -> Self {
        self.held.insert(key);
        self
    }
}

/// Accumulates window events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    current: InputSnapshot,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        if self.current.held.insert(key) {
            self.current.pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: Key) {
        if self.current.held.remove(&key) {
            self.current.released.insert(key);
        }
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if self.current.buttons_held.insert(button) {
            self.current.buttons_pressed.insert(button);
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        if self.current.buttons_held.remove(&button) {
            self.current.buttons_released.insert(button);
        }
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.current.mouse_position = position;
    }

    /// Releases everything held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        let keys: Vec<Key> = self.current.held.iter().copied().collect();
        for key in keys {
            self.release(key);
        }

        let buttons: Vec<MouseButton> = self.current.buttons_held.iter().copied().collect();
        for button in buttons {
            self.release_button(button);
        }
    }

    /// Returns true if the event was input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return true;
                };
                let Some(key) = Key::from_key_code(code) else {
                    return true;
                };

                match event.state {
                    ElementState::Pressed if !event.repeat => self.press(key),
                    ElementState::Pressed => {}
                    ElementState::Released => self.release(key),
                }
            }

            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button((*button).into()),
                ElementState::Released => self.release_button((*button).into()),
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.set_mouse_position(v2(position.x as f32, position.y as f32));
            }

            WindowEvent::Focused(false) => self.release_all(),

            _ => return false,
        }

        true
    }

    /// Takes this frame's input and starts collecting edges for the next.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = self.current.clone();

        self.current.pressed.clear();
        self.current.released.clear();
        self.current.buttons_pressed.clear();
        self.current.buttons_released.clear();

        snapshot
    }
}
