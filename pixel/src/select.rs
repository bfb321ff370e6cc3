use crate::{input::Key, InputSnapshot, Rgb};

pub const DEFAULT_STEP: u8 = 32;

/// Tint and alpha chosen by the player, applied at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modulation {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Modulation {
    pub const IDENTITY: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn tint(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn alpha(&self) -> u8 {
        self.a
    }
}

impl Default for Modulation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Keys that raise and lower one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelKeys {
    pub increase: Key,
    pub decrease: Key,
}

impl ChannelKeys {
    pub const fn new(increase: Key, decrease: Key) -> Self {
        Self { increase, decrease }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampBindings {
    pub red: ChannelKeys,
    pub green: ChannelKeys,
    pub blue: ChannelKeys,
    pub alpha: ChannelKeys,
}

impl Default for RampBindings {
    fn default() -> Self {
        Self {
            red: ChannelKeys::new(Key::Q, Key::A),
            green: ChannelKeys::new(Key::W, Key::S),
            blue: ChannelKeys::new(Key::E, Key::D),
            alpha: ChannelKeys::new(Key::R, Key::F),
        }
    }
}

/// Steps each channel up or down on a key press edge, saturating at 0 and
/// 255. Q/A ramp red, W/S green, E/D blue and R/F alpha.
pub fn select_frame(previous: Modulation, input: &InputSnapshot, step: u8) -> Modulation {
    select_frame_with(previous, input, &RampBindings::default(), step)
}

pub fn select_frame_with(
    previous: Modulation,
    input: &InputSnapshot,
    bindings: &RampBindings,
    step: u8,
) -> Modulation {
    let ramp = |value: u8, keys: &ChannelKeys| {
        let mut value = value;
        if input.key_pressed(keys.increase) {
            value = value.saturating_add(step);
        }
        if input.key_pressed(keys.decrease) {
            value = value.saturating_sub(step);
        }
        value
    };

    Modulation {
        r: ramp(previous.r, &bindings.red),
        g: ramp(previous.g, &bindings.green),
        b: ramp(previous.b, &bindings.blue),
        a: ramp(previous.a, &bindings.alpha),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The arrow pressed this frame. Up wins over Down, Down over Left, Left over
/// Right.
pub fn select_direction(input: &InputSnapshot) -> Option<Direction> {
    [
        (Key::Up, Direction::Up),
        (Key::Down, Direction::Down),
        (Key::Left, Direction::Left),
        (Key::Right, Direction::Right),
    ]
    .into_iter()
    .find(|(key, _)| input.key_pressed(*key))
    .map(|(_, direction)| direction)
}

/// Moves through `len` frames with Right and Left, wrapping at either end.
pub fn cycle_frame(current: usize, len: usize, input: &InputSnapshot) -> usize {
    if len == 0 {
        return 0;
    }

    let current = current % len;
    let forward = input.key_pressed(Key::Right);
    let back = input.key_pressed(Key::Left);

    match (forward, back) {
        (true, false) => (current + 1) % len,
        (false, true) => (current + len - 1) % len,
        _ => current,
    }
}
