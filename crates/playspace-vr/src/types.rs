use std::fmt;
use std::str::FromStr;

use glam::{DMat3, DVec3};

pub type TrackedDeviceIndex = u32;

/// Number of device slots the runtime tracks.
pub const MAX_TRACKED_DEVICE_COUNT: u32 = 64;

/// The HMD always occupies slot 0.
pub const HMD_DEVICE_INDEX: TrackedDeviceIndex = 0;

/// Row-major 3x4 transform: a 3x3 rotation block and a translation column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix34 {
    pub m: [[f32; 4]; 3],
}

impl Matrix34 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self::from_rotation_translation(DMat3::IDENTITY, translation)
    }

    pub fn from_rotation_translation(rotation: DMat3, translation: DVec3) -> Self {
        let mut m = [[0.0f32; 4]; 3];
        for (r, row) in m.iter_mut().enumerate() {
            let rot_row = rotation.row(r);
            row[0] = rot_row.x as f32;
            row[1] = rot_row.y as f32;
            row[2] = rot_row.z as f32;
            row[3] = translation[r] as f32;
        }
        Self { m }
    }

    /// The 3x3 rotation block.
    pub fn rotation(&self) -> DMat3 {
        let m = &self.m;
        DMat3::from_cols(
            DVec3::new(m[0][0] as f64, m[1][0] as f64, m[2][0] as f64),
            DVec3::new(m[0][1] as f64, m[1][1] as f64, m[2][1] as f64),
            DVec3::new(m[0][2] as f64, m[1][2] as f64, m[2][2] as f64),
        )
    }

    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.m[0][3] as f64, self.m[1][3] as f64, self.m[2][3] as f64)
    }
}

impl Default for Matrix34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One device slot's predicted pose for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DevicePose {
    pub device_to_absolute_tracking: Matrix34,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

impl DevicePose {
    /// A pose contributes only when it is both valid and connected.
    pub fn is_usable(&self) -> bool {
        self.pose_is_valid && self.device_is_connected
    }

    pub fn position(&self) -> DVec3 {
        self.device_to_absolute_tracking.translation()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerRole {
    LeftHand,
    RightHand,
}

impl fmt::Display for ControllerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerRole::LeftHand => f.write_str("left"),
            ControllerRole::RightHand => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub packet_num: u32,
    pub button_pressed: u64,
    pub button_touched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingUniverse {
    Seated,
    Standing,
    RawAndUncalibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatProperty {
    DisplayFrequency,
    SecondsFromVsyncToPhotons,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    pub frame_index: u32,
    pub num_frame_presents: u32,
    pub system_time_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Ok,
    Warning,
    BaseStationMayHaveMoved,
    Error,
    PlayAreaInvalid,
    CollisionBoundsInvalid,
}

impl CalibrationState {
    pub fn is_ok(self) -> bool {
        self == CalibrationState::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualDeviceType {
    TrackedController,
    GenericTracker,
}

/// Metadata for a device slot created by the input emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualDeviceInfo {
    pub virtual_device_id: u32,
    pub openvr_device_id: TrackedDeviceIndex,
    pub device_type: VirtualDeviceType,
}

/// Runtime button identifiers. The bit for a button is `1 << id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ButtonId {
    System = 0,
    ApplicationMenu = 1,
    Grip = 2,
    DPadLeft = 3,
    DPadUp = 4,
    DPadRight = 5,
    DPadDown = 6,
    A = 7,
    ProximitySensor = 31,
    Touchpad = 32,
    Trigger = 33,
}

impl ButtonId {
    pub const fn mask(self) -> u64 {
        1u64 << self as u32
    }

    pub const fn mask_of(ids: &[ButtonId]) -> u64 {
        let mut mask = 0;
        let mut i = 0;
        while i < ids.len() {
            mask |= ids[i].mask();
            i += 1;
        }
        mask
    }

    /// Parse a comma separated list like `menu,a` into a mask.
    pub fn parse_mask(list: &str) -> Result<u64, String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(0u64, |mask, name| Ok(mask | name.parse::<ButtonId>()?.mask()))
    }
}

impl FromStr for ButtonId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(ButtonId::System),
            "menu" | "applicationmenu" => Ok(ButtonId::ApplicationMenu),
            "grip" => Ok(ButtonId::Grip),
            "dpadleft" => Ok(ButtonId::DPadLeft),
            "dpadup" => Ok(ButtonId::DPadUp),
            "dpadright" => Ok(ButtonId::DPadRight),
            "dpaddown" => Ok(ButtonId::DPadDown),
            "a" | "x" => Ok(ButtonId::A),
            "proximity" => Ok(ButtonId::ProximitySensor),
            "touchpad" | "axis0" => Ok(ButtonId::Touchpad),
            "trigger" | "axis1" => Ok(ButtonId::Trigger),
            other => Err(format!("unknown button '{other}'")),
        }
    }
}
