//! Vehicle families
//!
//! Each family knows how to derive its [`CarParams`] from a fingerprint
//! signature and how to turn a per-tick [`CarControl`] into bus frames.

pub mod chrysler;
pub mod mock;

use serde::{Deserialize, Serialize};

/// Transmission gear as reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gear {
    #[default]
    Unknown,
    Park,
    Reverse,
    Neutral,
    Drive,
    Low,
}

impl Gear {
    /// Forward, reverse or low: the gears in which lane keeping can engage
    pub fn is_driving(&self) -> bool {
        matches!(self, Gear::Drive | Gear::Reverse | Gear::Low)
    }
}

/// Visual alert requested on the instrument cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualAlert {
    #[default]
    None,
    FcwAlert,
    SteerRequired,
    BrakePressed,
    WrongGear,
    SeatbeltUnbuckled,
    SpeedTooHigh,
}

/// Audible alert requested from the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudibleAlert {
    #[default]
    None,
    ChimeEngage,
    ChimeDisengage,
    ChimeError,
    ChimeWarning1,
    ChimeWarning2,
    ChimeWarningRepeat,
    ChimePrompt,
}

/// Physical actuator requests
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Actuators {
    /// Normalised steering torque request, -1..1
    pub steer: f64,
    /// Target steering wheel angle, degrees
    pub steer_angle: f64,
}

/// Planned path as a cubic polynomial, highest order first
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathPlan {
    pub poly: [f64; 4],
    /// Confidence, 0..1
    pub prob: f64,
}

/// Everything a controller needs for one control tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarControl {
    pub enabled: bool,
    /// Vehicle speed, m/s
    pub v_ego: f64,
    pub gear: Gear,
    pub actuators: Actuators,
    /// Ask the vehicle's cruise control to cancel
    pub cancel: bool,
    pub visual_alert: VisualAlert,
    pub audible_alert: AudibleAlert,
    pub path: Option<PathPlan>,
}

/// Names of the per-vehicle telemetry messages carrying path and steering
/// state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryMessages {
    pub path_front: String,
    pub path_back: String,
    pub steering_angle: String,
}

/// Vehicle configuration derived from the fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarParams {
    /// Family name, e.g. "chrysler"
    pub car_name: String,
    /// Model identifier the params were derived for
    pub car_fingerprint: String,
    /// True when the stock lane-keep camera is not commanding the bus
    pub enable_camera: bool,
    /// Curb weight plus standard cargo, kg
    pub mass: f64,
    /// m
    pub wheelbase: f64,
    pub steer_ratio: f64,
    /// Largest steering torque command, raw units
    pub steer_max: i32,
    /// Lane keeping only engages above this speed, m/s
    pub min_steer_speed: f64,
    pub telemetry: Option<TelemetryMessages>,
}
