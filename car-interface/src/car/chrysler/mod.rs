//! Chrysler / Jeep family (Pacifica, Grand Cherokee)

pub mod controller;
pub mod messages;
pub mod values;

pub use controller::ChryslerController;

use crate::car::{CarParams, TelemetryMessages};
use crate::types::Signature;
use values::*;

/// Family name reported in [`CarParams::car_name`]
pub const CAR_NAME: &str = "chrysler";

/// Standard cargo added to the curb weight, kg
const STD_CARGO_KG: f64 = 136.0;

/// Derive vehicle parameters for `model` from its fingerprint signature
pub fn get_params(model: &str, signature: &Signature) -> CarParams {
    let jeep = model == JEEP_CHEROKEE || model == JEEP_CHEROKEE_2019;
    let (wheelbase, steer_ratio) = if jeep { (2.91, 12.7) } else { (3.089, 16.2) };

    // Later model years refuse lane keeping below this speed
    let min_steer_speed = if model == PACIFICA_2019_HYBRID || model == JEEP_CHEROKEE_2019 {
        17.5
    } else {
        3.8
    };

    // A stock camera sending LKAS_COMMAND means we must stay off the bus
    let enable_camera = !signature.contains_key(&ADDR_LKAS_COMMAND);

    CarParams {
        car_name: CAR_NAME.to_string(),
        car_fingerprint: model.to_string(),
        enable_camera,
        mass: 2858.0 + STD_CARGO_KG,
        wheelbase,
        steer_ratio,
        steer_max: STEER_MAX,
        min_steer_speed,
        telemetry: Some(TelemetryMessages {
            path_front: PATH_POLY_FRONT.to_string(),
            path_back: PATH_POLY_BACK.to_string(),
            steering_angle: STEERING_ANGLE.to_string(),
        }),
    }
}
