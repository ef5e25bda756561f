//! Chrysler message encoders
//!
//! Pure functions from control state to frames or to signal values awaiting
//! the packer. Nothing here keeps state; counters are derived from the
//! caller's frame number.

use super::values::{ADDR_CHIME, ADDR_LKAS_HUD, ADDR_WHEEL_BUTTONS};
use crate::car::{AudibleAlert, Gear, VisualAlert};
use crate::checksum::checksum;
use crate::packer::CanPacker;
use crate::types::{CanFrame, Outbound, OutboundMessage, Result, SignalValues};

/// HUD payload shown while the driver must take the wheel
const STEER_REQUIRED_HUD: [u8; 8] = [0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00];

const CHIME_OFF: [u8; 2] = [0x00, 0x50];
const CHIME_ON: [u8; 2] = [0x4f, 0x55];

/// HUD ticks (4 Hz) during which a fresh alert window shows the alert flag
const HUD_ALERT_TICKS: u32 = 4;

/// Raw frame on bus 0
pub fn make_can_msg(address: u32, data: Vec<u8>) -> CanFrame {
    CanFrame::new(address, 0, data)
}

/// LKAS_HUD: lane-keeping icon and alert state
pub fn create_lkas_hud(
    gear: Gear,
    lkas_active: bool,
    hud_alert: VisualAlert,
    hud_count: u32,
    lkas_car_model: u8,
) -> Outbound {
    if hud_alert == VisualAlert::SteerRequired {
        return Outbound::Raw(make_can_msg(ADDR_LKAS_HUD, STEER_REQUIRED_HUD.to_vec()));
    }

    let mut color = 1.0;
    let mut lines = 1.0;
    let alerts = if hud_count < HUD_ALERT_TICKS { 1.0 } else { 0.0 };

    if gear.is_driving() && lkas_active {
        color = 2.0;
        lines = 6.0;
    }

    Outbound::Packed(
        OutboundMessage::new("LKAS_HUD", 0)
            .with("LKAS_ICON_COLOR", color)
            .with("CAR_MODEL", lkas_car_model as f64)
            .with("LKAS_LANE_LINES", lines)
            .with("LKAS_ALERTS", alerts),
    )
}

/// LKAS_COMMAND: steering torque request, rolling counter and checksum.
///
/// The checksum covers the packed frame minus its trailing checksum byte.
pub fn create_lkas_command(
    packer: &CanPacker,
    apply_steer: i32,
    moving_fast: bool,
    frame: u64,
) -> Result<CanFrame> {
    let mut values = SignalValues::new();
    values.insert("LKAS_STEERING_TORQUE".to_string(), apply_steer as f64);
    values.insert("LKAS_HIGH_TORQUE".to_string(), if moving_fast { 1.0 } else { 0.0 });
    values.insert("COUNTER".to_string(), (frame % 0x10) as f64);

    let unsigned = packer.pack("LKAS_COMMAND", 0, &values)?;
    let covered = &unsigned.data[..unsigned.data.len().saturating_sub(1)];
    values.insert("CHECKSUM".to_string(), checksum(covered)? as f64);

    packer.pack("LKAS_COMMAND", 0, &values)
}

/// Chime request: silent unless an audible alert is active
pub fn create_chimes(audible_alert: AudibleAlert) -> CanFrame {
    let data = match audible_alert {
        AudibleAlert::None => CHIME_OFF,
        _ => CHIME_ON,
    };
    make_can_msg(ADDR_CHIME, data.to_vec())
}

/// WHEEL_BUTTONS: press ACC cancel. The 4-bit counter sits in the high
/// nibble of the second byte.
pub fn create_wheel_buttons(frame: u64) -> Result<CanFrame> {
    let mut data = vec![0x01, ((frame % 0x10) as u8) << 4];
    data.push(checksum(&data)?);
    Ok(make_can_msg(ADDR_WHEEL_BUTTONS, data))
}

/// Sign bit for a scaled field: set for negative values
fn sign(value: f64) -> f64 {
    if value < 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Magnitude of `value * scale`, truncated toward zero
fn magnitude(value: f64, scale: f64) -> f64 {
    (value * scale).trunc().abs()
}

fn counter(frame: u64) -> f64 {
    (frame % 256) as f64
}

/// Third and second order path coefficients plus confidence
pub fn create_path_poly_front(frame: u64, poly: &[f64; 4], prob: f64, name: &str) -> OutboundMessage {
    OutboundMessage::new(name, 0)
        .with("PROB", (prob * 10.0).trunc())
        .with("THIRD_ORDER_SIGN", sign(poly[0]))
        .with("THIRD_ORDER", magnitude(poly[0], 1e8))
        .with("SECOND_ORDER_SIGN", sign(poly[1]))
        .with("SECOND_ORDER", magnitude(poly[1], 1e6))
        .with("COUNTER", counter(frame))
}

/// First and zero order path coefficients
pub fn create_path_poly_back(frame: u64, poly: &[f64; 4], name: &str) -> OutboundMessage {
    OutboundMessage::new(name, 0)
        .with("FIRST_ORDER_SIGN", sign(poly[2]))
        .with("FIRST_ORDER", magnitude(poly[2], 1e6))
        .with("ZERO_ORDER_SIGN", sign(poly[3]))
        .with("ZERO_ORDER", magnitude(poly[3], 1e6))
        .with("COUNTER", counter(frame))
}

/// Commanded steering and target angle telemetry
pub fn create_steering_angle(frame: u64, steer: f64, steer_angle: f64, name: &str) -> OutboundMessage {
    OutboundMessage::new(name, 0)
        .with("STEERING_ANGLE_SIGN", sign(steer))
        .with("STEERING_ANGLE", magnitude(steer, 1e4))
        .with("STEERING_ANGLE_TARGET_SIGN", sign(steer_angle))
        .with("STEERING_ANGLE_TARGET", magnitude(steer_angle, 1e4))
        .with("COUNTER", counter(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::chrysler::values::{DBC, PATH_POLY_BACK, PATH_POLY_FRONT, STEERING_ANGLE};

    fn packer() -> CanPacker {
        CanPacker::from_dbc_str(DBC, "chrysler").unwrap()
    }

    fn render(outbound: Outbound) -> CanFrame {
        packer().render(outbound).unwrap()
    }

    #[test]
    fn test_hud_steer_required_overrides_everything() {
        for gear in [Gear::Drive, Gear::Park, Gear::Reverse] {
            for active in [true, false] {
                let frame = render(create_lkas_hud(gear, active, VisualAlert::SteerRequired, 0, 0x12));
                assert_eq!(frame.address, 0x2a6);
                assert_eq!(frame.data, vec![0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00]);
            }
        }
    }

    #[test]
    fn test_hud_active_in_drive() {
        let frame = render(create_lkas_hud(Gear::Drive, true, VisualAlert::None, 0, 0));
        assert_eq!(frame.data, vec![0x02, 0x00, 0x06, 0x01, 0x00, 0x00, 0x00, 0x00]);

        let frame = render(create_lkas_hud(Gear::Drive, true, VisualAlert::None, 2, 0x12));
        assert_eq!(frame.data, vec![0x02, 0x12, 0x06, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_hud_defaults_outside_driving_gears() {
        let frame = render(create_lkas_hud(Gear::Park, true, VisualAlert::None, 10, 0));
        assert_eq!(frame.data, vec![0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let frame = render(create_lkas_hud(Gear::Drive, false, VisualAlert::None, 4, 0));
        assert_eq!(frame.data, vec![0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_lkas_command() {
        let packer = packer();

        let frame = create_lkas_command(&packer, 0, false, 0).unwrap();
        assert_eq!(frame.address, 0x292);
        assert_eq!(frame.data, vec![0x80, 0x00, 0x00, 0x00, 0x00, 0x33]);

        let frame = create_lkas_command(&packer, 100, true, 5).unwrap();
        assert_eq!(frame.data, vec![0x8c, 0x90, 0x00, 0x50, 0x00, 0xbf]);

        // Counter wraps at 16
        let frame = create_lkas_command(&packer, -261, false, 17).unwrap();
        assert_eq!(frame.data, vec![0x5f, 0x60, 0x00, 0x10, 0x00, 0x77]);
    }

    #[test]
    fn test_lkas_command_checksum_matches_payload() {
        let frame = create_lkas_command(&packer(), 42, true, 9).unwrap();
        let (payload, trailer) = frame.data.split_at(5);
        assert_eq!(trailer[0], checksum(payload).unwrap());
    }

    #[test]
    fn test_chimes() {
        let off = create_chimes(AudibleAlert::None);
        assert_eq!(off.address, 0x339);
        assert_eq!(off.data, vec![0x00, 0x50]);

        let on = create_chimes(AudibleAlert::ChimeWarning1);
        assert_eq!(on.address, 0x339);
        assert_eq!(on.data, vec![0x4f, 0x55]);
    }

    #[test]
    fn test_wheel_buttons() {
        let frame = create_wheel_buttons(0).unwrap();
        assert_eq!(frame.address, 0x23b);
        assert_eq!(frame.data, vec![0x01, 0x00, 0xf2]);

        assert_eq!(create_wheel_buttons(1).unwrap().data, vec![0x01, 0x10, 0x3f]);
        assert_eq!(create_wheel_buttons(15).unwrap().data, vec![0x01, 0xf0, 0x8d]);
        assert_eq!(create_wheel_buttons(16).unwrap().data, vec![0x01, 0x00, 0xf2]);
    }

    #[test]
    fn test_path_poly_front_signs_and_scales() {
        let poly = [-0.00000005, 0.000003, 0.000002, -1.5];
        let msg = create_path_poly_front(300, &poly, 0.75, PATH_POLY_FRONT);
        assert_eq!(msg.value("THIRD_ORDER_SIGN"), Some(1.0));
        assert_eq!(msg.value("THIRD_ORDER"), Some(5.0));
        assert_eq!(msg.value("SECOND_ORDER_SIGN"), Some(0.0));
        assert_eq!(msg.value("SECOND_ORDER"), Some(3.0));
        assert_eq!(msg.value("PROB"), Some(7.0));
        assert_eq!(msg.value("COUNTER"), Some(44.0));

        let frame = packer().pack_message(&msg).unwrap();
        assert_eq!(frame.data, vec![0x07, 0x80, 0x00, 0x05, 0x00, 0x00, 0x03, 0x2c]);
    }

    #[test]
    fn test_path_poly_back() {
        let poly = [-0.00000005, 0.000003, 0.000002, -1.5];
        let msg = create_path_poly_back(300, &poly, PATH_POLY_BACK);
        assert_eq!(msg.value("FIRST_ORDER_SIGN"), Some(0.0));
        assert_eq!(msg.value("FIRST_ORDER"), Some(2.0));
        assert_eq!(msg.value("ZERO_ORDER_SIGN"), Some(1.0));
        assert_eq!(msg.value("ZERO_ORDER"), Some(1_500_000.0));

        let frame = packer().pack_message(&msg).unwrap();
        assert_eq!(frame.data, vec![0x00, 0x00, 0x02, 0x96, 0xe3, 0x60, 0x00, 0x2c]);
    }

    #[test]
    fn test_steering_angle() {
        let msg = create_steering_angle(10, 0.5, -3.0, STEERING_ANGLE);
        let frame = packer().pack_message(&msg).unwrap();
        assert_eq!(frame.data, vec![0x00, 0x13, 0x88, 0x80, 0x75, 0x30, 0x00, 0x0a]);
    }

    #[test]
    fn test_zero_is_positive() {
        let msg = create_steering_angle(0, 0.0, -0.0, STEERING_ANGLE);
        assert_eq!(msg.value("STEERING_ANGLE_SIGN"), Some(0.0));
        assert_eq!(msg.value("STEERING_ANGLE_TARGET_SIGN"), Some(0.0));
    }
}
