//! Per-tick Chrysler controller: turns [`CarControl`] into LKAS, HUD, chime,
//! cancel and telemetry frames.

use super::messages::*;
use super::values::{ADDR_LKAS_HUD, DBC};
use crate::car::{AudibleAlert, CarControl, CarParams, VisualAlert};
use crate::io::CanSink;
use crate::packer::CanPacker;
use crate::types::{CanFrame, Result};

/// Ticks between two HUD frames (4 Hz at a 100 Hz control loop)
const HUD_PERIOD: u64 = 25;
/// Ticks between two telemetry frames
const TELEMETRY_PERIOD: u64 = 10;

pub struct ChryslerController<S: CanSink> {
    params: CarParams,
    packer: CanPacker,
    sink: S,
    frame: u64,
    hud_count: u32,
    last_visual_alert: VisualAlert,
    last_audible_alert: AudibleAlert,
    car_model: u8,
}

impl<S: CanSink> ChryslerController<S> {
    pub fn new(params: CarParams, sink: S) -> Result<Self> {
        Ok(Self {
            params,
            packer: CanPacker::from_dbc_str(DBC, "chrysler")?,
            sink,
            frame: 0,
            hud_count: 0,
            last_visual_alert: VisualAlert::None,
            last_audible_alert: AudibleAlert::None,
            car_model: 0,
        })
    }

    /// Run one control tick and send the resulting frames
    pub fn update(&mut self, control: &CarControl) -> Result<()> {
        let frames = self.build_frames(control)?;
        self.frame += 1;
        if frames.is_empty() {
            return Ok(());
        }
        log::trace!("Tick {}: sending {} frame(s)", self.frame, frames.len());
        self.sink.send(&frames)
    }

    fn build_frames(&mut self, control: &CarControl) -> Result<Vec<CanFrame>> {
        let mut frames = Vec::new();

        let moving_fast = control.v_ego > self.params.min_steer_speed;
        let lkas_active = moving_fast && control.enabled;

        let steer_max = self.params.steer_max;
        let apply_steer = if lkas_active {
            ((control.actuators.steer * steer_max as f64).round() as i32).clamp(-steer_max, steer_max)
        } else {
            0
        };

        if control.cancel {
            frames.push(create_wheel_buttons(self.frame)?);
        }

        if control.audible_alert != self.last_audible_alert {
            frames.push(create_chimes(control.audible_alert));
            self.last_audible_alert = control.audible_alert;
        }

        // A new visual alert opens a fresh alert window
        if control.visual_alert != self.last_visual_alert {
            self.hud_count = 0;
            self.last_visual_alert = control.visual_alert;
        }
        if self.frame % HUD_PERIOD == 0 {
            let hud = create_lkas_hud(
                control.gear,
                lkas_active,
                control.visual_alert,
                self.hud_count,
                self.car_model,
            );
            frames.push(self.packer.render(hud)?);
            self.hud_count = self.hud_count.saturating_add(1);
        }

        frames.push(create_lkas_command(&self.packer, apply_steer, moving_fast, self.frame)?);

        if self.frame % TELEMETRY_PERIOD == 0 {
            if let Some(telemetry) = &self.params.telemetry {
                if let Some(path) = &control.path {
                    let front = create_path_poly_front(self.frame, &path.poly, path.prob, &telemetry.path_front);
                    let back = create_path_poly_back(self.frame, &path.poly, &telemetry.path_back);
                    frames.push(self.packer.pack_message(&front)?);
                    frames.push(self.packer.pack_message(&back)?);
                }
                let angle = create_steering_angle(
                    self.frame,
                    control.actuators.steer,
                    control.actuators.steer_angle,
                    &telemetry.steering_angle,
                );
                frames.push(self.packer.pack_message(&angle)?);
            }
        }

        Ok(frames)
    }

    /// Learn vehicle state from a received frame
    pub fn observe(&mut self, frame: &CanFrame) {
        if frame.bus != 0 || frame.address != ADDR_LKAS_HUD {
            return;
        }
        match self.packer.unpack(frame) {
            Ok(values) => {
                if let Some(model) = values.get("CAR_MODEL") {
                    self.car_model = *model as u8;
                }
            }
            Err(e) => log::debug!("Failed to read LKAS_HUD {}: {}", frame, e),
        }
    }

    pub fn params(&self) -> &CarParams {
        &self.params
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of completed ticks
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
