//! Mock family: stands in when the car is unknown or simulated

use crate::car::{CarControl, CarParams};
use crate::io::CanSink;
use crate::types::{CanFrame, Result};

pub const CAR_NAME: &str = "mock";

/// Params with every physical quantity left at zero
pub fn get_params(model: &str) -> CarParams {
    CarParams {
        car_name: CAR_NAME.to_string(),
        car_fingerprint: model.to_string(),
        enable_camera: false,
        mass: 0.0,
        wheelbase: 0.0,
        steer_ratio: 0.0,
        steer_max: 0,
        min_steer_speed: 0.0,
        telemetry: None,
    }
}

/// Controller that never sends anything
pub struct MockController<S: CanSink> {
    params: CarParams,
    sink: S,
}

impl<S: CanSink> MockController<S> {
    pub fn new(params: CarParams, sink: S) -> Self {
        Self { params, sink }
    }

    pub fn update(&mut self, _control: &CarControl) -> Result<()> {
        Ok(())
    }

    pub fn observe(&mut self, _frame: &CanFrame) {}

    pub fn params(&self) -> &CarParams {
        &self.params
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sends_nothing() {
        let mut controller = MockController::new(get_params("mock"), Vec::<CanFrame>::new());
        controller.update(&CarControl::default()).unwrap();
        assert!(controller.sink().is_empty());
        assert_eq!(controller.params().car_name, "mock");
        assert!(controller.params().telemetry.is_none());
    }
}
