//! Model registry
//!
//! Maps every known model identifier to the family implementing it. The
//! registry is built once and only read afterwards.

use crate::car::chrysler::{self, values as chrysler_values, ChryslerController};
use crate::car::mock::{self, MockController};
use crate::car::{CarControl, CarParams};
use crate::io::CanSink;
use crate::types::{CanFrame, Result, Signature};
use std::collections::BTreeMap;

/// Model served when the car is unknown in passive mode
pub const MOCK_MODEL: &str = "mock";

/// A family of vehicles sharing one codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarFamily {
    Chrysler,
    Mock,
}

impl CarFamily {
    /// Vehicle parameters for `model`, given the signature it was
    /// identified by (absent under the simulator override)
    pub fn get_params(&self, model: &str, signature: Option<&Signature>) -> CarParams {
        match self {
            CarFamily::Chrysler => {
                let empty = Signature::new();
                chrysler::get_params(model, signature.unwrap_or(&empty))
            }
            CarFamily::Mock => mock::get_params(model),
        }
    }

    /// Build this family's controller around `sink`
    pub fn construct<S: CanSink>(&self, params: CarParams, sink: S) -> Result<CarController<S>> {
        Ok(match self {
            CarFamily::Chrysler => CarController::Chrysler(ChryslerController::new(params, sink)?),
            CarFamily::Mock => CarController::Mock(MockController::new(params, sink)),
        })
    }
}

/// Controller of whichever family the car belongs to
pub enum CarController<S: CanSink> {
    Chrysler(ChryslerController<S>),
    Mock(MockController<S>),
}

impl<S: CanSink> CarController<S> {
    pub fn update(&mut self, control: &CarControl) -> Result<()> {
        match self {
            CarController::Chrysler(c) => c.update(control),
            CarController::Mock(c) => c.update(control),
        }
    }

    pub fn observe(&mut self, frame: &CanFrame) {
        match self {
            CarController::Chrysler(c) => c.observe(frame),
            CarController::Mock(c) => c.observe(frame),
        }
    }

    pub fn params(&self) -> &CarParams {
        match self {
            CarController::Chrysler(c) => c.params(),
            CarController::Mock(c) => c.params(),
        }
    }

    pub fn sink(&self) -> &S {
        match self {
            CarController::Chrysler(c) => c.sink(),
            CarController::Mock(c) => c.sink(),
        }
    }

    pub fn into_sink(self) -> S {
        match self {
            CarController::Chrysler(c) => c.into_sink(),
            CarController::Mock(c) => c.into_sink(),
        }
    }

    pub fn family(&self) -> CarFamily {
        match self {
            CarController::Chrysler(_) => CarFamily::Chrysler,
            CarController::Mock(_) => CarFamily::Mock,
        }
    }
}

/// Model identifier -> family. `None` marks a model that is known but has
/// no interface.
#[derive(Debug, Clone, Default)]
pub struct CarRegistry {
    models: BTreeMap<String, Option<CarFamily>>,
}

impl CarRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every family shipped with the crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for model in chrysler_values::CARS {
            registry.register(*model, Some(CarFamily::Chrysler));
        }
        for model in [MOCK_MODEL, "simulator", "simulator2"] {
            registry.register(model, Some(CarFamily::Mock));
        }
        registry
    }

    pub fn register(&mut self, model: impl Into<String>, family: Option<CarFamily>) {
        self.models.insert(model.into(), family);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_model(mut self, model: impl Into<String>, family: Option<CarFamily>) -> Self {
        self.register(model, family);
        self
    }

    /// Family of `model`; `None` when unknown or without interface
    pub fn get(&self, model: &str) -> Option<CarFamily> {
        self.models.get(model).copied().flatten()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn known_models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
