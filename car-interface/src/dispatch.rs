//! Car dispatcher: fingerprint the bus, then hand back the matching
//! controller and its parameters.

use crate::car::chrysler::values as chrysler_values;
use crate::car::CarParams;
use crate::config::FingerprintConfig;
use crate::fingerprint::{fingerprint, FingerprintTable};
use crate::io::{CanSink, Clock, FrameSource};
use crate::registry::{CarController, CarRegistry, MOCK_MODEL};
use crate::types::{CarError, Result};

/// Resolves the connected car to a controller
pub struct Dispatcher {
    registry: CarRegistry,
    table: FingerprintTable,
    config: FingerprintConfig,
}

impl Dispatcher {
    pub fn new(registry: CarRegistry, table: FingerprintTable, config: FingerprintConfig) -> Self {
        Self {
            registry,
            table,
            config,
        }
    }

    /// Default registry and built-in reference signatures
    pub fn with_defaults(config: FingerprintConfig) -> Self {
        Self::new(CarRegistry::with_defaults(), default_table(), config)
    }

    pub fn registry(&self) -> &CarRegistry {
        &self.registry
    }

    pub fn table(&self) -> &FingerprintTable {
        &self.table
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Identify the car on `source` and build its controller around `sink`.
    ///
    /// In passive mode the session is bounded by the passive timeout and an
    /// unknown car falls back to the mock family. Otherwise fingerprinting
    /// runs until it decides and an unknown car is an error.
    pub fn get_car<S, K, C>(
        &self,
        source: &mut S,
        sink: K,
        passive: bool,
        clock: &C,
    ) -> Result<(CarController<K>, CarParams)>
    where
        S: FrameSource + ?Sized,
        K: CanSink,
        C: Clock + ?Sized,
    {
        let result = fingerprint(
            source,
            &self.table,
            self.table.all_known_cars(),
            &self.config,
            clock,
            self.config.timeout(passive),
        );

        let candidate = match result.candidate {
            Some(candidate) => candidate,
            None if passive => {
                log::warn!("car doesn't match any fingerprints: {:?}", result.signature);
                MOCK_MODEL.to_string()
            }
            None => {
                log::warn!("car doesn't match any fingerprints: {:?}", result.signature);
                return Err(CarError::Unrecognized {
                    signature: result.signature.unwrap_or_default(),
                });
            }
        };

        let family = self.registry.get(&candidate).ok_or_else(|| {
            log::warn!("car matched {}, but interface wasn't available", candidate);
            CarError::NoInterface {
                model: candidate.clone(),
            }
        })?;

        let params = family.get_params(&candidate, result.signature.as_ref());
        log::info!("Using {:?} interface for {}", family, candidate);
        let controller = family.construct(params.clone(), sink)?;
        Ok((controller, params))
    }
}

/// Reference signatures of every family shipped with the crate
pub fn default_table() -> FingerprintTable {
    chrysler_values::fingerprints()
}

/// Identify the car with the default registry and table, honouring the
/// simulator environment switches.
pub fn get_car<S, K, C>(
    source: &mut S,
    sink: K,
    passive: bool,
    clock: &C,
) -> Result<(CarController<K>, CarParams)>
where
    S: FrameSource + ?Sized,
    K: CanSink,
    C: Clock + ?Sized,
{
    let config = FingerprintConfig::default().with_env_overrides();
    Dispatcher::with_defaults(config).get_car(source, sink, passive, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Simulator;
    use crate::io::ManualClock;
    use crate::registry::{CarFamily, CarRegistry};
    use crate::types::{CanFrame, Signature};
    use std::collections::VecDeque;

    fn dispatcher() -> Dispatcher {
        let table = FingerprintTable::new()
            .with_signature("CHRYSLER PACIFICA HYBRID 2017", Signature::from([(0x100, 8)]))
            .with_signature("HONDA CIVIC", Signature::from([(0x200, 8)]));
        let registry = CarRegistry::with_defaults().with_model("HONDA CIVIC", None);
        Dispatcher::new(registry, table, FingerprintConfig::default())
    }

    fn source(frames: &[(u32, usize)]) -> VecDeque<CanFrame> {
        frames
            .iter()
            .map(|&(address, len)| CanFrame::new(address, 0, vec![0; len]))
            .collect()
    }

    #[test]
    fn test_identifies_chrysler() {
        let clock = ManualClock::new();
        let mut source = source(&[(0x100, 8)]);
        let (controller, params) = dispatcher()
            .get_car(&mut source, Vec::<CanFrame>::new(), false, &clock)
            .unwrap();
        assert_eq!(controller.family(), CarFamily::Chrysler);
        assert_eq!(params.car_fingerprint, "CHRYSLER PACIFICA HYBRID 2017");
        assert!(params.enable_camera);
    }

    #[test]
    fn test_passive_unknown_falls_back_to_mock() {
        let clock = ManualClock::new();
        let mut source = source(&[(0x300, 8)]);
        let (controller, params) = dispatcher()
            .get_car(&mut source, Vec::<CanFrame>::new(), true, &clock)
            .unwrap();
        assert_eq!(controller.family(), CarFamily::Mock);
        assert_eq!(params.car_fingerprint, MOCK_MODEL);
    }

    #[test]
    fn test_active_unknown_is_unrecognized() {
        let clock = ManualClock::new();
        let mut source = source(&[(0x300, 8)]);
        let err = dispatcher()
            .get_car(&mut source, Vec::<CanFrame>::new(), false, &clock)
            .err()
            .unwrap();
        match err {
            CarError::Unrecognized { signature } => assert_eq!(signature.get(&0x300), Some(&8)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_model_without_interface() {
        let clock = ManualClock::new();
        let mut source = source(&[(0x200, 8)]);
        let err = dispatcher()
            .get_car(&mut source, Vec::<CanFrame>::new(), true, &clock)
            .err()
            .unwrap();
        assert!(matches!(err, CarError::NoInterface { model } if model == "HONDA CIVIC"));
    }

    #[test]
    fn test_simulator_gets_mock_family() {
        let clock = ManualClock::new();
        let config = FingerprintConfig::default().with_simulator(Some(Simulator::Simulator2));
        let dispatcher = Dispatcher::with_defaults(config);
        let (controller, params) = dispatcher
            .get_car(&mut VecDeque::<CanFrame>::new(), Vec::<CanFrame>::new(), false, &clock)
            .unwrap();
        assert_eq!(controller.family(), CarFamily::Mock);
        assert_eq!(params.car_fingerprint, "simulator2");
    }
}
