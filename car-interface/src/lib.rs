//! Car Interface Library
//!
//! Identifies which vehicle model is on a CAN bus from its traffic, then
//! encodes outbound control messages into that vehicle's wire format.
//!
//! # Architecture
//!
//! - [`fingerprint`] narrows a candidate set of models frame by frame until a
//!   single model has settled, every model is ruled out, or a timeout hits
//! - [`registry`] maps model identifiers to vehicle families
//! - [`dispatch`] ties the two together and hands back a controller
//! - [`car`] holds the families and their message encoders
//! - [`packer`] and [`signals`] pack signal values using DBC layouts
//! - [`checksum`] is the bit-serial checksum Chrysler control units verify
//!
//! Bus access and time are injected through the traits in [`io`], so the
//! same code runs against a live bus or a replayed log.
//!
//! # Example Usage
//!
//! ```no_run
//! use car_interface::{CanFrame, CarControl, Dispatcher, FingerprintConfig, MonotonicClock};
//! use std::collections::VecDeque;
//!
//! let mut source: VecDeque<CanFrame> = VecDeque::new();
//! let clock = MonotonicClock::new();
//! let dispatcher = Dispatcher::with_defaults(FingerprintConfig::default().with_env_overrides());
//!
//! let (mut controller, params) = dispatcher
//!     .get_car(&mut source, Vec::<CanFrame>::new(), true, &clock)
//!     .unwrap();
//! println!("Driving a {}", params.car_fingerprint);
//! controller.update(&CarControl::default()).unwrap();
//! ```

// Public modules
pub mod car;
pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod fingerprint;
pub mod formats;
pub mod io;
pub mod packer;
pub mod registry;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use car::{CarControl, CarParams};
pub use checksum::checksum;
pub use config::{FingerprintConfig, Simulator};
pub use dispatch::{default_table, get_car, Dispatcher};
pub use fingerprint::{fingerprint, CandidateFilter, Fingerprint, FingerprintTable};
pub use io::{CanSink, Clock, FrameSource, ManualClock, MonotonicClock, ReplaySource};
pub use packer::CanPacker;
pub use registry::{CarController, CarFamily, CarRegistry};
pub use signals::DatabaseStats;
pub use types::{
    CandidateSet, CanFrame, CarError, Outbound, OutboundMessage, Result, Signature,
    SignalValues, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
