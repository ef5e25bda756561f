//! Vehicle fingerprinting
//!
//! Narrows the set of candidate models from live bus traffic. Every relevant
//! frame (bus 0, 11-bit identifier) is recorded in the session [`Signature`]
//! and handed to a [`CandidateFilter`] that removes models whose reference
//! signatures cannot produce it. A sole survivor is accepted only after a
//! settle duration, because some control units start broadcasting late and a
//! distinguishing frame may still be on its way.
//!
//! The loop is a single cooperative task: it drains a non-blocking
//! [`FrameSource`], decides, and sleeps on the injected [`Clock`]. With a
//! [`ManualClock`](crate::io::ManualClock) a whole session runs without any
//! wall-clock delay.

pub mod table;

pub use table::{FingerprintTable, DEBUG_ADDRESS};

use crate::config::FingerprintConfig;
use crate::io::{Clock, FrameSource};
use crate::types::{CandidateSet, CanFrame, Signature};
use serde::Serialize;
use std::time::Duration;

/// Per-frame elimination predicate: returns the candidates compatible with
/// `frame`.
pub trait CandidateFilter {
    fn eliminate(&self, frame: &CanFrame, candidates: &CandidateSet) -> CandidateSet;
}

impl<F> CandidateFilter for F
where
    F: Fn(&CanFrame, &CandidateSet) -> CandidateSet,
{
    fn eliminate(&self, frame: &CanFrame, candidates: &CandidateSet) -> CandidateSet {
        self(frame, candidates)
    }
}

/// Outcome of a fingerprinting session.
///
/// `candidate` is `None` when no model could be identified; the signature
/// collected so far is still returned for diagnostics. Only the simulator
/// override yields no signature at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fingerprint {
    pub candidate: Option<String>,
    pub signature: Option<Signature>,
}

/// Result of one decision step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Keep polling
    Pending,
    /// A single candidate held for its settle duration
    Matched(String),
    /// Every candidate was eliminated
    NoCandidates,
    /// The session timeout expired
    TimedOut,
}

/// State of one fingerprinting session
#[derive(Debug)]
pub struct FingerprintSession<'a> {
    config: &'a FingerprintConfig,
    candidates: CandidateSet,
    signature: Signature,
    first_frame_at: Option<Duration>,
    started_at: Duration,
    timeout: Option<Duration>,
}

impl<'a> FingerprintSession<'a> {
    pub fn new(
        config: &'a FingerprintConfig,
        candidates: CandidateSet,
        started_at: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            config,
            candidates,
            signature: Signature::new(),
            first_frame_at: None,
            started_at,
            timeout,
        }
    }

    /// Apply one received frame. Irrelevant frames are ignored.
    pub fn ingest<F: CandidateFilter + ?Sized>(&mut self, frame: &CanFrame, filter: &F, now: Duration) {
        if !self.config.is_fingerprint_frame(frame.bus, frame.address) {
            log::trace!("Ignoring frame {} for fingerprinting", frame);
            return;
        }

        self.signature.insert(frame.address, frame.data.len());

        // The filter's answer is intersected so the set can only shrink.
        let compatible = filter.eliminate(frame, &self.candidates);
        let before = self.candidates.len();
        self.candidates.retain(|model| compatible.contains(model));
        if self.candidates.len() < before {
            log::debug!(
                "Frame 0x{:X} (len {}) left {} candidate(s)",
                frame.address,
                frame.data.len(),
                self.candidates.len()
            );
        }

        if self.first_frame_at.is_none() {
            self.first_frame_at = Some(now);
        }
    }

    /// Decide whether the session is over at time `now`
    pub fn decide(&self, now: Duration) -> Decision {
        if self.candidates.len() == 1 {
            if let (Some(first), Some(candidate)) = (self.first_frame_at, self.candidates.first()) {
                let settle = self.config.settle_duration(candidate);
                if now.saturating_sub(first) > settle {
                    return Decision::Matched(candidate.clone());
                }
                return Decision::Pending;
            }
        }

        if self.candidates.is_empty() {
            return Decision::NoCandidates;
        }

        match self.timeout {
            Some(timeout) if now.saturating_sub(self.started_at) > timeout => Decision::TimedOut,
            _ => Decision::Pending,
        }
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Time the first relevant frame was seen, if any
    pub fn first_frame_at(&self) -> Option<Duration> {
        self.first_frame_at
    }

    pub fn into_signature(self) -> Signature {
        self.signature
    }
}

/// Run a fingerprinting session until a model settles, no candidate is left,
/// or `timeout` (if any) expires.
///
/// Without a timeout the loop only ends on a decision; callers needing a hard
/// deadline must bound it themselves.
pub fn fingerprint<S, F, C>(
    source: &mut S,
    filter: &F,
    candidates: CandidateSet,
    config: &FingerprintConfig,
    clock: &C,
    timeout: Option<Duration>,
) -> Fingerprint
where
    S: FrameSource + ?Sized,
    F: CandidateFilter + ?Sized,
    C: Clock + ?Sized,
{
    if let Some(simulator) = config.simulator {
        log::warn!("Simulator override active, skipping fingerprint");
        return Fingerprint {
            candidate: Some(simulator.model().to_string()),
            signature: None,
        };
    }

    log::warn!("waiting for fingerprint...");
    let mut session = FingerprintSession::new(config, candidates, clock.now(), timeout);

    loop {
        let frames = source.drain();
        let now = clock.now();
        for frame in &frames {
            session.ingest(frame, filter, now);
        }

        match session.decide(now) {
            Decision::Pending => clock.sleep(config.poll_interval()),
            Decision::Matched(candidate) => {
                log::warn!("fingerprinted {}", candidate);
                return Fingerprint {
                    candidate: Some(candidate),
                    signature: Some(session.into_signature()),
                };
            }
            Decision::NoCandidates => {
                log::debug!("No candidates left after {} addresses", session.signature().len());
                return Fingerprint {
                    candidate: None,
                    signature: Some(session.into_signature()),
                };
            }
            Decision::TimedOut => {
                log::debug!(
                    "Fingerprint timed out with {} candidate(s) left",
                    session.candidates().len()
                );
                return Fingerprint {
                    candidate: None,
                    signature: Some(session.into_signature()),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Simulator;
    use crate::io::ManualClock;
    use std::collections::VecDeque;

    fn set(models: &[&str]) -> CandidateSet {
        models.iter().map(|m| m.to_string()).collect()
    }

    /// Keeps only the models named in `keep` when `address` is seen
    fn drop_on(address: u32, keep: &'static [&'static str]) -> impl Fn(&CanFrame, &CandidateSet) -> CandidateSet {
        move |frame, candidates| {
            if frame.address == address {
                candidates
                    .iter()
                    .filter(|c| keep.iter().any(|k| *k == c.as_str()))
                    .cloned()
                    .collect()
            } else {
                candidates.clone()
            }
        }
    }

    fn keep_all(_: &CanFrame, candidates: &CandidateSet) -> CandidateSet {
        candidates.clone()
    }

    #[test]
    fn test_candidates_never_grow() {
        let config = FingerprintConfig::new();
        let all = set(&["A", "B", "C"]);
        let mut session = FingerprintSession::new(&config, set(&["A", "B"]), Duration::ZERO, None);

        // A filter that tries to re-add every model
        let regrow = move |_: &CanFrame, _: &CandidateSet| all.clone();
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 8]), &regrow, Duration::ZERO);
        assert_eq!(session.candidates(), &set(&["A", "B"]));

        let mut sizes = vec![session.candidates().len()];
        for (address, filter) in [(0x200, drop_on(0x200, &["A"])), (0x300, drop_on(0x300, &[]))] {
            session.ingest(&CanFrame::new(address, 0, vec![0; 8]), &filter, Duration::ZERO);
            sizes.push(session.candidates().len());
        }
        assert_eq!(sizes, vec![2, 1, 0]);
    }

    #[test]
    fn test_irrelevant_frames_are_filtered() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["A", "B"]), Duration::ZERO, None);
        let eliminate_all = |_: &CanFrame, _: &CandidateSet| CandidateSet::new();

        session.ingest(&CanFrame::new(0x100, 1, vec![0; 8]), &eliminate_all, Duration::ZERO);
        session.ingest(&CanFrame::new(0x18DAF110, 0, vec![0; 8]), &eliminate_all, Duration::ZERO);

        assert_eq!(session.candidates().len(), 2);
        assert!(session.signature().is_empty());
        assert!(session.first_frame_at().is_none());
    }

    #[test]
    fn test_signature_overwrites_length() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["A"]), Duration::ZERO, None);
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 8]), &keep_all, Duration::ZERO);
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 5]), &keep_all, Duration::ZERO);
        session.ingest(&CanFrame::new(0x200, 0, vec![0; 2]), &keep_all, Duration::ZERO);

        assert_eq!(session.signature().get(&0x100), Some(&5));
        assert_eq!(session.signature().len(), 2);
    }

    #[test]
    fn test_settle_bound_fast_family() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["CHRYSLER X"]), Duration::ZERO, None);
        let t0 = Duration::from_millis(500);
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 8]), &keep_all, t0);

        assert_eq!(session.decide(t0), Decision::Pending);
        assert_eq!(session.decide(t0 + Duration::from_millis(100)), Decision::Pending);
        assert_eq!(
            session.decide(t0 + Duration::from_millis(101)),
            Decision::Matched("CHRYSLER X".to_string())
        );
    }

    #[test]
    fn test_settle_bound_slow_family() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["TOYOTA PRIUS 2017"]), Duration::ZERO, None);
        let t0 = Duration::from_millis(200);
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 8]), &keep_all, t0);

        assert_eq!(session.decide(t0 + Duration::from_millis(900)), Decision::Pending);
        assert_eq!(session.decide(t0 + Duration::from_millis(1000)), Decision::Pending);
        assert!(matches!(
            session.decide(t0 + Duration::from_millis(1001)),
            Decision::Matched(_)
        ));
    }

    #[test]
    fn test_settle_runs_from_first_frame() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["A", "B"]), Duration::ZERO, None);
        session.ingest(&CanFrame::new(0x100, 0, vec![0; 8]), &keep_all, Duration::ZERO);
        assert_eq!(session.decide(Duration::from_millis(400)), Decision::Pending);

        // Narrowing late does not restart the settle window
        let narrowed_at = Duration::from_millis(500);
        session.ingest(&CanFrame::new(0x200, 0, vec![0; 8]), &drop_on(0x200, &["A"]), narrowed_at);
        assert_eq!(session.first_frame_at(), Some(Duration::ZERO));
        assert_eq!(session.decide(narrowed_at), Decision::Matched("A".to_string()));
    }

    #[test]
    fn test_single_candidate_without_frames_waits() {
        let config = FingerprintConfig::new();
        let session = FingerprintSession::new(&config, set(&["A"]), Duration::ZERO, Some(Duration::from_secs(2)));
        assert_eq!(session.decide(Duration::from_secs(1)), Decision::Pending);
        assert_eq!(session.decide(Duration::from_secs(3)), Decision::TimedOut);
    }

    #[test]
    fn test_empty_set_fails_regardless_of_timeout() {
        let config = FingerprintConfig::new();
        let mut session = FingerprintSession::new(&config, set(&["A", "B"]), Duration::ZERO, None);
        session.ingest(&CanFrame::new(0x300, 0, vec![0; 8]), &drop_on(0x300, &[]), Duration::ZERO);
        assert_eq!(session.decide(Duration::ZERO), Decision::NoCandidates);
    }

    #[test]
    fn test_loop_times_out_in_passive_mode() {
        let config = FingerprintConfig::new();
        let clock = ManualClock::new();
        let mut source: VecDeque<CanFrame> = VecDeque::from(vec![CanFrame::new(0x100, 0, vec![0; 8])]);

        let result = fingerprint(
            &mut source,
            &keep_all,
            set(&["A", "B"]),
            &config,
            &clock,
            config.timeout(true),
        );

        assert_eq!(result.candidate, None);
        assert_eq!(result.signature, Some(Signature::from([(0x100, 8)])));
        assert!(clock.now() > Duration::from_secs(2));
        assert!(clock.now() < Duration::from_millis(2100));
    }

    #[test]
    fn test_loop_accepts_after_settle() {
        let config = FingerprintConfig::new();
        let clock = ManualClock::new();
        let mut source: VecDeque<CanFrame> = VecDeque::from(vec![
            CanFrame::new(0x100, 0, vec![0; 8]),
            CanFrame::new(0x200, 0, vec![0; 4]),
        ]);

        let result = fingerprint(
            &mut source,
            &drop_on(0x200, &["A"]),
            set(&["A", "B"]),
            &config,
            &clock,
            None,
        );

        assert_eq!(result.candidate.as_deref(), Some("A"));
        assert_eq!(result.signature.map(|s| s.len()), Some(2));
        assert!(clock.now() > Duration::from_millis(100));
        assert!(clock.now() <= Duration::from_millis(120));
    }

    #[test]
    fn test_loop_honours_configured_timing() {
        let config = FingerprintConfig::new()
            .with_poll_interval_ms(5)
            .with_passive_timeout_ms(50)
            .with_settle_ms(20, 200)
            .add_slow_broadcast_marker("SLOW");
        let frames = || {
            VecDeque::from(vec![
                CanFrame::new(0x100, 0, vec![0; 8]),
                CanFrame::new(0x200, 0, vec![0; 4]),
            ])
        };

        let clock = ManualClock::new();
        let result = fingerprint(
            &mut frames(),
            &drop_on(0x200, &["A"]),
            set(&["A", "B"]),
            &config,
            &clock,
            None,
        );
        assert_eq!(result.candidate.as_deref(), Some("A"));
        assert_eq!(clock.now(), Duration::from_millis(25));

        let clock = ManualClock::new();
        let result = fingerprint(
            &mut frames(),
            &drop_on(0x200, &["SLOW A"]),
            set(&["SLOW A", "B"]),
            &config,
            &clock,
            None,
        );
        assert_eq!(result.candidate.as_deref(), Some("SLOW A"));
        assert_eq!(clock.now(), Duration::from_millis(205));

        let clock = ManualClock::new();
        let result = fingerprint(
            &mut frames(),
            &keep_all,
            set(&["A", "B"]),
            &config,
            &clock,
            config.timeout(true),
        );
        assert_eq!(result.candidate, None);
        assert_eq!(clock.now(), Duration::from_millis(55));
    }

    #[test]
    fn test_simulator_override_skips_fingerprinting() {
        let config = FingerprintConfig::new().with_simulator(Some(Simulator::Simulator));
        let clock = ManualClock::new();
        let mut source: VecDeque<CanFrame> = VecDeque::new();

        let result = fingerprint(&mut source, &keep_all, set(&["A"]), &config, &clock, None);
        assert_eq!(result.candidate.as_deref(), Some("simulator"));
        assert_eq!(result.signature, None);
        assert_eq!(clock.now(), Duration::ZERO);
    }
}
