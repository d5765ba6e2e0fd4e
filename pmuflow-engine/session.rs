//! Process-wide library session
//!
//! A [`Session`] owns a built registry and its activated descriptor. The
//! global instance is created by [`initialize`], shared as `Arc` handles by
//! [`current`], and torn down by [`terminate`]. Handles still held after
//! teardown report [`PmuError::Terminated`] instead of working on stale state.
//!
//! Teardown is enforced on `Session` methods only. A `&PmuDescriptor`
//! obtained from [`Session::pmu`] before teardown is plain immutable table
//! data and stays usable with the free functions in [`crate::encode`];
//! callers that must observe teardown go through the session every time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::common::{CpuidProbe, HostProbe};
use crate::config::SessionConfig;
use crate::encode::{self, EncodedEvent, ParsedEvent};
use crate::error::{PmuError, Result};
use crate::introspect::EventIter;
use crate::pmu::{PmuDescriptor, PmuRegistry};

#[derive(Debug)]
pub struct Session {
    registry: PmuRegistry,
    alive: AtomicBool,
}

impl Session {
    /// Activate a descriptor from `registry`; fails when nothing matches
    pub fn new(registry: PmuRegistry, config: &SessionConfig, probe: &dyn HostProbe) -> Result<Self> {
        registry.activate_with(config, probe)?;
        Ok(Self {
            registry,
            alive: AtomicBool::new(true),
        })
    }

    /// Session over the built-in tables
    pub fn with_config(config: &SessionConfig, probe: &dyn HostProbe) -> Result<Self> {
        Self::new(PmuRegistry::builtin(), config, probe)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(PmuError::Terminated)
        }
    }

    pub fn registry(&self) -> Result<&PmuRegistry> {
        self.ensure_alive()?;
        Ok(&self.registry)
    }

    /// The active descriptor
    ///
    /// The reference is not tied to the session's liveness, see the module docs.
    pub fn pmu(&self) -> Result<&PmuDescriptor> {
        self.ensure_alive()?;
        self.registry
            .active()
            .ok_or_else(|| PmuError::NotSupported("no active PMU".to_string()))
    }

    pub fn parse(&self, input: &str) -> Result<ParsedEvent> {
        encode::parse(self.pmu()?, input)
    }

    pub fn encode(&self, input: &str) -> Result<EncodedEvent> {
        encode::encode_event(self.pmu()?, input)
    }

    pub fn events(&self) -> Result<EventIter<'_>> {
        Ok(self.pmu()?.events())
    }

    fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

static SESSION: Lazy<RwLock<Option<Arc<Session>>>> = Lazy::new(|| RwLock::new(None));

/// Create the global session, probing the host CPU
///
/// Idempotent: once a session exists it is returned as is.
pub fn initialize(config: &SessionConfig) -> Result<Arc<Session>> {
    initialize_with(config, &CpuidProbe)
}

pub fn initialize_with(config: &SessionConfig, probe: &dyn HostProbe) -> Result<Arc<Session>> {
    {
        let session = SESSION.read();
        if let Some(s) = session.as_ref() {
            return Ok(Arc::clone(s));
        }
    }

    let mut session = SESSION.write();
    if let Some(s) = session.as_ref() {
        return Ok(Arc::clone(s));
    }

    let created = Arc::new(Session::with_config(config, probe)?);
    if let Some(pmu) = created.registry.active() {
        tracing::info!("Session initialized on {}", pmu.name);
    }
    *session = Some(Arc::clone(&created));
    Ok(created)
}

/// Handle to the global session
pub fn current() -> Result<Arc<Session>> {
    SESSION
        .read()
        .as_ref()
        .map(Arc::clone)
        .ok_or(PmuError::NotInitialized)
}

/// Release the global session; outstanding handles become unusable
pub fn terminate() {
    if let Some(session) = SESSION.write().take() {
        session.shutdown();
        tracing::info!("Session terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{HostIdentity, StaticProbe};
    use crate::error::ErrorKind;
    use crate::testing;

    fn session(revision: u32) -> Result<Session> {
        let registry = PmuRegistry::builder()
            .register(testing::rev_b())
            .register(testing::rev_c())
            .build();
        Session::new(
            registry,
            &SessionConfig::default(),
            &StaticProbe(testing::host(revision)),
        )
    }

    #[test]
    fn test_session_uses_active_pmu() {
        let s = session(2).unwrap();
        assert_eq!(s.pmu().unwrap().name, "test_revc");
        assert_eq!(s.encode("CYCLES").unwrap().config, 0x76);
        assert!(s.parse("NEW_IN_REVC").is_ok());
        assert_eq!(s.events().unwrap().count(), 6);
    }

    #[test]
    fn test_session_requires_match() {
        let err = session(9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_terminated_session_reports_error() {
        let s = session(1).unwrap();
        s.shutdown();
        assert!(!s.is_alive());
        assert!(matches!(s.encode("CYCLES"), Err(PmuError::Terminated)));
        assert!(matches!(s.pmu(), Err(PmuError::Terminated)));
        assert!(matches!(s.registry(), Err(PmuError::Terminated)));
    }

    #[test]
    fn test_teardown_applies_to_session_calls() {
        let s = session(2).unwrap();
        let pmu = s.pmu().unwrap();
        s.shutdown();

        assert!(matches!(s.encode("CYCLES"), Err(PmuError::Terminated)));
        assert!(matches!(s.events(), Err(PmuError::Terminated)));
        // Table data borrowed earlier is immutable and still encodes
        assert_eq!(encode::encode_event(pmu, "CYCLES").unwrap().config, 0x76);
    }

    // The only test touching the global session
    #[test]
    fn test_global_lifecycle() {
        assert!(matches!(current(), Err(PmuError::NotInitialized)));

        // K8 revision F
        let probe = StaticProbe(HostIdentity::new("AuthenticAMD", 15, 0x41, 2));
        let first = initialize_with(&SessionConfig::default(), &probe).unwrap();
        assert_eq!(first.pmu().unwrap().name, "amd64_k8_revf");

        let other = StaticProbe(HostIdentity::new("AuthenticAMD", 16, 2, 0));
        let second = initialize_with(&SessionConfig::default(), &other).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &current().unwrap()));

        terminate();
        assert!(matches!(current(), Err(PmuError::NotInitialized)));
        let err = first.encode("CPU_CLK_UNHALTED").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lifecycle);

        // A fresh session can be created after teardown
        let third = initialize_with(&SessionConfig::default(), &other).unwrap();
        assert_eq!(third.pmu().unwrap().name, "amd64_fam10h_barcelona");
        terminate();
    }
}
