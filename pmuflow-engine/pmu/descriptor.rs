use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

use pmuflow_raw::{FieldSpec, SplitField};

use crate::error::{PmuError, Result};
use crate::events::{Event, EventIdx, Modifier, ModifierId, ModifierSet};
use crate::pmu::detect::{Detector, FamilyProbe, RevisionFilter};

/// Registry-wide unique PMU identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PmuId(pub u32);

impl fmt::Display for PmuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Optional behaviours of a PMU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PmuFlags: u32 {
        /// Resolve event names by unique prefix when no exact match exists
        const PREFIX_MATCH = 1 << 0;
        /// Events with unit masks must end up with at least one selected
        const UMASK_REQUIRED = 1 << 1;
    }
}

/// Where each part of an event lands in the encoded registers
#[derive(Debug, Clone, Copy)]
pub struct EncodingLayout {
    /// Event code pieces, low bits first
    pub code: &'static [FieldSpec],
    pub umask: FieldSpec,
    /// Bits always set in the primary register (enable, interrupt)
    pub fixed_bits: u64,
    /// Registers available to one encoding, primary included
    pub max_encoding: usize,
}

impl EncodingLayout {
    pub fn code_field(&self) -> SplitField<'static> {
        SplitField::new(self.code)
    }
}

/// One hardware variant: identity, event table, modifiers and layout
#[derive(Debug, Clone)]
pub struct PmuDescriptor {
    pub name: &'static str,
    pub id: PmuId,
    pub description: &'static str,
    pub flags: PmuFlags,
    pub detector: Detector,
    pub events: &'static [Event],
    /// Modifiers honoured, in canonical rendering order
    pub modifiers: &'static [Modifier],
    pub layout: EncodingLayout,
}

impl PmuDescriptor {
    pub fn new(
        name: &'static str,
        id: PmuId,
        description: &'static str,
        detector: Detector,
        events: &'static [Event],
        modifiers: &'static [Modifier],
        layout: EncodingLayout,
    ) -> Self {
        Self {
            name,
            id,
            description,
            flags: PmuFlags::empty(),
            detector,
            events,
            modifiers,
            layout,
        }
    }

    pub fn with_flags(self, flags: PmuFlags) -> Self {
        Self { flags, ..self }
    }

    /// Exact revision this PMU describes, if it is revision specific
    pub fn revision(&self) -> Option<u32> {
        match self.detector.revision {
            RevisionFilter::Exact(rev) => Some(rev),
            RevisionFilter::Any => None,
        }
    }

    pub fn family(&self) -> FamilyProbe {
        self.detector.family
    }

    pub fn modifier_set(&self) -> ModifierSet {
        self.modifiers.iter().map(|m| m.id.flag()).collect()
    }

    pub fn modifier(&self, id: ModifierId) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.id == id)
    }

    pub fn modifier_named(&self, name: &str) -> Option<&Modifier> {
        ModifierId::from_name(name).and_then(|id| self.modifier(id))
    }

    pub fn event(&self, idx: EventIdx) -> Option<&'static Event> {
        self.events.get(idx.0)
    }

    /// Whether the event exists on this PMU's revision
    pub fn is_available(&self, idx: EventIdx) -> bool {
        self.event(idx)
            .is_some_and(|e| e.avail.contains(self.revision()))
    }

    /// Modifiers of `event` this PMU honours, in canonical order
    pub fn event_modifiers<'a>(&'a self, event: &'a Event) -> impl Iterator<Item = &'a Modifier> {
        self.modifiers
            .iter()
            .filter(move |m| event.modifiers.has(m.id))
    }

    /// Resolve an event name: exact match first, then unique prefix
    pub fn resolve_event(&self, name: &str) -> Result<EventIdx> {
        let revision = self.revision();
        let available = || {
            self.events
                .iter()
                .enumerate()
                .filter(move |(_, e)| e.avail.contains(revision))
        };

        if let Some((i, _)) = available().find(|(_, e)| e.name.eq_ignore_ascii_case(name)) {
            return Ok(EventIdx(i));
        }

        if !self.flags.contains(PmuFlags::PREFIX_MATCH) || name.is_empty() {
            return Err(PmuError::not_found("event", name));
        }

        let upper = name.to_ascii_uppercase();
        let hits: Vec<(usize, &Event)> = available()
            .filter(|(_, e)| e.name.to_ascii_uppercase().starts_with(&upper))
            .collect();

        match hits.as_slice() {
            [(i, e)] => {
                tracing::debug!("{}: resolved prefix {} to {}", self.name, name, e.name);
                Ok(EventIdx(*i))
            }
            [] => Err(PmuError::not_found("event", name)),
            _ => Err(PmuError::not_found("event (ambiguous prefix)", name)),
        }
    }

    /// Mask of primary register bits that belong in a perf-style config
    ///
    /// Privilege and virtualization qualifiers travel as flags, and the
    /// fixed enable bits are programmed by the counting subsystem.
    pub fn config_mask(&self) -> u64 {
        let flag_bits = self
            .modifiers
            .iter()
            .filter(|m| m.is_flag())
            .filter_map(|m| m.field)
            .filter(|f| f.target.index() == 0)
            .fold(0u64, |acc, f| acc | f.mask());
        !(flag_bits | self.layout.fixed_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_resolve_exact_is_case_insensitive() {
        let pmu = testing::rev_b();
        assert_eq!(pmu.resolve_event("cycles").unwrap(), EventIdx(0));
        assert_eq!(pmu.resolve_event("CYCLES").unwrap(), EventIdx(0));
    }

    #[test]
    fn test_resolve_without_prefix_matching() {
        let pmu = testing::rev_b().with_flags(PmuFlags::empty());
        let err = pmu.resolve_event("CYC").unwrap_err();
        assert_eq!(err.token(), Some("CYC"));
    }

    #[test]
    fn test_resolve_prefix() {
        let pmu = testing::rev_b().with_flags(PmuFlags::PREFIX_MATCH);
        assert_eq!(pmu.resolve_event("CYC").unwrap(), EventIdx(0));

        // CACHE_ACCESSES and CACHE_MISSES
        let err = pmu.resolve_event("CACHE").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        assert_eq!(err.token(), Some("CACHE"));
    }

    #[test]
    fn test_revision_restricted_events_are_hidden() {
        let rev_b = testing::rev_b();
        let rev_c = testing::rev_c();
        assert!(rev_b.resolve_event("NEW_IN_REVC").is_err());
        assert!(rev_c.resolve_event("NEW_IN_REVC").is_ok());
    }

    #[test]
    fn test_config_mask_strips_flags_and_fixed_bits() {
        let pmu = testing::rev_b();
        let mask = pmu.config_mask();
        assert_eq!(mask & (1 << 16), 0);
        assert_eq!(mask & (1 << 17), 0);
        assert_eq!(mask & (1 << 22), 0);
        assert_ne!(mask & (1 << 18), 0);
        assert_ne!(mask & 0xFF, 0);
    }
}
