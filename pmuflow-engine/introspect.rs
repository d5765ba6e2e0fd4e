//! Read-only traversal of a PMU's event table
//!
//! Traversal follows table order and skips events that do not exist on the
//! descriptor's revision. An event's attributes are its available unit
//! masks followed by its legal modifiers in canonical order, so attribute
//! indices are stable for a given descriptor.

use serde::Serialize;

use crate::error::{PmuError, Result};
use crate::events::{Event, EventIdx, Modifier, Umask, ValueDomain};
use crate::pmu::{PmuDescriptor, PmuId};

#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub idx: EventIdx,
    pub name: &'static str,
    pub description: &'static str,
    pub code: u64,
    pub pmu: &'static str,
    pub pmu_id: PmuId,
    pub umasks: usize,
    pub modifiers: usize,
}

impl EventInfo {
    /// Total attribute count, the bound for [`PmuDescriptor::attr_info`]
    pub fn attrs(&self) -> usize {
        self.umasks + self.modifiers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
    Umask,
    Modifier,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttrInfo {
    pub index: usize,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: AttrKind,
    /// Unit mask value; modifiers carry their domain instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<ValueDomain>,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<u16>,
}

impl AttrInfo {
    fn umask(index: usize, u: &Umask) -> Self {
        Self {
            index,
            name: u.name,
            description: u.description,
            kind: AttrKind::Umask,
            value: Some(u.value),
            domain: None,
            is_default: u.is_default(),
            group: u.group,
        }
    }

    fn modifier(index: usize, m: &Modifier) -> Self {
        Self {
            index,
            name: m.name(),
            description: m.description,
            kind: AttrKind::Modifier,
            value: None,
            domain: Some(m.domain),
            is_default: false,
            group: None,
        }
    }
}

/// Forward iterator over the available events of one descriptor
pub struct EventIter<'a> {
    pmu: &'a PmuDescriptor,
    next: Option<EventIdx>,
}

impl Iterator for EventIter<'_> {
    type Item = EventIdx;

    fn next(&mut self) -> Option<EventIdx> {
        let current = self.next?;
        self.next = self.pmu.next_event(current);
        Some(current)
    }
}

impl PmuDescriptor {
    /// First available event in table order
    pub fn first_event(&self) -> Option<EventIdx> {
        self.available_from(0)
    }

    pub fn next_event(&self, idx: EventIdx) -> Option<EventIdx> {
        self.available_from(idx.0 + 1)
    }

    fn available_from(&self, start: usize) -> Option<EventIdx> {
        (start..self.events.len())
            .map(EventIdx)
            .find(|&i| self.is_available(i))
    }

    pub fn is_valid_event(&self, idx: EventIdx) -> bool {
        self.is_available(idx)
    }

    pub fn events(&self) -> EventIter<'_> {
        EventIter {
            pmu: self,
            next: self.first_event(),
        }
    }

    /// Name lookup using the same rules as the event string parser
    pub fn find_event(&self, name: &str) -> Result<EventIdx> {
        self.resolve_event(name)
    }

    fn available_event(&self, idx: EventIdx) -> Result<&'static Event> {
        self.event(idx)
            .filter(|_| self.is_available(idx))
            .ok_or_else(|| PmuError::not_found("event", format!("#{}", idx.0)))
    }

    pub fn event_info(&self, idx: EventIdx) -> Result<EventInfo> {
        let event = self.available_event(idx)?;
        Ok(EventInfo {
            idx,
            name: event.name,
            description: event.description,
            code: event.code,
            pmu: self.name,
            pmu_id: self.id,
            umasks: event.available_umasks(self.revision()).count(),
            modifiers: self.event_modifiers(event).count(),
        })
    }

    pub fn attr_info(&self, idx: EventIdx, attr: usize) -> Result<AttrInfo> {
        let event = self.available_event(idx)?;

        let revision = self.revision();
        let umask_count = event.available_umasks(revision).count();

        if attr < umask_count {
            if let Some((_, u)) = event.available_umasks(revision).nth(attr) {
                return Ok(AttrInfo::umask(attr, u));
            }
        } else if let Some(m) = self.event_modifiers(event).nth(attr - umask_count) {
            return Ok(AttrInfo::modifier(attr, m));
        }

        Err(PmuError::not_found(
            "attribute",
            format!("{}#{}", event.name, attr),
        ))
    }

    /// Every attribute of an event, in attribute index order
    pub fn attrs(&self, idx: EventIdx) -> Result<Vec<AttrInfo>> {
        let info = self.event_info(idx)?;
        (0..info.attrs()).map(|a| self.attr_info(idx, a)).collect()
    }
}
