//! Event table data model
//!
//! Tables are plain `'static` data: an ordered slice of [`Event`]s, each
//! owning its slice of [`Umask`]s. They are checked once by
//! [`validate::validate`] before a PMU using them is registered.

pub mod modifier;
pub mod validate;

use bitflags::bitflags;
use serde::Serialize;

pub use modifier::{Modifier, ModifierId, ModifierSet, Polarity, ValueDomain};

/// Position of an event inside its PMU's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventIdx(pub usize);

/// Range of silicon revisions an event or unit mask exists on
///
/// Revisions are ordinals within one CPU family; bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub since: u32,
    pub until: u32,
}

impl Availability {
    pub const ALWAYS: Availability = Availability {
        since: 0,
        until: u32::MAX,
    };

    /// `None` means the revision is unknown, in which case everything is offered
    pub fn contains(&self, revision: Option<u32>) -> bool {
        match revision {
            Some(rev) => self.since <= rev && rev <= self.until,
            None => true,
        }
    }
}

bitflags! {
    /// Unit mask attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UmaskFlags: u8 {
        /// Applied when no unit mask of the same group is given
        const DEFAULT = 1 << 0;
        /// Cannot be combined with any other unit mask of the event
        const NO_COMBO = 1 << 1;
    }
}

/// A sub-unit selector refining an event
#[derive(Debug, Clone, Copy)]
pub struct Umask {
    pub name: &'static str,
    pub value: u64,
    pub description: &'static str,
    /// Umasks sharing a group are mutually exclusive alternatives
    pub group: Option<u16>,
    pub flags: UmaskFlags,
    pub avail: Availability,
}

impl Umask {
    pub const fn new(name: &'static str, value: u64, description: &'static str) -> Self {
        Self {
            name,
            value,
            description,
            group: None,
            flags: UmaskFlags::empty(),
            avail: Availability::ALWAYS,
        }
    }

    pub const fn in_group(self, group: u16) -> Self {
        Self {
            group: Some(group),
            ..self
        }
    }

    pub const fn as_default(self) -> Self {
        Self {
            flags: self.flags.union(UmaskFlags::DEFAULT),
            ..self
        }
    }

    pub const fn no_combo(self) -> Self {
        Self {
            flags: self.flags.union(UmaskFlags::NO_COMBO),
            ..self
        }
    }

    pub const fn since(self, revision: u32) -> Self {
        Self {
            avail: Availability {
                since: revision,
                ..self.avail
            },
            ..self
        }
    }

    pub const fn until(self, revision: u32) -> Self {
        Self {
            avail: Availability {
                until: revision,
                ..self.avail
            },
            ..self
        }
    }

    pub fn is_default(&self) -> bool {
        self.flags.contains(UmaskFlags::DEFAULT)
    }

    /// Whether selecting both `self` and `other` is forbidden
    pub fn excludes(&self, other: &Umask) -> bool {
        self.flags.contains(UmaskFlags::NO_COMBO)
            || other.flags.contains(UmaskFlags::NO_COMBO)
            || (self.group.is_some() && self.group == other.group)
    }
}

/// A named hardware-countable condition
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub name: &'static str,
    pub code: u64,
    pub description: &'static str,
    pub umasks: &'static [Umask],
    /// Modifiers legal on this event
    pub modifiers: ModifierSet,
    pub avail: Availability,
}

impl Event {
    pub const fn new(name: &'static str, code: u64, description: &'static str) -> Self {
        Self {
            name,
            code,
            description,
            umasks: &[],
            modifiers: ModifierSet::empty(),
            avail: Availability::ALWAYS,
        }
    }

    pub const fn with_umasks(self, umasks: &'static [Umask]) -> Self {
        Self { umasks, ..self }
    }

    pub const fn with_modifiers(self, modifiers: ModifierSet) -> Self {
        Self { modifiers, ..self }
    }

    pub const fn since(self, revision: u32) -> Self {
        Self {
            avail: Availability {
                since: revision,
                ..self.avail
            },
            ..self
        }
    }

    pub const fn until(self, revision: u32) -> Self {
        Self {
            avail: Availability {
                until: revision,
                ..self.avail
            },
            ..self
        }
    }

    /// Unit masks offered on `revision`, with their table positions
    pub fn available_umasks(
        &self,
        revision: Option<u32>,
    ) -> impl Iterator<Item = (usize, &'static Umask)> + '_ {
        self.umasks
            .iter()
            .enumerate()
            .filter(move |(_, u)| u.avail.contains(revision))
    }

    /// Case-insensitive unit mask lookup restricted to `revision`
    pub fn find_umask(&self, name: &str, revision: Option<u32>) -> Option<usize> {
        self.available_umasks(revision)
            .find(|(_, u)| u.name.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
    }
}
