//! Generic modifier catalog
//!
//! Modifiers are the qualifiers shared across hardware classes: privilege
//! level exclusion, edge detection, counter mask comparison and so on. The
//! catalog only fixes their names and value domains; each PMU binds the
//! ones it honours to register fields.

use bitflags::bitflags;
use serde::Serialize;

use pmuflow_raw::FieldSpec;

id_enum! {
    /// Identifier of a generic modifier, named as it appears in event strings
    pub enum ModifierId {
        User => "u",
        Kernel => "k",
        Edge => "e",
        Invert => "i",
        CounterMask => "c",
        Host => "h",
        Guest => "g",
        Pinned => "pinned",
        Precise => "precise",
    }
}

impl ModifierId {
    /// Single-modifier set
    pub const fn flag(self) -> ModifierSet {
        match self {
            ModifierId::User => ModifierSet::USER,
            ModifierId::Kernel => ModifierSet::KERNEL,
            ModifierId::Edge => ModifierSet::EDGE,
            ModifierId::Invert => ModifierSet::INVERT,
            ModifierId::CounterMask => ModifierSet::COUNTER_MASK,
            ModifierId::Host => ModifierSet::HOST,
            ModifierId::Guest => ModifierSet::GUEST,
            ModifierId::Pinned => ModifierSet::PINNED,
            ModifierId::Precise => ModifierSet::PRECISE,
        }
    }
}

/// Values a modifier accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueDomain {
    /// Presence/absence, written without `=value`
    Bool,
    /// Integer in `[min, max]`
    Int { min: u64, max: u64 },
}

/// How a boolean field is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Field is 1 when the modifier is present
    Direct,
    /// Field is 1 when the modifier is absent (exclusion modifiers)
    Cleared,
}

/// One modifier as honoured by a PMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub id: ModifierId,
    pub description: &'static str,
    pub domain: ValueDomain,
    /// Register field the value lands in; `None` for flag-only modifiers
    pub field: Option<FieldSpec>,
    pub polarity: Polarity,
}

impl Modifier {
    /// Catalog entry for `id`, not yet bound to a register field
    pub const fn generic(id: ModifierId) -> Self {
        let (description, domain) = match id {
            ModifierId::User => ("exclude user level execution", ValueDomain::Bool),
            ModifierId::Kernel => ("exclude kernel level execution", ValueDomain::Bool),
            ModifierId::Edge => ("edge detect, count transitions", ValueDomain::Bool),
            ModifierId::Invert => ("invert counter mask comparison", ValueDomain::Bool),
            ModifierId::CounterMask => (
                "counter mask, count cycles with at least this many occurrences",
                ValueDomain::Int { min: 0, max: 255 },
            ),
            ModifierId::Host => ("count only while in host mode", ValueDomain::Bool),
            ModifierId::Guest => ("count only while in guest mode", ValueDomain::Bool),
            ModifierId::Pinned => ("keep the event on a counter at all times", ValueDomain::Bool),
            ModifierId::Precise => (
                "precise sampling level",
                ValueDomain::Int { min: 0, max: 3 },
            ),
        };
        Self {
            id,
            description,
            domain,
            field: None,
            polarity: Polarity::Direct,
        }
    }

    /// Bind to `field`, set when the modifier is given
    pub const fn at(self, field: FieldSpec) -> Self {
        Self {
            field: Some(field),
            polarity: Polarity::Direct,
            ..self
        }
    }

    /// Bind to `field`, cleared when the modifier is given
    pub const fn cleared_at(self, field: FieldSpec) -> Self {
        Self {
            field: Some(field),
            polarity: Polarity::Cleared,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.domain, ValueDomain::Bool)
    }

    /// Field value written when the modifier is absent from the string
    pub fn default_field_value(&self) -> u64 {
        match self.polarity {
            Polarity::Direct => 0,
            Polarity::Cleared => 1,
        }
    }

    /// Field value written for a resolved modifier value
    pub fn field_value(&self, value: Option<u64>) -> u64 {
        match (self.polarity, value) {
            (_, None) => self.default_field_value(),
            (Polarity::Cleared, Some(v)) => u64::from(v == 0),
            (Polarity::Direct, Some(v)) => v,
        }
    }

    /// Whether this modifier is conveyed by a derived flag rather than config bits
    pub fn is_flag(&self) -> bool {
        matches!(
            self.id,
            ModifierId::User
                | ModifierId::Kernel
                | ModifierId::Host
                | ModifierId::Guest
                | ModifierId::Pinned
                | ModifierId::Precise
        )
    }
}

bitflags! {
    /// Modifiers legal on an event or honoured by a PMU
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ModifierSet: u32 {
        const USER = 1 << 0;
        const KERNEL = 1 << 1;
        const EDGE = 1 << 2;
        const INVERT = 1 << 3;
        const COUNTER_MASK = 1 << 4;
        const HOST = 1 << 5;
        const GUEST = 1 << 6;
        const PINNED = 1 << 7;
        const PRECISE = 1 << 8;
    }
}

impl ModifierSet {
    pub const fn of(ids: &[ModifierId]) -> Self {
        let mut set = Self::empty();
        let mut i = 0;
        while i < ids.len() {
            set = set.union(ids[i].flag());
            i += 1;
        }
        set
    }

    pub const fn with(self, id: ModifierId) -> Self {
        self.union(id.flag())
    }

    pub const fn has(self, id: ModifierId) -> bool {
        self.contains(id.flag())
    }

    /// Catalog modifiers in the set, in catalog order
    pub fn ids(self) -> impl Iterator<Item = ModifierId> {
        ModifierId::all().into_iter().filter(move |id| self.has(*id))
    }

    /// Bits naming no catalog modifier
    pub const fn unknown_bits(self) -> u32 {
        self.bits() & !Self::all().bits()
    }
}
