//! Event string grammar: `[pmu::]EVENT(:token[=value])*`
//!
//! Tokens are resolved strictly left to right against the active
//! descriptor. A token naming a unit mask available on the descriptor's
//! revision is a unit mask; otherwise it must name a modifier legal on the
//! event. The first error wins and nothing partial is returned.

use std::collections::BTreeMap;

use crate::error::{PmuError, Result};
use crate::events::{Event, EventIdx, Modifier, ModifierId, ValueDomain};
use crate::pmu::{PmuDescriptor, PmuFlags, PmuId};

/// Separates the PMU qualifier from the event
pub const PMU_SEPARATOR: &str = "::";
/// Separates the event from its unit masks and modifiers
pub const SEPARATOR: char = ':';

/// A fully resolved event request, ready for the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub pmu: PmuId,
    pub event: EventIdx,
    /// Selected unit masks, table positions in table order
    pub umasks: Vec<usize>,
    /// OR of the selected unit mask values
    pub umask_bits: u64,
    /// Modifiers given in the string; booleans are stored as 1
    pub values: BTreeMap<ModifierId, u64>,
}

impl ParsedEvent {
    pub fn has(&self, id: ModifierId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn value(&self, id: ModifierId) -> Option<u64> {
        self.values.get(&id).copied()
    }
}

/// Parse `input` against `pmu`
pub fn parse(pmu: &PmuDescriptor, input: &str) -> Result<ParsedEvent> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PmuError::invalid(input, "empty event string"));
    }

    let rest = match input.split_once(PMU_SEPARATOR) {
        Some((qualifier, rest)) => {
            if !qualifier.eq_ignore_ascii_case(pmu.name) {
                return Err(PmuError::not_found("pmu", qualifier));
            }
            rest
        }
        None => input,
    };

    let mut tokens = rest.split(SEPARATOR);
    let name = tokens.next().unwrap_or_default();
    if name.is_empty() {
        return Err(PmuError::invalid(input, "missing event name"));
    }

    let idx = pmu.resolve_event(name)?;
    let event = pmu
        .event(idx)
        .ok_or_else(|| PmuError::not_found("event", name))?;
    let revision = pmu.revision();

    let mut umasks: Vec<usize> = Vec::new();
    let mut values = BTreeMap::new();

    for token in tokens {
        if token.is_empty() {
            return Err(PmuError::invalid(input, "empty modifier"));
        }

        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (token, None),
        };
        if key.is_empty() {
            return Err(PmuError::invalid(token, "missing modifier name"));
        }

        if let Some(u) = event.find_umask(key, revision) {
            if value.is_some() {
                return Err(PmuError::invalid(token, "unit masks take no value"));
            }
            select_umask(event, &mut umasks, u)?;
            continue;
        }

        let modifier = legal_modifier(pmu, event, key)?;
        let resolved = modifier_value(modifier, key, value)?;
        check_conflict(&values, modifier.id, key)?;
        if values.insert(modifier.id, resolved).is_some() {
            return Err(PmuError::invalid(key, "modifier given more than once"));
        }
    }

    apply_defaults(event, revision, &mut umasks);
    umasks.sort_unstable();

    if pmu.flags.contains(PmuFlags::UMASK_REQUIRED)
        && umasks.is_empty()
        && event.available_umasks(revision).next().is_some()
    {
        return Err(PmuError::invalid(event.name, "a unit mask is required"));
    }

    check_counter_mask(&values)?;

    let umask_bits = umasks
        .iter()
        .fold(0u64, |acc, &u| acc | event.umasks[u].value);

    tracing::debug!(
        "{}: parsed {} as {} umasks=0x{:x} modifiers={:?}",
        pmu.name,
        input,
        event.name,
        umask_bits,
        values
    );

    Ok(ParsedEvent {
        pmu: pmu.id,
        event: idx,
        umasks,
        umask_bits,
        values,
    })
}

fn select_umask(event: &Event, selected: &mut Vec<usize>, idx: usize) -> Result<()> {
    if selected.contains(&idx) {
        return Ok(());
    }

    let umask = &event.umasks[idx];
    if let Some(&other) = selected.iter().find(|&&s| event.umasks[s].excludes(umask)) {
        return Err(PmuError::invalid(
            umask.name,
            format!("cannot be combined with {}", event.umasks[other].name),
        ));
    }

    selected.push(idx);
    Ok(())
}

/// Give every untouched umask group its defaults
///
/// Ungrouped umasks form one group of their own.
fn apply_defaults(event: &Event, revision: Option<u32>, selected: &mut Vec<usize>) {
    let given: Vec<Option<u16>> = selected.iter().map(|&s| event.umasks[s].group).collect();

    for (i, umask) in event.available_umasks(revision) {
        if !umask.is_default() || given.contains(&umask.group) {
            continue;
        }
        if selected.iter().any(|&s| event.umasks[s].excludes(umask)) {
            continue;
        }
        selected.push(i);
    }
}

fn legal_modifier<'a>(pmu: &'a PmuDescriptor, event: &Event, key: &str) -> Result<&'a Modifier> {
    pmu.modifier_named(&key.to_ascii_lowercase())
        .filter(|m| event.modifiers.has(m.id))
        .ok_or_else(|| PmuError::not_found("modifier", key))
}

fn modifier_value(modifier: &Modifier, key: &str, value: Option<&str>) -> Result<u64> {
    match (modifier.domain, value) {
        (ValueDomain::Bool, None) => Ok(1),
        (ValueDomain::Bool, Some(_)) => Err(PmuError::invalid(key, "boolean modifier takes no value")),
        (ValueDomain::Int { .. }, None) => Err(PmuError::invalid(key, "modifier requires a value")),
        (ValueDomain::Int { min, max }, Some(raw)) => {
            let v = parse_number(raw)
                .ok_or_else(|| PmuError::invalid(raw, format!("{key} expects an integer")))?;
            if v < min || v > max {
                return Err(PmuError::invalid(
                    raw,
                    format!("{key} must lie in [{min}, {max}]"),
                ));
            }
            Ok(v)
        }
    }
}

/// Decimal or `0x`-prefixed hexadecimal
fn parse_number(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Modifiers that cannot be given together, checked as each token arrives
const CONFLICTS: [(ModifierId, ModifierId, &str); 2] = [
    (
        ModifierId::User,
        ModifierId::Kernel,
        "excluding both user and kernel leaves nothing to count",
    ),
    (
        ModifierId::Host,
        ModifierId::Guest,
        "host-only and guest-only are exclusive",
    ),
];

fn check_conflict(values: &BTreeMap<ModifierId, u64>, id: ModifierId, key: &str) -> Result<()> {
    for (a, b, reason) in CONFLICTS {
        let other = if id == a {
            b
        } else if id == b {
            a
        } else {
            continue;
        };
        if values.contains_key(&other) {
            return Err(PmuError::invalid(
                key,
                format!("cannot be combined with {}: {reason}", other.name()),
            ));
        }
    }
    Ok(())
}

/// `i` depends on a `c` that may come later in the string
fn check_counter_mask(values: &BTreeMap<ModifierId, u64>) -> Result<()> {
    let cmask = values.get(&ModifierId::CounterMask).copied().unwrap_or(0);
    if values.contains_key(&ModifierId::Invert) && cmask == 0 {
        return Err(PmuError::invalid("i", "invert requires a non-zero counter mask"));
    }
    Ok(())
}
