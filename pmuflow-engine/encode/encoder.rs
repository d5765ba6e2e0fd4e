use serde::Serialize;

use pmuflow_raw::{FieldSpec, MAX_REGISTERS};

use crate::encode::parser::{ParsedEvent, PMU_SEPARATOR, SEPARATOR};
use crate::error::{PmuError, Result};
use crate::events::{Event, EventIdx, ModifierId};
use crate::pmu::{PmuDescriptor, PmuId};

/// Qualifiers conveyed beside the register values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventFlags {
    pub exclude_user: bool,
    pub exclude_kernel: bool,
    pub exclude_host: bool,
    pub exclude_guest: bool,
    pub pinned: bool,
    pub precise: u8,
}

impl EventFlags {
    fn from_parsed(parsed: &ParsedEvent) -> Self {
        Self {
            exclude_user: parsed.has(ModifierId::User),
            exclude_kernel: parsed.has(ModifierId::Kernel),
            // guest-only excludes the host and vice versa
            exclude_host: parsed.has(ModifierId::Guest),
            exclude_guest: parsed.has(ModifierId::Host),
            pinned: parsed.has(ModifierId::Pinned),
            precise: parsed.value(ModifierId::Precise).unwrap_or(0) as u8,
        }
    }
}

/// Register values for one event, as a counting subsystem consumes them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedEvent {
    pub pmu: &'static str,
    pub pmu_id: PmuId,
    pub event: EventIdx,
    /// Full register images: primary select first, then auxiliary registers
    pub codes: Vec<u64>,
    /// Primary register without privilege/virtualization bits and fixed bits
    pub config: u64,
    /// First auxiliary register, 0 when unused
    pub config1: u64,
    pub flags: EventFlags,
    /// Canonical event string; parsing it yields this same encoding
    pub fstr: String,
}

fn place(regs: &mut [u64], field: FieldSpec, value: u64, token: &str) -> Result<()> {
    let index = field.target.index();
    let capacity = regs.len();
    let reg = regs.get_mut(index).ok_or_else(|| {
        PmuError::TooMany(format!(
            "{token} targets register {index}, only {capacity} exist"
        ))
    })?;
    *reg = field
        .insert(*reg, value)
        .map_err(|e| PmuError::from_field(token, e))?;
    Ok(())
}

/// Pack a parsed request into register values
pub fn encode(pmu: &PmuDescriptor, parsed: &ParsedEvent) -> Result<EncodedEvent> {
    if parsed.pmu != pmu.id {
        return Err(PmuError::invalid(
            pmu.name,
            format!("request was parsed for PMU {}", parsed.pmu),
        ));
    }
    let event = pmu
        .event(parsed.event)
        .ok_or_else(|| PmuError::not_found("event", format!("#{}", parsed.event.0)))?;

    let mut regs = [0u64; MAX_REGISTERS];
    regs[0] = pmu.layout.fixed_bits;

    pmu.layout
        .code_field()
        .insert(&mut regs, event.code)
        .map_err(|e| PmuError::from_field(event.name, e))?;
    place(&mut regs, pmu.layout.umask, parsed.umask_bits, event.name)?;

    for modifier in pmu.modifiers {
        let Some(field) = modifier.field else {
            continue;
        };
        let value = if event.modifiers.has(modifier.id) {
            parsed.value(modifier.id)
        } else {
            None
        };
        place(&mut regs, field, modifier.field_value(value), modifier.name())?;
    }

    let fstr = canonical(pmu, event, parsed);

    let used = regs.iter().rposition(|&r| r != 0).map_or(1, |i| i + 1);
    if used > pmu.layout.max_encoding {
        return Err(PmuError::TooMany(format!(
            "{fstr} needs {used} registers, {} provides {}",
            pmu.name, pmu.layout.max_encoding
        )));
    }

    let codes = regs[..used].to_vec();
    let encoded = EncodedEvent {
        pmu: pmu.name,
        pmu_id: pmu.id,
        event: parsed.event,
        config: codes[0] & pmu.config_mask(),
        config1: codes.get(1).copied().unwrap_or(0),
        codes,
        flags: EventFlags::from_parsed(parsed),
        fstr,
    };

    tracing::debug!("{} -> {:#x?}", encoded.fstr, encoded.codes);
    Ok(encoded)
}

/// `pmu::EVENT:UMASK...:modifier[=value]...`
///
/// Unit masks follow table order and modifiers the descriptor's order.
/// Integer modifiers at zero are the same as absent and are omitted.
fn canonical(pmu: &PmuDescriptor, event: &Event, parsed: &ParsedEvent) -> String {
    let mut out = format!("{}{}{}", pmu.name, PMU_SEPARATOR, event.name);

    for &u in &parsed.umasks {
        out.push(SEPARATOR);
        out.push_str(event.umasks[u].name);
    }

    for modifier in pmu.event_modifiers(event) {
        match parsed.value(modifier.id) {
            Some(_) if modifier.is_bool() => {
                out.push(SEPARATOR);
                out.push_str(modifier.name());
            }
            Some(v) if v != 0 => {
                out.push(SEPARATOR);
                out.push_str(&format!("{}={}", modifier.name(), v));
            }
            _ => {}
        }
    }
    out
}
