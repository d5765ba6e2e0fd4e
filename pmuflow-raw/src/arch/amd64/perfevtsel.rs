//! AMD64 performance event select register (PERFEVTSELx)
//!
//! ## References
//!
//! - BIOS and Kernel Developer's Guide for AMD Athlon 64 and AMD Opteron
//!   Processors (K8), section 10.2
//! - BIOS and Kernel Developer's Guide for AMD Family 10h Processors

use crate::register::{FieldSpec, RegisterLayout};

/// Number of general-purpose counters per core on K8 and Family 10h
pub const PERF_COUNTERS: usize = 4;

/// Field positions inside PERFEVTSELx
pub mod fields {
    use crate::register::FieldSpec;

    /// Event select bits 7:0
    pub const EVENT_SELECT_LO: FieldSpec = FieldSpec::primary(0, 8);
    /// Event select bits 11:8 (Family 10h and later)
    pub const EVENT_SELECT_HI: FieldSpec = FieldSpec::primary(32, 4);
    pub const UNIT_MASK: FieldSpec = FieldSpec::primary(8, 8);
    pub const USR: FieldSpec = FieldSpec::bit(16);
    pub const OS: FieldSpec = FieldSpec::bit(17);
    pub const EDGE: FieldSpec = FieldSpec::bit(18);
    pub const INT: FieldSpec = FieldSpec::bit(20);
    pub const ENABLE: FieldSpec = FieldSpec::bit(22);
    pub const INVERT: FieldSpec = FieldSpec::bit(23);
    pub const COUNTER_MASK: FieldSpec = FieldSpec::primary(24, 8);
    pub const GUEST_ONLY: FieldSpec = FieldSpec::bit(40);
    pub const HOST_ONLY: FieldSpec = FieldSpec::bit(41);

    /// K8 only has the low 8 event select bits
    pub const K8_EVENT_SELECT: &[FieldSpec] = &[EVENT_SELECT_LO];
    pub const FAM10H_EVENT_SELECT: &[FieldSpec] = &[EVENT_SELECT_LO, EVENT_SELECT_HI];
}

/// Performance Event Select Register layout
///
/// ## Register Format
///
/// | Bits   | Field        | Description                    |
/// |--------|--------------|--------------------------------|
/// | 0-7    | event_select | Event select [7:0]             |
/// | 8-15   | unit_mask    | Unit mask                      |
/// | 16     | usr          | Count in user mode             |
/// | 17     | os           | Count in OS mode               |
/// | 18     | edge         | Edge detect                    |
/// | 20     | int          | APIC interrupt enable          |
/// | 22     | enable       | Enable counter                 |
/// | 23     | invert       | Invert counter mask            |
/// | 24-31  | counter_mask | Counter mask                   |
/// | 32-35  | event_select | Event select [11:8]            |
/// | 40     | guest_only   | Count only in guest mode       |
/// | 41     | host_only    | Count only in host mode        |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerfEvtSel {
    /// Event select, 12 bits split across the register
    pub event_select: u16,
    pub unit_mask: u8,
    pub usr: bool,
    pub os: bool,
    pub edge: bool,
    pub int: bool,
    pub enable: bool,
    pub invert: bool,
    pub counter_mask: u8,
    pub guest_only: bool,
    pub host_only: bool,
}

impl RegisterLayout for PerfEvtSel {
    fn to_raw(&self) -> u64 {
        ((self.event_select as u64) & 0xFF)
            | ((self.unit_mask as u64) << 8)
            | (if self.usr { 1 << 16 } else { 0 })
            | (if self.os { 1 << 17 } else { 0 })
            | (if self.edge { 1 << 18 } else { 0 })
            | (if self.int { 1 << 20 } else { 0 })
            | (if self.enable { 1 << 22 } else { 0 })
            | (if self.invert { 1 << 23 } else { 0 })
            | ((self.counter_mask as u64) << 24)
            | ((((self.event_select as u64) >> 8) & 0xF) << 32)
            | (if self.guest_only { 1 << 40 } else { 0 })
            | (if self.host_only { 1 << 41 } else { 0 })
    }

    fn from_raw(value: u64) -> Self {
        let bit = |f: FieldSpec| f.extract(value) != 0;
        Self {
            event_select: (fields::EVENT_SELECT_LO.extract(value)
                | (fields::EVENT_SELECT_HI.extract(value) << 8)) as u16,
            unit_mask: fields::UNIT_MASK.extract(value) as u8,
            usr: bit(fields::USR),
            os: bit(fields::OS),
            edge: bit(fields::EDGE),
            int: bit(fields::INT),
            enable: bit(fields::ENABLE),
            invert: bit(fields::INVERT),
            counter_mask: fields::COUNTER_MASK.extract(value) as u8,
            guest_only: bit(fields::GUEST_ONLY),
            host_only: bit(fields::HOST_ONLY),
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.event_select > 0xFFF {
            return Err("event select wider than 12 bits");
        }
        if self.guest_only && self.host_only {
            return Err("guest-only and host-only are mutually exclusive");
        }
        if self.invert && self.counter_mask == 0 {
            return Err("invert requires a non-zero counter mask");
        }
        Ok(())
    }
}
