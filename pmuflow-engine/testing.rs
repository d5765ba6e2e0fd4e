//! Fixture descriptors and simulated hosts shared by the unit tests

use pmuflow_raw::FieldSpec;

use crate::common::HostIdentity;
use crate::events::{Event, Modifier, ModifierId, ModifierSet, Umask};
use crate::pmu::{Detector, EncodingLayout, PmuDescriptor, PmuFlags, PmuId, RevisionFilter};

pub const TEST_VENDOR: &str = "TestVendor";
pub const TEST_FAMILY: u32 = 0x42;

/// Simulated host whose model number is its revision
pub fn host(revision: u32) -> HostIdentity {
    HostIdentity::new(TEST_VENDOR, TEST_FAMILY, revision, 0)
}

fn test_family(host: &HostIdentity) -> Option<u32> {
    (host.vendor == TEST_VENDOR && host.family == TEST_FAMILY).then_some(host.model)
}

const CODE: &[FieldSpec] = &[FieldSpec::primary(0, 8)];

const LAYOUT: EncodingLayout = EncodingLayout {
    code: CODE,
    umask: FieldSpec::primary(8, 8),
    fixed_bits: (1 << 22) | (1 << 20),
    max_encoding: 1,
};

static MODIFIERS: [Modifier; 7] = [
    Modifier::generic(ModifierId::User).cleared_at(FieldSpec::bit(16)),
    Modifier::generic(ModifierId::Kernel).cleared_at(FieldSpec::bit(17)),
    Modifier::generic(ModifierId::Edge).at(FieldSpec::bit(18)),
    Modifier::generic(ModifierId::Invert).at(FieldSpec::bit(23)),
    Modifier::generic(ModifierId::CounterMask).at(FieldSpec::primary(24, 8)),
    Modifier::generic(ModifierId::Pinned),
    Modifier::generic(ModifierId::Precise),
];

const COUNTING: ModifierSet = ModifierSet::of(&[
    ModifierId::User,
    ModifierId::Kernel,
    ModifierId::Edge,
    ModifierId::Invert,
    ModifierId::CounterMask,
]);

static ACCESS_UMASKS: [Umask; 4] = [
    Umask::new("READ", 0x1, "read accesses"),
    Umask::new("WRITE", 0x2, "write accesses"),
    Umask::new("PREFETCH", 0x4, "prefetch accesses"),
    Umask::new("ALL", 0x7, "all accesses").no_combo().as_default(),
];

static MISS_UMASKS: [Umask; 4] = [
    Umask::new("L1", 0x1, "missed in L1").in_group(0).as_default(),
    Umask::new("L2", 0x2, "missed in L2").in_group(0),
    Umask::new("DATA", 0x10, "data side").in_group(1).as_default(),
    Umask::new("CODE", 0x20, "instruction side").in_group(1),
];

static RESTRICTED_UMASKS: [Umask; 2] = [
    Umask::new("OLD", 0x1, "present on every revision"),
    Umask::new("NEW", 0x2, "added in revision 2").since(2),
];

/// CYCLES, CACHE_ACCESSES, CACHE_MISSES, NEW_IN_REVC, RETIRED_OPS, RESTRICTED
static EVENTS: [Event; 6] = [
    Event::new("CYCLES", 0x76, "core clock cycles")
        .with_modifiers(COUNTING.with(ModifierId::Pinned)),
    Event::new("CACHE_ACCESSES", 0x40, "cache accesses")
        .with_umasks(&ACCESS_UMASKS)
        .with_modifiers(COUNTING),
    Event::new("CACHE_MISSES", 0x41, "cache misses")
        .with_umasks(&MISS_UMASKS)
        .with_modifiers(COUNTING),
    Event::new("NEW_IN_REVC", 0x50, "only on revision 2 and later")
        .with_modifiers(ModifierSet::of(&[ModifierId::User, ModifierId::Kernel]))
        .since(2),
    Event::new("RETIRED_OPS", 0xc0, "retired operations")
        .with_modifiers(COUNTING.with(ModifierId::Precise)),
    Event::new("RESTRICTED", 0x60, "umask set differs by revision")
        .with_umasks(&RESTRICTED_UMASKS)
        .with_modifiers(COUNTING),
];

fn descriptor(
    name: &'static str,
    id: u32,
    revision: RevisionFilter,
    events: &'static [Event],
) -> PmuDescriptor {
    PmuDescriptor::new(
        name,
        PmuId(id),
        "test PMU",
        Detector::new(test_family, revision),
        events,
        &MODIFIERS,
        LAYOUT,
    )
    .with_flags(PmuFlags::PREFIX_MATCH)
}

pub fn rev_b() -> PmuDescriptor {
    descriptor("test_revb", 1, RevisionFilter::Exact(1), &EVENTS)
}

pub fn rev_c() -> PmuDescriptor {
    descriptor("test_revc", 2, RevisionFilter::Exact(2), &EVENTS)
}

/// Family-wide descriptor accepting any revision
pub fn fallback() -> PmuDescriptor {
    descriptor("test_any", 3, RevisionFilter::Any, &EVENTS)
}

/// The revision-1 descriptor with a different event table
pub fn with_events(events: &'static [Event]) -> PmuDescriptor {
    descriptor("test_custom", 4, RevisionFilter::Exact(1), events)
}

/// Descriptor whose table fails validation
pub fn broken() -> PmuDescriptor {
    static BROKEN: [Event; 2] = [
        Event::new("TWICE", 0x10, "first"),
        Event::new("TWICE", 0x11, "second"),
    ];
    descriptor("test_broken", 9, RevisionFilter::Exact(1), &BROKEN)
}

/// PMU routing modifiers into two auxiliary registers but offering only one
pub fn aux_pmu() -> PmuDescriptor {
    static AUX_MODIFIERS: [Modifier; 4] = [
        Modifier::generic(ModifierId::User).cleared_at(FieldSpec::bit(16)),
        Modifier::generic(ModifierId::Kernel).cleared_at(FieldSpec::bit(17)),
        Modifier::generic(ModifierId::Edge).at(FieldSpec::auxiliary(0, 0, 1)),
        Modifier::generic(ModifierId::CounterMask).at(FieldSpec::auxiliary(1, 0, 8)),
    ];
    static AUX_EVENTS: [Event; 1] = [Event::new("FILTERED", 0x20, "event with extended filters")
        .with_modifiers(ModifierSet::of(&[
            ModifierId::User,
            ModifierId::Kernel,
            ModifierId::Edge,
            ModifierId::CounterMask,
        ]))];

    PmuDescriptor::new(
        "test_aux",
        PmuId(5),
        "test PMU with auxiliary registers",
        Detector::new(test_family, RevisionFilter::Exact(7)),
        &AUX_EVENTS,
        &AUX_MODIFIERS,
        EncodingLayout {
            max_encoding: 2,
            ..LAYOUT
        },
    )
}
