//! AMD64 K8 event table, shared by every K8 silicon revision
//!
//! Events and unit masks that only exist on later steppings carry a
//! `since` bound; the active descriptor's revision hides the rest.

use crate::events::{Event, ModifierId, ModifierSet, Umask};

use super::Revision;

const MODS: ModifierSet = ModifierSet::of(&[
    ModifierId::User,
    ModifierId::Kernel,
    ModifierId::Edge,
    ModifierId::Invert,
    ModifierId::CounterMask,
    ModifierId::Pinned,
]);

static DISPATCHED_FPU: [Umask; 7] = [
    Umask::new("OPS_ADD", 0x1, "Add pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_MULTIPLY", 0x2, "Multiply pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_STORE", 0x4, "Store pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_ADD_PIPE_LOAD_OPS", 0x8, "Add pipe load ops and SSE move ops"),
    Umask::new("OPS_MULTIPLY_PIPE_LOAD_OPS", 0x10, "Multiply pipe load ops and SSE move ops"),
    Umask::new("OPS_STORE_PIPE_LOAD_OPS", 0x20, "Store pipe load ops and SSE move ops"),
    Umask::new("ALL", 0x3f, "All sub-events selected").no_combo().as_default(),
];

static SEGMENT_REGISTER_LOADS: [Umask; 8] = [
    Umask::new("ES", 0x1, "ES segment register"),
    Umask::new("CS", 0x2, "CS segment register"),
    Umask::new("SS", 0x4, "SS segment register"),
    Umask::new("DS", 0x8, "DS segment register"),
    Umask::new("FS", 0x10, "FS segment register"),
    Umask::new("GS", 0x20, "GS segment register"),
    Umask::new("HS", 0x40, "HS segment register"),
    Umask::new("ALL", 0x7f, "All segment registers").no_combo().as_default(),
];

static LOCKED_OPS: [Umask; 4] = [
    Umask::new("EXECUTED", 0x1, "The number of locked instructions executed")
        .since(Revision::K8RevC.id()),
    Umask::new(
        "CYCLES_SPECULATIVE_PHASE",
        0x2,
        "The number of cycles spent in speculative phase",
    )
    .since(Revision::K8RevC.id()),
    Umask::new(
        "CYCLES_NON_SPECULATIVE_PHASE",
        0x4,
        "The number of cycles spent in non-speculative phase (including cache miss penalty)",
    )
    .since(Revision::K8RevC.id()),
    Umask::new("ALL", 0x7, "All sub-events selected")
        .no_combo()
        .as_default()
        .since(Revision::K8RevC.id()),
];

static MEMORY_REQUESTS: [Umask; 4] = [
    Umask::new("NON_CACHEABLE", 0x1, "Requests to non-cacheable (UC) memory"),
    Umask::new("WRITE_COMBINING", 0x2, "Requests to write-combining (WC) memory or WC buffer flushes to WB memory"),
    Umask::new("STREAMING_STORE", 0x80, "Streaming store (SS) requests")
        .since(Revision::K8RevF.id()),
    Umask::new("ALL", 0x83, "All sub-events selected").no_combo().as_default(),
];

static DATA_CACHE_REFILLS: [Umask; 6] = [
    Umask::new("SYSTEM", 0x1, "Refill from system"),
    Umask::new("L2_SHARED", 0x2, "Shared-state line from L2"),
    Umask::new("L2_EXCLUSIVE", 0x4, "Exclusive-state line from L2"),
    Umask::new("L2_OWNED", 0x8, "Owned-state line from L2"),
    Umask::new("L2_MODIFIED", 0x10, "Modified-state line from L2"),
    Umask::new("ALL", 0x1f, "All sub-events selected").no_combo().as_default(),
];

static DATA_CACHE_REFILLS_FROM_SYSTEM: [Umask; 6] = [
    Umask::new("INVALID", 0x1, "Invalid"),
    Umask::new("SHARED", 0x2, "Shared"),
    Umask::new("EXCLUSIVE", 0x4, "Exclusive"),
    Umask::new("OWNED", 0x8, "Owned"),
    Umask::new("MODIFIED", 0x10, "Modified"),
    Umask::new("ALL", 0x1f, "All sub-events selected").no_combo().as_default(),
];

static DATA_CACHE_LINES_EVICTED: [Umask; 6] = [
    Umask::new("INVALID", 0x1, "Invalid"),
    Umask::new("SHARED", 0x2, "Shared"),
    Umask::new("EXCLUSIVE", 0x4, "Exclusive"),
    Umask::new("OWNED", 0x8, "Owned"),
    Umask::new("MODIFIED", 0x10, "Modified"),
    Umask::new("ALL", 0x1f, "All sub-events selected").no_combo().as_default(),
];

static PREFETCH_INSTRUCTIONS_DISPATCHED: [Umask; 4] = [
    Umask::new("LOAD", 0x1, "Load (Prefetch, PrefetchT0/T1/T2)"),
    Umask::new("STORE", 0x2, "Store (PrefetchW)"),
    Umask::new("NTA", 0x4, "NTA (PrefetchNTA)"),
    Umask::new("ALL", 0x7, "All sub-events selected").no_combo().as_default(),
];

static DRAM_ACCESSES: [Umask; 4] = [
    Umask::new("PAGE_HIT", 0x1, "Page hit"),
    Umask::new("PAGE_MISS", 0x2, "Page miss"),
    Umask::new("PAGE_CONFLICT", 0x4, "Page conflict"),
    Umask::new("ALL", 0x7, "All sub-events selected").no_combo().as_default(),
];

static CPU_IO_REQUESTS_TO_MEMORY_IO: [Umask; 5] = [
    Umask::new("I_O_TO_I_O", 0xa1, "From local I/O to local I/O")
        .in_group(0)
        .since(Revision::K8RevE.id()),
    Umask::new("I_O_TO_MEM", 0xa2, "From local I/O to local memory")
        .in_group(0)
        .since(Revision::K8RevE.id()),
    Umask::new("CPU_TO_I_O", 0xa4, "From local CPU to local I/O")
        .in_group(0)
        .since(Revision::K8RevE.id()),
    Umask::new("CPU_TO_MEM", 0xa8, "From local CPU to local memory")
        .in_group(0)
        .since(Revision::K8RevE.id()),
    Umask::new("ALL", 0xaf, "All local requests")
        .no_combo()
        .as_default()
        .since(Revision::K8RevE.id()),
];

static HYPERTRANSPORT_LINK0: [Umask; 5] = [
    Umask::new("COMMAND_DWORD_SENT", 0x1, "Command DWORD sent"),
    Umask::new("DATA_DWORD_SENT", 0x2, "Data DWORD sent"),
    Umask::new("BUFFER_RELEASE_DWORD_SENT", 0x4, "Buffer release DWORD sent"),
    Umask::new("NOP_DWORD_SENT", 0x8, "Nop DW sent (idle)"),
    Umask::new("ALL", 0xf, "All sub-events selected").no_combo().as_default(),
];

pub static EVENTS: [Event; 29] = [
    Event::new("DISPATCHED_FPU", 0x00, "Dispatched FPU Operations")
        .with_umasks(&DISPATCHED_FPU)
        .with_modifiers(MODS),
    Event::new(
        "CYCLES_NO_FPU_OPS_RETIRED",
        0x01,
        "Cycles in which the FPU is Empty",
    )
    .with_modifiers(MODS),
    Event::new(
        "DISPATCHED_FPU_OPS_FAST_FLAG",
        0x02,
        "Dispatched Fast Flag FPU Operations",
    )
    .with_modifiers(MODS),
    Event::new("SEGMENT_REGISTER_LOADS", 0x20, "Segment Register Loads")
        .with_umasks(&SEGMENT_REGISTER_LOADS)
        .with_modifiers(MODS),
    Event::new(
        "PIPELINE_RESTART_DUE_TO_SELF_MODIFYING_CODE",
        0x21,
        "Pipeline restarts due to self-modifying code",
    )
    .with_modifiers(MODS),
    Event::new(
        "PIPELINE_RESTART_DUE_TO_PROBE_HIT",
        0x22,
        "Pipeline restarts due to probe hit",
    )
    .with_modifiers(MODS),
    Event::new("LS_BUFFER_2_FULL_CYCLES", 0x23, "LS Buffer 2 Full")
        .with_modifiers(MODS),
    Event::new("LOCKED_OPS", 0x24, "Locked Operations")
        .with_umasks(&LOCKED_OPS)
        .with_modifiers(MODS),
    Event::new("MEMORY_REQUESTS", 0x65, "Memory Requests by Type")
        .with_umasks(&MEMORY_REQUESTS)
        .with_modifiers(MODS),
    Event::new("DATA_CACHE_ACCESSES", 0x40, "Data Cache Accesses").with_modifiers(MODS),
    Event::new("DATA_CACHE_MISSES", 0x41, "Data Cache Misses").with_modifiers(MODS),
    Event::new(
        "DATA_CACHE_REFILLS",
        0x42,
        "Data Cache Refills from L2 or System",
    )
    .with_umasks(&DATA_CACHE_REFILLS)
    .with_modifiers(MODS),
    Event::new(
        "DATA_CACHE_REFILLS_FROM_SYSTEM",
        0x43,
        "Data Cache Refills from System",
    )
    .with_umasks(&DATA_CACHE_REFILLS_FROM_SYSTEM)
    .with_modifiers(MODS),
    Event::new("DATA_CACHE_LINES_EVICTED", 0x44, "Data Cache Lines Evicted")
        .with_umasks(&DATA_CACHE_LINES_EVICTED)
        .with_modifiers(MODS),
    Event::new(
        "L1_DTLB_MISS_AND_L2_DTLB_HIT",
        0x45,
        "L1 DTLB Miss and L2 DTLB Hit",
    )
    .with_modifiers(MODS),
    Event::new(
        "L1_DTLB_AND_L2_DTLB_MISS",
        0x46,
        "L1 DTLB and L2 DTLB Miss",
    )
    .with_modifiers(MODS),
    Event::new("MISALIGNED_ACCESSES", 0x47, "Misaligned Accesses").with_modifiers(MODS),
    Event::new(
        "PREFETCH_INSTRUCTIONS_DISPATCHED",
        0x4b,
        "Prefetch Instructions Dispatched",
    )
    .with_umasks(&PREFETCH_INSTRUCTIONS_DISPATCHED)
    .with_modifiers(MODS),
    Event::new("CPU_CLK_UNHALTED", 0x76, "CPU Clocks not Halted").with_modifiers(MODS),
    Event::new(
        "INSTRUCTION_CACHE_FETCHES",
        0x80,
        "Instruction Cache Fetches",
    )
    .with_modifiers(MODS),
    Event::new("INSTRUCTION_CACHE_MISSES", 0x81, "Instruction Cache Misses")
        .with_modifiers(MODS),
    Event::new(
        "L1_ITLB_MISS_AND_L2_ITLB_HIT",
        0x84,
        "L1 ITLB Miss and L2 ITLB Hit",
    )
    .with_modifiers(MODS),
    Event::new(
        "L1_ITLB_MISS_AND_L2_ITLB_MISS",
        0x85,
        "L1 ITLB Miss and L2 ITLB Miss",
    )
    .with_modifiers(MODS),
    Event::new("RETIRED_INSTRUCTIONS", 0xc0, "Retired Instructions").with_modifiers(MODS),
    Event::new("RETIRED_UOPS", 0xc1, "Retired uops").with_modifiers(MODS),
    Event::new(
        "RETIRED_MISPREDICTED_BRANCH_INSTRUCTIONS",
        0xc3,
        "Retired Mispredicted Branch Instructions",
    )
    .with_modifiers(MODS),
    Event::new("DRAM_ACCESSES", 0xe0, "DRAM Accesses")
        .with_umasks(&DRAM_ACCESSES)
        .with_modifiers(MODS),
    Event::new(
        "CPU_IO_REQUESTS_TO_MEMORY_IO",
        0xe9,
        "CPU/IO Requests to Memory/IO",
    )
    .with_umasks(&CPU_IO_REQUESTS_TO_MEMORY_IO)
    .with_modifiers(MODS)
    .since(Revision::K8RevE.id()),
    Event::new(
        "HYPERTRANSPORT_LINK0_TRANSMIT_BANDWIDTH",
        0xf6,
        "HyperTransport Link 0 Transmit Bandwidth",
    )
    .with_umasks(&HYPERTRANSPORT_LINK0)
    .with_modifiers(MODS),
];
