//! AMD Family 10h event table (Barcelona, Shanghai, Istanbul)
//!
//! Family 10h widens the event select to 12 bits; codes above 0xff land
//! in PERFEVTSEL bits 32-35.

use crate::events::{Event, ModifierId, ModifierSet, Umask};

use super::Revision;

const MODS: ModifierSet = ModifierSet::of(&[
    ModifierId::User,
    ModifierId::Kernel,
    ModifierId::Edge,
    ModifierId::Invert,
    ModifierId::CounterMask,
    ModifierId::Host,
    ModifierId::Guest,
    ModifierId::Pinned,
]);

/// Retirement events support precise sampling
const PRECISE_MODS: ModifierSet = MODS.with(ModifierId::Precise);

static DISPATCHED_FPU: [Umask; 7] = [
    Umask::new("OPS_ADD", 0x1, "Add pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_MULTIPLY", 0x2, "Multiply pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_STORE", 0x4, "Store pipe ops excluding load ops and SSE move ops"),
    Umask::new("OPS_ADD_PIPE_LOAD_OPS", 0x8, "Add pipe load ops and SSE move ops"),
    Umask::new("OPS_MULTIPLY_PIPE_LOAD_OPS", 0x10, "Multiply pipe load ops and SSE move ops"),
    Umask::new("OPS_STORE_PIPE_LOAD_OPS", 0x20, "Store pipe load ops and SSE move ops"),
    Umask::new("ALL", 0x3f, "All sub-events selected").no_combo().as_default(),
];

static LOCKED_OPS: [Umask; 4] = [
    Umask::new("EXECUTED", 0x1, "Number of locked instructions executed"),
    Umask::new("CYCLES_SPECULATIVE_PHASE", 0x2, "Cycles in speculative phase"),
    Umask::new("CYCLES_NON_SPECULATIVE_PHASE", 0x4, "Cycles in non-speculative phase (including cache miss penalty)"),
    Umask::new("CYCLES_WAITING", 0x8, "Cycles waiting for a lock to be granted")
        .since(Revision::Fam10hRevC.id()),
];

static REQUESTS_TO_L2: [Umask; 7] = [
    Umask::new("INSTRUCTIONS", 0x1, "IC fill"),
    Umask::new("DATA", 0x2, "DC fill"),
    Umask::new("TLB_WALK", 0x4, "TLB fill (page table walks)"),
    Umask::new("SNOOP", 0x8, "Tag snoop request"),
    Umask::new("CANCELLED", 0x10, "Cancelled request"),
    Umask::new("HW_PREFETCH_FROM_DC", 0x20, "Hardware prefetch from DC"),
    Umask::new("ALL", 0x3f, "All sub-events selected").no_combo().as_default(),
];

static L2_CACHE_MISS: [Umask; 5] = [
    Umask::new("INSTRUCTIONS", 0x1, "IC fill"),
    Umask::new("DATA", 0x2, "DC fill (includes possible replays)"),
    Umask::new("TLB_WALK", 0x4, "TLB page table walk"),
    Umask::new("HW_PREFETCH_FROM_DC", 0x8, "Hardware prefetch from DC"),
    Umask::new("ALL", 0xf, "All sub-events selected").no_combo().as_default(),
];

static DRAM_ACCESSES: [Umask; 7] = [
    Umask::new("DCT0_PAGE_HIT", 0x1, "DCT0 Page hit"),
    Umask::new("DCT0_PAGE_MISS", 0x2, "DCT0 Page Miss"),
    Umask::new("DCT0_PAGE_CONFLICT", 0x4, "DCT0 Page Conflict"),
    Umask::new("DCT1_PAGE_HIT", 0x8, "DCT1 Page hit"),
    Umask::new("DCT1_PAGE_MISS", 0x10, "DCT1 Page Miss"),
    Umask::new("DCT1_PAGE_CONFLICT", 0x20, "DCT1 Page Conflict"),
    Umask::new("ALL", 0x3f, "All sub-events selected").no_combo().as_default(),
];

static MEMORY_CONTROLLER_REQUESTS: [Umask; 4] = [
    Umask::new("WRITE_REQUESTS", 0x1, "Write requests sent to the DCT"),
    Umask::new("READ_REQUESTS", 0x2, "Read requests (including prefetch requests) sent to the DCT"),
    Umask::new("PREFETCH_REQUESTS", 0x4, "Prefetch requests sent to the DCT"),
    Umask::new("ALL", 0x7, "All sub-events selected").no_combo().as_default(),
];

// Group 0 selects the request type, group 1 the requesting core
static L3_CACHE_MISSES: [Umask; 9] = [
    Umask::new("READ_BLOCK_EXCLUSIVE", 0x1, "Read Block Exclusive (Data cache read)").in_group(0),
    Umask::new("READ_BLOCK_SHARED", 0x2, "Read Block Shared (Instruction cache read)").in_group(0),
    Umask::new("READ_BLOCK_MODIFY", 0x4, "Read Block Modify").in_group(0),
    Umask::new("ANY_READ", 0x7, "Any read request").in_group(0).as_default(),
    Umask::new("CORE_0", 0x10, "Core 0 Select").in_group(1),
    Umask::new("CORE_1", 0x20, "Core 1 Select").in_group(1),
    Umask::new("CORE_2", 0x40, "Core 2 Select").in_group(1),
    Umask::new("CORE_3", 0x80, "Core 3 Select").in_group(1),
    Umask::new("ALL_CORES", 0xf0, "All cores").in_group(1).as_default(),
];

static L3_EVICTIONS: [Umask; 5] = [
    Umask::new("SHARED", 0x1, "Shared"),
    Umask::new("EXCLUSIVE", 0x2, "Exclusive"),
    Umask::new("OWNED", 0x4, "Owned"),
    Umask::new("MODIFIED", 0x8, "Modified"),
    Umask::new("ALL", 0xf, "All sub-events selected").no_combo().as_default(),
];

static NON_CANCELLED_L3_READ_REQUESTS: [Umask; 9] = [
    Umask::new("READ_BLOCK_EXCLUSIVE", 0x1, "RdBlk Exclusive").in_group(0),
    Umask::new("READ_BLOCK_SHARED", 0x2, "RdBlkS Shared").in_group(0),
    Umask::new("READ_BLOCK_MODIFY", 0x4, "RdBlkM Modify").in_group(0),
    Umask::new("ANY_READ", 0x7, "Any non-cancelled read").in_group(0).as_default(),
    Umask::new("CORE_0", 0x10, "Requests from core 0").in_group(1),
    Umask::new("CORE_1", 0x20, "Requests from core 1").in_group(1),
    Umask::new("CORE_2", 0x40, "Requests from core 2").in_group(1),
    Umask::new("CORE_3", 0x80, "Requests from core 3").in_group(1),
    Umask::new("ALL_CORES", 0xf0, "Requests from any core").in_group(1).as_default(),
];

pub static EVENTS: [Event; 20] = [
    Event::new("DISPATCHED_FPU", 0x00, "Dispatched FPU Operations")
        .with_umasks(&DISPATCHED_FPU)
        .with_modifiers(MODS),
    Event::new("CYCLES_NO_FPU_OPS_RETIRED", 0x01, "Cycles in which the FPU is Empty")
        .with_modifiers(MODS),
    Event::new("LOCKED_OPS", 0x24, "Locked Operations")
        .with_umasks(&LOCKED_OPS)
        .with_modifiers(MODS),
    Event::new("DATA_CACHE_ACCESSES", 0x40, "Data Cache Accesses").with_modifiers(MODS),
    Event::new("DATA_CACHE_MISSES", 0x41, "Data Cache Misses").with_modifiers(MODS),
    Event::new("MISALIGNED_ACCESSES", 0x47, "Misaligned Accesses").with_modifiers(MODS),
    Event::new("CPU_CLK_UNHALTED", 0x76, "CPU Clocks not Halted").with_modifiers(MODS),
    Event::new("REQUESTS_TO_L2", 0x7d, "Requests to L2 Cache")
        .with_umasks(&REQUESTS_TO_L2)
        .with_modifiers(MODS),
    Event::new("L2_CACHE_MISS", 0x7e, "L2 Cache Misses")
        .with_umasks(&L2_CACHE_MISS)
        .with_modifiers(MODS),
    Event::new("INSTRUCTION_CACHE_FETCHES", 0x80, "Instruction Cache Fetches")
        .with_modifiers(MODS),
    Event::new("INSTRUCTION_CACHE_MISSES", 0x81, "Instruction Cache Misses")
        .with_modifiers(MODS),
    Event::new("RETIRED_INSTRUCTIONS", 0xc0, "Retired Instructions")
        .with_modifiers(PRECISE_MODS),
    Event::new("RETIRED_UOPS", 0xc1, "Retired uops").with_modifiers(PRECISE_MODS),
    Event::new("RETIRED_BRANCH_INSTRUCTIONS", 0xc2, "Retired Branch Instructions")
        .with_modifiers(MODS),
    Event::new(
        "RETIRED_MISPREDICTED_BRANCH_INSTRUCTIONS",
        0xc3,
        "Retired Mispredicted Branch Instructions",
    )
    .with_modifiers(MODS),
    Event::new("DRAM_ACCESSES", 0xe0, "DRAM Accesses")
        .with_umasks(&DRAM_ACCESSES)
        .with_modifiers(MODS),
    Event::new("MEMORY_CONTROLLER_REQUESTS", 0x1f0, "Memory Controller Requests")
        .with_umasks(&MEMORY_CONTROLLER_REQUESTS)
        .with_modifiers(MODS),
    Event::new("L3_CACHE_MISSES", 0x4e1, "L3 Cache Misses")
        .with_umasks(&L3_CACHE_MISSES)
        .with_modifiers(MODS),
    Event::new("L3_EVICTIONS", 0x4e2, "L3 Evictions")
        .with_umasks(&L3_EVICTIONS)
        .with_modifiers(MODS),
    Event::new(
        "NON_CANCELLED_L3_READ_REQUESTS",
        0x4ed,
        "Non-cancelled L3 Read Requests",
    )
    .with_umasks(&NON_CANCELLED_L3_READ_REQUESTS)
    .with_modifiers(MODS)
    .since(Revision::Fam10hRevC.id()),
];
