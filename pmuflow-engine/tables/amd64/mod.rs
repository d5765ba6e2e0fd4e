//! AMD64 K8 and Family 10h descriptors
//!
//! Every K8 stepping gets its own descriptor over the shared K8 table, the
//! same for the named Family 10h parts. A revision-agnostic Family 10h
//! descriptor catches steppings without a dedicated one.

pub mod fam10h;
pub mod k8;

use pmuflow_raw::arch::amd64::fields;

use crate::common::HostIdentity;
use crate::events::{Modifier, ModifierId};
use crate::pmu::{Detector, EncodingLayout, PmuDescriptor, PmuFlags, PmuId, RevisionFilter};

pub const AMD_VENDOR: &str = "AuthenticAMD";

/// Silicon revision, numbered within one id space for both families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Revision {
    K8RevB = 1,
    K8RevC = 2,
    K8RevD = 3,
    K8RevE = 4,
    K8RevF = 5,
    K8RevG = 6,
    Fam10hRevB = 16,
    Fam10hRevC = 17,
    Fam10hRevD = 18,
    Fam10hRevE = 19,
}

impl Revision {
    pub const fn id(self) -> u32 {
        self as u32
    }

    pub fn is_k8(self) -> bool {
        self.id() < Revision::Fam10hRevB.id()
    }
}

/// Map a host to its AMD64 revision; `None` for other vendors and families
pub fn amd64_revision(host: &HostIdentity) -> Option<Revision> {
    if host.vendor != AMD_VENDOR {
        return None;
    }

    let (model, stepping) = (host.model, host.stepping);
    let revision = match host.family {
        15 => match model >> 4 {
            0 if (model == 5 && stepping < 2) || (model == 4 && stepping == 0) => Revision::K8RevB,
            0 => Revision::K8RevC,
            1 => Revision::K8RevD,
            2 | 3 => Revision::K8RevE,
            4 | 5 | 0xc => Revision::K8RevF,
            6 | 7 | 8 => Revision::K8RevG,
            _ => Revision::K8RevB,
        },
        16 => match model {
            4..=6 => Revision::Fam10hRevC,
            8 | 9 => Revision::Fam10hRevD,
            10 => Revision::Fam10hRevE,
            _ => Revision::Fam10hRevB,
        },
        _ => return None,
    };
    Some(revision)
}

fn k8_family(host: &HostIdentity) -> Option<u32> {
    amd64_revision(host)
        .filter(|r| r.is_k8())
        .map(Revision::id)
}

fn fam10h_family(host: &HostIdentity) -> Option<u32> {
    amd64_revision(host)
        .filter(|r| !r.is_k8())
        .map(Revision::id)
}

const FIXED_BITS: u64 = fields::ENABLE.mask() | fields::INT.mask();

const K8_LAYOUT: EncodingLayout = EncodingLayout {
    code: fields::K8_EVENT_SELECT,
    umask: fields::UNIT_MASK,
    fixed_bits: FIXED_BITS,
    max_encoding: 1,
};

const FAM10H_LAYOUT: EncodingLayout = EncodingLayout {
    code: fields::FAM10H_EVENT_SELECT,
    ..K8_LAYOUT
};

static K8_MODIFIERS: [Modifier; 6] = [
    Modifier::generic(ModifierId::User).cleared_at(fields::USR),
    Modifier::generic(ModifierId::Kernel).cleared_at(fields::OS),
    Modifier::generic(ModifierId::Edge).at(fields::EDGE),
    Modifier::generic(ModifierId::Invert).at(fields::INVERT),
    Modifier::generic(ModifierId::CounterMask).at(fields::COUNTER_MASK),
    Modifier::generic(ModifierId::Pinned),
];

static FAM10H_MODIFIERS: [Modifier; 9] = [
    Modifier::generic(ModifierId::User).cleared_at(fields::USR),
    Modifier::generic(ModifierId::Kernel).cleared_at(fields::OS),
    Modifier::generic(ModifierId::Edge).at(fields::EDGE),
    Modifier::generic(ModifierId::Invert).at(fields::INVERT),
    Modifier::generic(ModifierId::CounterMask).at(fields::COUNTER_MASK),
    Modifier::generic(ModifierId::Host).at(fields::HOST_ONLY),
    Modifier::generic(ModifierId::Guest).at(fields::GUEST_ONLY),
    Modifier::generic(ModifierId::Pinned),
    Modifier::generic(ModifierId::Precise),
];

/// Descriptor for one K8 stepping
pub fn k8_revision(
    name: &'static str,
    id: u32,
    description: &'static str,
    revision: Revision,
) -> PmuDescriptor {
    PmuDescriptor::new(
        name,
        PmuId(id),
        description,
        Detector::new(k8_family, RevisionFilter::Exact(revision.id())),
        &k8::EVENTS,
        &K8_MODIFIERS,
        K8_LAYOUT,
    )
}

/// Descriptor for a Family 10h part, or the family fallback with `None`
pub fn fam10h_revision(
    name: &'static str,
    id: u32,
    description: &'static str,
    revision: Option<Revision>,
) -> PmuDescriptor {
    let filter = match revision {
        Some(r) => RevisionFilter::Exact(r.id()),
        None => RevisionFilter::Any,
    };
    PmuDescriptor::new(
        name,
        PmuId(id),
        description,
        Detector::new(fam10h_family, filter),
        &fam10h::EVENTS,
        &FAM10H_MODIFIERS,
        FAM10H_LAYOUT,
    )
    .with_flags(PmuFlags::PREFIX_MATCH)
}

pub fn descriptors() -> Vec<PmuDescriptor> {
    vec![
        k8_revision("amd64_k8_revb", 16, "AMD64 K8 RevB", Revision::K8RevB),
        k8_revision("amd64_k8_revc", 17, "AMD64 K8 RevC", Revision::K8RevC),
        k8_revision("amd64_k8_revd", 18, "AMD64 K8 RevD", Revision::K8RevD),
        k8_revision("amd64_k8_reve", 19, "AMD64 K8 RevE", Revision::K8RevE),
        k8_revision("amd64_k8_revf", 20, "AMD64 K8 RevF", Revision::K8RevF),
        k8_revision("amd64_k8_revg", 21, "AMD64 K8 RevG", Revision::K8RevG),
        fam10h_revision(
            "amd64_fam10h_barcelona",
            25,
            "AMD64 Fam10h Barcelona",
            Some(Revision::Fam10hRevB),
        ),
        fam10h_revision(
            "amd64_fam10h_shanghai",
            26,
            "AMD64 Fam10h Shanghai",
            Some(Revision::Fam10hRevC),
        ),
        fam10h_revision(
            "amd64_fam10h_istanbul",
            27,
            "AMD64 Fam10h Istanbul",
            Some(Revision::Fam10hRevD),
        ),
        fam10h_revision("amd64_fam10h", 28, "AMD64 Fam10h", None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StaticProbe;
    use crate::encode::encode_event;
    use crate::error::ErrorKind;
    use crate::events::validate::validate;
    use crate::pmu::PmuRegistry;
    use pmuflow_raw::arch::amd64::PerfEvtSel;
    use pmuflow_raw::RegisterLayout;

    fn amd(family: u32, model: u32, stepping: u32) -> HostIdentity {
        HostIdentity::new(AMD_VENDOR, family, model, stepping)
    }

    fn active(host: HostIdentity) -> crate::error::Result<&'static str> {
        PmuRegistry::builtin()
            .activate(&StaticProbe(host))
            .map(|p| p.name)
    }

    #[test]
    fn test_builtin_tables_validate() {
        for pmu in descriptors() {
            if let Err(errors) = validate(&pmu) {
                panic!("{} failed validation: {:?}", pmu.name, errors);
            }
        }

        let registry = PmuRegistry::builtin();
        assert_eq!(registry.len(), 10);
        assert!(registry.rejected().is_empty());
    }

    #[test]
    fn test_k8_revision_mapping() {
        let cases = [
            ((5, 1), Revision::K8RevB),
            ((4, 0), Revision::K8RevB),
            ((5, 2), Revision::K8RevC),
            ((4, 1), Revision::K8RevC),
            ((0x1b, 0), Revision::K8RevD),
            ((0x2f, 2), Revision::K8RevE),
            ((0x37, 0), Revision::K8RevE),
            ((0x41, 2), Revision::K8RevF),
            ((0xc1, 3), Revision::K8RevF),
            ((0x6b, 2), Revision::K8RevG),
            ((0x7f, 1), Revision::K8RevG),
            ((0x90, 0), Revision::K8RevB),
        ];
        for ((model, stepping), expected) in cases {
            assert_eq!(
                amd64_revision(&amd(15, model, stepping)),
                Some(expected),
                "model {model:#x} stepping {stepping}"
            );
        }
    }

    #[test]
    fn test_fam10h_revision_mapping() {
        assert_eq!(amd64_revision(&amd(16, 2, 3)), Some(Revision::Fam10hRevB));
        assert_eq!(amd64_revision(&amd(16, 4, 2)), Some(Revision::Fam10hRevC));
        assert_eq!(amd64_revision(&amd(16, 6, 0)), Some(Revision::Fam10hRevC));
        assert_eq!(amd64_revision(&amd(16, 9, 1)), Some(Revision::Fam10hRevD));
        assert_eq!(amd64_revision(&amd(16, 10, 0)), Some(Revision::Fam10hRevE));
    }

    #[test]
    fn test_other_hosts_rejected() {
        assert_eq!(amd64_revision(&amd(0x17, 1, 0)), None);
        assert_eq!(
            amd64_revision(&HostIdentity::new("GenuineIntel", 15, 4, 0)),
            None
        );
        let err = active(HostIdentity::new("GenuineIntel", 6, 0x55, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_cascade_on_builtin_tables() {
        assert_eq!(active(amd(15, 5, 1)).unwrap(), "amd64_k8_revb");
        assert_eq!(active(amd(15, 0x41, 2)).unwrap(), "amd64_k8_revf");
        assert_eq!(active(amd(16, 2, 3)).unwrap(), "amd64_fam10h_barcelona");
        assert_eq!(active(amd(16, 4, 2)).unwrap(), "amd64_fam10h_shanghai");
        assert_eq!(active(amd(16, 8, 0)).unwrap(), "amd64_fam10h_istanbul");
        // No dedicated RevE descriptor
        assert_eq!(active(amd(16, 10, 0)).unwrap(), "amd64_fam10h");
    }

    fn pmu(name: &str) -> PmuDescriptor {
        descriptors()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    #[test]
    fn test_k8_revision_restrictions() {
        let rev_b = pmu("amd64_k8_revb");
        let rev_e = pmu("amd64_k8_reve");
        let rev_f = pmu("amd64_k8_revf");

        assert_eq!(
            encode_event(&rev_b, "LOCKED_OPS:EXECUTED").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(encode_event(&rev_b, "LOCKED_OPS").unwrap().config, 0x24);
        assert_eq!(encode_event(&rev_e, "LOCKED_OPS").unwrap().config, 0x0724);

        assert!(encode_event(&rev_e, "MEMORY_REQUESTS:STREAMING_STORE").is_err());
        assert_eq!(
            encode_event(&rev_f, "MEMORY_REQUESTS:STREAMING_STORE")
                .unwrap()
                .config,
            0x8065
        );

        assert!(encode_event(&pmu("amd64_k8_revd"), "CPU_IO_REQUESTS_TO_MEMORY_IO").is_err());
        assert_eq!(
            encode_event(&rev_e, "CPU_IO_REQUESTS_TO_MEMORY_IO:CPU_TO_MEM")
                .unwrap()
                .config,
            0xa8e9
        );
    }

    #[test]
    fn test_k8_encoding() {
        let pmu = pmu("amd64_k8_revf");
        let enc = encode_event(&pmu, "CPU_CLK_UNHALTED").unwrap();
        assert_eq!(enc.config, 0x76);
        assert_eq!(enc.codes, vec![0x53_0076]);

        let enc = encode_event(&pmu, "DISPATCHED_FPU:k:c=2").unwrap();
        assert_eq!(enc.config, 0x0200_3f00);
        assert_eq!(enc.fstr, "amd64_k8_revf::DISPATCHED_FPU:ALL:k:c=2");

        // K8 has no prefix matching and no virtualization bits
        assert!(encode_event(&pmu, "CPU_CLK").is_err());
        assert!(encode_event(&pmu, "CPU_CLK_UNHALTED:h").is_err());
    }

    #[test]
    fn test_fam10h_encoding() {
        let pmu = pmu("amd64_fam10h_shanghai");

        let enc = encode_event(&pmu, "L3_CACHE_MISSES").unwrap();
        assert_eq!(enc.fstr, "amd64_fam10h_shanghai::L3_CACHE_MISSES:ANY_READ:ALL_CORES");
        let sel = PerfEvtSel::from_raw(enc.codes[0]);
        assert_eq!(sel.event_select, 0x4e1);
        assert_eq!(sel.unit_mask, 0xf7);
        assert_eq!(enc.config, 0x4_0000_f7e1);

        let enc = encode_event(&pmu, "L3_C:CORE_1:READ_BLOCK_SHARED").unwrap();
        assert_eq!(PerfEvtSel::from_raw(enc.codes[0]).unit_mask, 0x22);

        let enc = encode_event(&pmu, "CPU_CLK_UNHALTED:h").unwrap();
        assert!(enc.flags.exclude_guest);
        assert!(!enc.flags.exclude_host);
        assert!(PerfEvtSel::from_raw(enc.codes[0]).host_only);
        assert_eq!(enc.config, 0x76);

        let err = encode_event(&pmu, "CPU_CLK_UNHALTED:h:g:nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(err.token(), Some("g"));
        assert_eq!(
            encode_event(&pmu, "CPU_CLK_UNHALTED:precise=1").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            encode_event(&pmu, "RETIRED_INSTRUCTIONS:precise=1").unwrap().flags.precise,
            1
        );
        assert_eq!(
            encode_event(&pmu, "L3_").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_fam10h_revision_restrictions() {
        let barcelona = pmu("amd64_fam10h_barcelona");
        let shanghai = pmu("amd64_fam10h_shanghai");
        assert!(barcelona.find_event("NON_CANCELLED_L3_READ_REQUESTS").is_err());
        assert!(shanghai.find_event("NON_CANCELLED_L3_READ_REQUESTS").is_ok());
        assert!(encode_event(&barcelona, "LOCKED_OPS:CYCLES_WAITING").is_err());
        assert!(encode_event(&shanghai, "LOCKED_OPS:CYCLES_WAITING").is_ok());
    }

    #[test]
    fn test_every_event_round_trips() {
        for pmu in descriptors() {
            for idx in pmu.events() {
                let name = pmu.event_info(idx).unwrap().name;
                let first = encode_event(&pmu, name).unwrap();
                let second = encode_event(&pmu, &first.fstr).unwrap();
                assert_eq!(first, second, "{}::{}", pmu.name, name);
                assert!(PerfEvtSel::from_raw(first.codes[0]).validate().is_ok());
            }
        }
    }
}
