// Detection cascade: family predicate, then revision filter

use crate::common::HostIdentity;
use crate::error::{PmuError, Result};
use crate::pmu::PmuDescriptor;

/// Shared family predicate: the revision id when `host` belongs to the family
pub type FamilyProbe = fn(&HostIdentity) -> Option<u32>;

/// Which revisions of a family a descriptor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionFilter {
    Exact(u32),
    /// Family-wide fallback, tried after every exact descriptor
    Any,
}

impl RevisionFilter {
    pub fn accepts(&self, revision: u32) -> bool {
        match self {
            RevisionFilter::Exact(expected) => *expected == revision,
            RevisionFilter::Any => true,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, RevisionFilter::Exact(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Detector {
    pub family: FamilyProbe,
    pub revision: RevisionFilter,
}

impl Detector {
    pub fn new(family: FamilyProbe, revision: RevisionFilter) -> Self {
        Self { family, revision }
    }

    /// Both stages must pass; returns the detected revision
    pub fn detect(&self, host: &HostIdentity) -> Result<u32> {
        let revision = (self.family)(host).ok_or_else(|| {
            PmuError::NotSupported(format!(
                "{} family {:#x} model {:#x} is not in this family",
                host.vendor, host.family, host.model
            ))
        })?;

        if self.revision.accepts(revision) {
            Ok(revision)
        } else {
            Err(PmuError::NotSupported(format!(
                "revision {revision} does not match {:?}",
                self.revision
            )))
        }
    }
}

/// Candidate order: exact-revision descriptors first, registration order within each class
pub fn specificity_order(pmus: &[PmuDescriptor]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pmus.len()).collect();
    order.sort_by_key(|&i| !pmus[i].detector.revision.is_exact());
    order
}

/// Run the chain; the first descriptor whose detector succeeds wins
pub fn cascade(pmus: &[PmuDescriptor], host: &HostIdentity) -> Result<usize> {
    for i in specificity_order(pmus) {
        let pmu = &pmus[i];
        match pmu.detector.detect(host) {
            Ok(revision) => {
                tracing::debug!("{} matched revision {}", pmu.name, revision);
                return Ok(i);
            }
            Err(e) => tracing::debug!("{} rejected host: {}", pmu.name, e),
        }
    }

    Err(PmuError::NotSupported(format!(
        "no PMU for {} family {:#x} model {:#x} stepping {:#x}",
        host.vendor, host.family, host.model, host.stepping
    )))
}
