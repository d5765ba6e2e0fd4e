//! PMU descriptors, the detection cascade and the registry owning them

pub mod descriptor;
pub mod detect;
pub mod registry;

pub use descriptor::{EncodingLayout, PmuDescriptor, PmuFlags, PmuId};
pub use detect::{Detector, FamilyProbe, RevisionFilter};
pub use registry::{PmuRegistry, RegistryBuilder};
