pub mod cpuid;
pub mod host;

pub use host::{CpuidProbe, CpuinfoProbe, HostIdentity, HostProbe, StaticProbe};
