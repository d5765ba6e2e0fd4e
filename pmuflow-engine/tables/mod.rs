//! Compiled-in descriptor tables

pub mod amd64;

use crate::pmu::PmuDescriptor;

/// Every compiled-in descriptor, in registration order
pub fn builtin() -> Vec<PmuDescriptor> {
    let mut pmus = Vec::new();
    pmus.extend(amd64::descriptors());
    pmus
}
