//! AMD64 (K8, Family 10h) register definitions
//!
//! Both families share the PERFEVTSELx layout. K8 only decodes the low
//! eight event select bits; Family 10h adds bits 11:8 at 35:32 and the
//! host/guest qualifiers.

pub mod perfevtsel;

pub use perfevtsel::{fields, PerfEvtSel, PERF_COUNTERS};
