//! # pmuflow-raw
//!
//! Typed register field definitions for PMU event select registers.
//!
//! This crate provides the bit-level vocabulary the encoder works with:
//! a [`FieldSpec`] describes one bit range of one register, a
//! [`SplitField`] a value scattered over several ranges, and
//! [`RegisterLayout`] a structured view over a whole register.
//!
//! ## Features
//!
//! - `amd64` (default) - AMD64 K8 / Family 10h PERFEVTSEL layout
//!
//! ## Usage
//!
//! ```ignore
//! use pmuflow_raw::arch::amd64::{fields, PerfEvtSel};
//! use pmuflow_raw::RegisterLayout;
//!
//! let raw = fields::UNIT_MASK.insert(0x76, 0x01)?;
//! let decoded = PerfEvtSel::from_raw(raw);
//! assert_eq!(decoded.event_select, 0x76);
//! ```

pub mod arch;
pub mod register;

pub use register::{FieldError, FieldSpec, RegisterLayout, RegisterTarget, SplitField, MAX_REGISTERS};
