//! Architecture-specific register definitions
//!
//! Each CPU vendor has its own event select layout. This module provides
//! the field positions per architecture.
//!
//! ## Supported Architectures
//!
//! - **AMD64** (`amd64` feature) - K8 and Family 10h

#[cfg(feature = "amd64")]
pub mod amd64;
