//! Event string to register values

pub mod encoder;
pub mod parser;

pub use encoder::{encode, EncodedEvent, EventFlags};
pub use parser::{parse, ParsedEvent};

use crate::error::Result;
use crate::pmu::PmuDescriptor;

/// Parse and encode in one step
pub fn encode_event(pmu: &PmuDescriptor, input: &str) -> Result<EncodedEvent> {
    let parsed = parse(pmu, input)?;
    encode(pmu, &parsed)
}
