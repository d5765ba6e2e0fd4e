// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod common;
pub mod config;
pub mod encode;
pub mod error;
pub mod events;
pub mod introspect;
pub mod pmu;
pub mod session;
pub mod tables;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SessionConfig;
pub use encode::{encode, encode_event, parse, EncodedEvent, EventFlags, ParsedEvent};
pub use error::{ErrorKind, PmuError, Result, ValidationError};
pub use events::{Event, EventIdx, Modifier, ModifierId, Umask};
pub use introspect::{AttrInfo, AttrKind, EventInfo, EventIter};
pub use pmu::{PmuDescriptor, PmuId, PmuRegistry};
pub use session::Session;
