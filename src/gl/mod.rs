//! GL driver access for conformance cases.
//!
//! Cases talk to a driver through the `GlFunctions` function table. The
//! `ReferenceDriver` is a software implementation of the fragment shading
//! rate validation rules, used when no hardware context is involved.

pub mod enums;
pub mod functions;
pub mod reference;

pub use enums::*;
pub use functions::GlFunctions;
pub use reference::{AttachmentLimits, Call, DriverConfig, Fault, ReferenceDriver};
