//! # CFx Types Crate
//!
//! Types shared by every part of the controller runtime.
//!
//! ## Design Principles
//!
//! - **Single envelope**: every inter-module message is a [`Cbt`]; modules
//!   never call each other directly.
//! - **Immutable messages**: a CBT cannot be modified once created. Request /
//!   response correlation is up to the modules and lives in the payload.
//! - **Uniform modules**: the runtime only ever sees a
//!   [`ControllerModule`] trait object, whatever business logic sits behind it.

pub mod cbt;
pub mod descriptor;
pub mod errors;
pub mod module;

pub use cbt::{Cbt, FRAMEWORK_NAME};
pub use descriptor::ModuleDescriptor;
pub use errors::*;
pub use module::{ControllerModule, DynModule, ModuleState, OverlayVariant};
