//! Purpose: Define the stable public Rust API boundary for busobject.
//! Exports: Object lifecycle, composition, binding, and bus seam types.
//! Role: Public, additive-only surface over `core`.
//! Invariants: Embedders should only need this module.

pub use crate::core::binding::{Bind, Binding, Interface, InterfaceBinding, InterfaceDef};
pub use crate::core::bus::{Bus, Connection, Registration, RegistrationId};
pub use crate::core::compose::{BindingCtor, Compose, Composition, CompositionBuilder};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::memory::{BusEvent, MemoryBus, SignalKind};
pub use crate::core::object::{Action, BusObject, ObjectState};
pub use crate::core::path::ObjectPath;
