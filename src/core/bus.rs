//! Purpose: Define the connection seam composed objects register and broadcast through.
//! Exports: `Bus`, `Connection`, `Registration`, `RegistrationId`.
//! Role: Abstract transport; concrete buses own dispatch and marshalling.
//! Invariants: A `Connection` is a shared handle; cloning never opens a new transport.
//! Invariants: A `Registration` unregisters exactly once, on drop, and never panics.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::Error;
use crate::core::path::ObjectPath;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct RegistrationId(pub u64);

/// Transport operations consumed by composed objects.
///
/// Implementations serialize concurrent calls themselves; callers never lock
/// around a bus.
pub trait Bus: Send + Sync {
    fn register_interface(
        &self,
        path: &ObjectPath,
        interface: &str,
    ) -> Result<RegistrationId, Error>;
    fn unregister_interface(&self, id: RegistrationId) -> Result<(), Error>;
    fn emit_object_added(&self, path: &ObjectPath) -> Result<(), Error>;
    fn emit_object_removed(&self, path: &ObjectPath) -> Result<(), Error>;
    fn emit_interfaces_added(&self, path: &ObjectPath, interfaces: &[&str]) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct Connection {
    bus: Arc<dyn Bus>,
}

impl Connection {
    pub fn from_bus<B: Bus + 'static>(bus: B) -> Self {
        Self { bus: Arc::new(bus) }
    }

    pub fn register(&self, path: &ObjectPath, interface: &str) -> Result<Registration, Error> {
        let id = self
            .bus
            .register_interface(path, interface)
            .map_err(|err| err.with_path(path.as_str()).with_interface(interface))?;
        debug!(path = %path, interface, id = id.0, "registered interface");
        Ok(Registration {
            connection: self.clone(),
            path: path.clone(),
            interface: interface.to_string(),
            id,
        })
    }

    pub fn emit_object_added(&self, path: &ObjectPath) -> Result<(), Error> {
        self.bus
            .emit_object_added(path)
            .map_err(|err| err.with_path(path.as_str()))
    }

    pub fn emit_object_removed(&self, path: &ObjectPath) -> Result<(), Error> {
        self.bus
            .emit_object_removed(path)
            .map_err(|err| err.with_path(path.as_str()))
    }

    pub fn emit_interfaces_added(
        &self,
        path: &ObjectPath,
        interfaces: &[&str],
    ) -> Result<(), Error> {
        self.bus
            .emit_interfaces_added(path, interfaces)
            .map_err(|err| err.with_path(path.as_str()))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("bus", &Arc::as_ptr(&self.bus))
            .finish()
    }
}

/// Live registration of one interface at one path.
pub struct Registration {
    connection: Connection,
    path: ObjectPath,
    interface: String,
    id: RegistrationId,
}

impl Registration {
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("path", &self.path)
            .field("interface", &self.interface)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        match self.connection.bus.unregister_interface(self.id) {
            Ok(()) => debug!(
                path = %self.path,
                interface = %self.interface,
                id = self.id.0,
                "unregistered interface"
            ),
            Err(err) => warn!(
                path = %self.path,
                interface = %self.interface,
                id = self.id.0,
                error = %err,
                "failed to unregister interface"
            ),
        }
    }
}
