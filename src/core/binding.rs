//! Purpose: The per-interface unit a composed object is built from.
//! Exports: `InterfaceBinding`, `Bind`, `InterfaceDef`, `Interface`, `Binding`.
//! Role: Owns one interface registration at a path; announces itself on request.
//! Invariants: A binding's registration lives exactly as long as the binding.
//! Invariants: `emit_added` announces only this binding's interface.

use std::fmt;
use std::marker::PhantomData;

use crate::core::bus::{Connection, Registration};
use crate::core::error::Error;
use crate::core::path::ObjectPath;

/// Common surface every interface binding exposes to its composed object.
pub trait InterfaceBinding {
    fn interface_name(&self) -> &str;

    /// Announces this interface alone via an "interfaces added" signal.
    fn emit_added(&self) -> Result<(), Error>;
}

/// Construction against a shared connection and path, for statically known bindings.
pub trait Bind: Sized {
    fn bind(connection: &Connection, path: &ObjectPath) -> Result<Self, Error>;
}

/// Compile-time interface name, used by [`Binding`].
pub trait InterfaceDef {
    const NAME: &'static str;
}

/// Registration of a single named interface.
pub struct Interface {
    registration: Registration,
}

impl Interface {
    pub fn register(
        connection: &Connection,
        path: &ObjectPath,
        name: impl Into<String>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let registration = connection.register(path, &name)?;
        Ok(Self { registration })
    }

    pub fn path(&self) -> &ObjectPath {
        self.registration.path()
    }

    pub fn connection(&self) -> &Connection {
        self.registration.connection()
    }
}

impl InterfaceBinding for Interface {
    fn interface_name(&self) -> &str {
        self.registration.interface()
    }

    fn emit_added(&self) -> Result<(), Error> {
        let name = self.registration.interface();
        self.connection()
            .emit_interfaces_added(self.path(), &[name])
            .map_err(|err| err.with_interface(name))
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("registration", &self.registration)
            .finish()
    }
}

/// Typed binding whose interface name comes from `D`.
pub struct Binding<D: InterfaceDef> {
    inner: Interface,
    _def: PhantomData<fn() -> D>,
}

impl<D: InterfaceDef> Bind for Binding<D> {
    fn bind(connection: &Connection, path: &ObjectPath) -> Result<Self, Error> {
        Ok(Self {
            inner: Interface::register(connection, path, D::NAME)?,
            _def: PhantomData,
        })
    }
}

impl<D: InterfaceDef> InterfaceBinding for Binding<D> {
    fn interface_name(&self) -> &str {
        D::NAME
    }

    fn emit_added(&self) -> Result<(), Error> {
        self.inner.emit_added()
    }
}

impl<D: InterfaceDef> fmt::Debug for Binding<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.inner).finish()
    }
}
