//! Purpose: Own a composition at one path and drive its added/removed broadcasts.
//! Exports: `BusObject`, `Action`, `ObjectState`.
//! Role: Lifecycle controller; the only place whole-object signals originate.
//! Invariants: The added flag flips false->true at most once and only after a successful send.
//! Invariants: Policy signals at construction are best-effort; a failed send is logged and the object is kept.
//! Invariants: Drop sends "object removed" iff the added flag is set, then tears bindings down.
//! Invariants: Drop never panics; teardown failures are logged and swallowed.
//! Invariants: No `Clone`/`Default`; a moved-from object is never dropped, so removal fires once.

use std::fmt;
use std::mem::ManuallyDrop;

use tracing::{debug, warn};

use crate::core::binding::Bind;
use crate::core::bus::Connection;
use crate::core::compose::{Compose, Composition};
use crate::core::error::Error;
use crate::core::path::ObjectPath;

/// Signal policy applied once, at construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Action {
    #[default]
    EmitObjectAdded,
    EmitInterfaceAdded,
    DeferEmit,
}

impl Action {
    /// Maps the boolean "defer signal" shorthand onto a policy.
    pub fn from_defer(defer: bool) -> Self {
        if defer {
            Action::DeferEmit
        } else {
            Action::EmitObjectAdded
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectState {
    Added,
    Deferred,
    InterfacesAnnounced,
}

pub struct BusObject<C: Compose = Composition> {
    // Taken exactly once, in `Drop`.
    bindings: ManuallyDrop<C>,
    connection: Connection,
    path: ObjectPath,
    emit_removed: bool,
    action: Action,
}

impl<C: Bind + Compose> BusObject<C> {
    pub fn new(connection: &Connection, path: ObjectPath, action: Action) -> Result<Self, Error> {
        let bindings = C::bind(connection, &path)?;
        Ok(Self::from_composition(bindings, connection, path, action))
    }

    pub fn with_defer(connection: &Connection, path: ObjectPath, defer: bool) -> Result<Self, Error> {
        Self::new(connection, path, Action::from_defer(defer))
    }
}

impl<C: Compose> BusObject<C> {
    /// Takes ownership of already-built bindings and applies `action`.
    ///
    /// Signals sent by the policy are best-effort: failures are logged and
    /// the object is returned with `is_added() == false`, so the caller can
    /// retry with [`BusObject::emit_object_added`].
    pub fn from_composition(
        bindings: C,
        connection: &Connection,
        path: ObjectPath,
        action: Action,
    ) -> Self {
        let mut object = Self {
            bindings: ManuallyDrop::new(bindings),
            connection: connection.clone(),
            path,
            emit_removed: false,
            action,
        };
        object.check_action();
        object
    }

    fn check_action(&mut self) {
        match self.action {
            Action::EmitObjectAdded => {
                if let Err(err) = self.emit_object_added() {
                    warn!(
                        path = %self.path,
                        error = %err,
                        "failed to emit object added during construction"
                    );
                }
            }
            Action::EmitInterfaceAdded => {
                debug!(path = %self.path, "announcing interfaces individually");
                for err in self.bindings.emit_each_added() {
                    warn!(
                        path = %self.path,
                        interface = err.interface().unwrap_or_default(),
                        error = %err,
                        "failed to announce interface during construction"
                    );
                }
            }
            Action::DeferEmit => {}
        }
    }

    /// Sends "object added" unless it was already sent.
    pub fn emit_object_added(&mut self) -> Result<(), Error> {
        if self.emit_removed {
            return Ok(());
        }
        self.connection.emit_object_added(&self.path)?;
        self.emit_removed = true;
        debug!(
            path = %self.path,
            interfaces = ?self.bindings.interface_names(),
            "emitted object added"
        );
        Ok(())
    }

    pub fn is_added(&self) -> bool {
        self.emit_removed
    }

    pub fn state(&self) -> ObjectState {
        if self.emit_removed {
            return ObjectState::Added;
        }
        match self.action {
            Action::EmitInterfaceAdded => ObjectState::InterfacesAnnounced,
            Action::EmitObjectAdded | Action::DeferEmit => ObjectState::Deferred,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn bindings(&self) -> &C {
        &self.bindings
    }
}

impl<C: Compose> Drop for BusObject<C> {
    fn drop(&mut self) {
        if self.emit_removed {
            match self.connection.emit_object_removed(&self.path) {
                Ok(()) => debug!(path = %self.path, "emitted object removed"),
                Err(err) => warn!(
                    path = %self.path,
                    error = %err,
                    "failed to emit object removed during teardown"
                ),
            }
        }
        // SAFETY: `bindings` is never touched again after this point.
        let bindings = unsafe { ManuallyDrop::take(&mut self.bindings) };
        bindings.teardown();
    }
}

impl<C: Compose> fmt::Debug for BusObject<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusObject")
            .field("path", &self.path)
            .field("interfaces", &self.bindings.interface_names())
            .field("action", &self.action)
            .field("added", &self.emit_removed)
            .finish()
    }
}
