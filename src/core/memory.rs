//! Purpose: In-process `Bus` that records every registration and broadcast.
//! Exports: `MemoryBus`, `BusEvent`, `SignalKind`.
//! Role: Loopback transport for the CLI demo and for tests; supports fault injection.
//! Invariants: Events are recorded in call order, only for operations that succeed.
//! Invariants: An interface can be registered at most once per path at a time.
//! Invariants: Injected faults fire once (per-signal) or persist until cleared (registration, disconnect).

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::bus::{Bus, RegistrationId};
use crate::core::error::{Error, ErrorKind};
use crate::core::path::ObjectPath;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignalKind {
    ObjectAdded,
    ObjectRemoved,
    InterfacesAdded,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BusEvent {
    Registered {
        id: RegistrationId,
        path: ObjectPath,
        interface: String,
    },
    Unregistered {
        id: RegistrationId,
        path: ObjectPath,
        interface: String,
    },
    ObjectAdded {
        path: ObjectPath,
    },
    ObjectRemoved {
        path: ObjectPath,
    },
    InterfacesAdded {
        path: ObjectPath,
        interfaces: Vec<String>,
    },
}

impl BusEvent {
    pub fn kind_str(&self) -> &'static str {
        match self {
            BusEvent::Registered { .. } => "registered",
            BusEvent::Unregistered { .. } => "unregistered",
            BusEvent::ObjectAdded { .. } => "object_added",
            BusEvent::ObjectRemoved { .. } => "object_removed",
            BusEvent::InterfacesAdded { .. } => "interfaces_added",
        }
    }

    pub fn path(&self) -> &ObjectPath {
        match self {
            BusEvent::Registered { path, .. }
            | BusEvent::Unregistered { path, .. }
            | BusEvent::ObjectAdded { path }
            | BusEvent::ObjectRemoved { path }
            | BusEvent::InterfacesAdded { path, .. } => path,
        }
    }

    pub fn signal_kind(&self) -> Option<SignalKind> {
        match self {
            BusEvent::ObjectAdded { .. } => Some(SignalKind::ObjectAdded),
            BusEvent::ObjectRemoved { .. } => Some(SignalKind::ObjectRemoved),
            BusEvent::InterfacesAdded { .. } => Some(SignalKind::InterfacesAdded),
            BusEvent::Registered { .. } | BusEvent::Unregistered { .. } => None,
        }
    }
}

#[derive(Default)]
struct State {
    next_id: u64,
    registrations: BTreeMap<RegistrationId, (ObjectPath, String)>,
    events: Vec<BusEvent>,
    failing_interfaces: HashSet<String>,
    failing_signals: HashSet<SignalKind>,
    fail_next_unregister: bool,
    disconnected: bool,
}

impl State {
    fn check_connected(&self) -> Result<(), Error> {
        if self.disconnected {
            return Err(Error::new(ErrorKind::Disconnected).with_message("bus is disconnected"));
        }
        Ok(())
    }

    fn take_signal_fault(&mut self, kind: SignalKind) -> Result<(), Error> {
        self.check_connected()?;
        if self.failing_signals.remove(&kind) {
            return Err(Error::new(ErrorKind::Emission)
                .with_message(format!("injected {kind:?} failure")));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<State>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn signal_count(&self, kind: SignalKind) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|event| event.signal_kind() == Some(kind))
            .count()
    }

    /// Interfaces currently registered at `path`, in registration order.
    pub fn registered_interfaces(&self, path: &ObjectPath) -> Vec<String> {
        self.lock()
            .registrations
            .values()
            .filter(|(registered, _)| registered == path)
            .map(|(_, interface)| interface.clone())
            .collect()
    }

    pub fn registration_count(&self) -> usize {
        self.lock().registrations.len()
    }

    pub fn fail_registration_of(&self, interface: impl Into<String>) {
        self.lock().failing_interfaces.insert(interface.into());
    }

    pub fn fail_next_signal(&self, kind: SignalKind) {
        self.lock().failing_signals.insert(kind);
    }

    pub fn fail_next_unregister(&self) {
        self.lock().fail_next_unregister = true;
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.lock().disconnected = disconnected;
    }
}

impl Bus for MemoryBus {
    fn register_interface(
        &self,
        path: &ObjectPath,
        interface: &str,
    ) -> Result<RegistrationId, Error> {
        let mut state = self.lock();
        state.check_connected()?;
        if state.failing_interfaces.contains(interface) {
            return Err(Error::new(ErrorKind::Registration)
                .with_message("injected registration failure"));
        }
        let duplicate = state
            .registrations
            .values()
            .any(|(registered, name)| registered == path && name == interface);
        if duplicate {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("interface already registered at path"));
        }

        state.next_id += 1;
        let id = RegistrationId(state.next_id);
        state
            .registrations
            .insert(id, (path.clone(), interface.to_string()));
        state.events.push(BusEvent::Registered {
            id,
            path: path.clone(),
            interface: interface.to_string(),
        });
        Ok(id)
    }

    fn unregister_interface(&self, id: RegistrationId) -> Result<(), Error> {
        let mut state = self.lock();
        // The registration is released even when the call reports failure.
        let removed = state.registrations.remove(&id);
        if std::mem::take(&mut state.fail_next_unregister) {
            return Err(Error::new(ErrorKind::Registration)
                .with_message("injected unregister failure"));
        }
        let Some((path, interface)) = removed else {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("no registration with id {}", id.0)));
        };
        state.events.push(BusEvent::Unregistered {
            id,
            path,
            interface,
        });
        Ok(())
    }

    fn emit_object_added(&self, path: &ObjectPath) -> Result<(), Error> {
        let mut state = self.lock();
        state.take_signal_fault(SignalKind::ObjectAdded)?;
        state
            .events
            .push(BusEvent::ObjectAdded { path: path.clone() });
        Ok(())
    }

    fn emit_object_removed(&self, path: &ObjectPath) -> Result<(), Error> {
        let mut state = self.lock();
        state.take_signal_fault(SignalKind::ObjectRemoved)?;
        state
            .events
            .push(BusEvent::ObjectRemoved { path: path.clone() });
        Ok(())
    }

    fn emit_interfaces_added(&self, path: &ObjectPath, interfaces: &[&str]) -> Result<(), Error> {
        let mut state = self.lock();
        state.take_signal_fault(SignalKind::InterfacesAdded)?;
        state.events.push(BusEvent::InterfacesAdded {
            path: path.clone(),
            interfaces: interfaces.iter().map(|name| name.to_string()).collect(),
        });
        Ok(())
    }
}
