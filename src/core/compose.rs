//! Purpose: Build ordered sets of interface bindings against one connection and path.
//! Exports: `Compose`, `Composition`, `CompositionBuilder`, `BindingCtor`.
//! Role: Construction and teardown order for everything a composed object owns.
//! Invariants: Bindings are constructed in declared order and torn down in reverse.
//! Invariants: A failure at binding k tears down bindings 0..k-1 before the error returns.
//! Invariants: An empty composition is valid and registers nothing.

use std::fmt;

use tracing::debug;

use crate::core::binding::{Bind, Interface, InterfaceBinding};
use crate::core::bus::Connection;
use crate::core::error::Error;
use crate::core::path::ObjectPath;

/// Ordered bindings owned by one composed object.
pub trait Compose {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interface names in declared order.
    fn interface_names(&self) -> Vec<&str>;

    /// Calls every binding's `emit_added` once, in declared order.
    ///
    /// A failing binding does not stop the rest; its error is returned,
    /// tagged with the interface name.
    fn emit_each_added(&self) -> Vec<Error>;

    /// Drops the bindings in reverse declared order.
    fn teardown(self)
    where
        Self: Sized;
}

pub type BindingCtor =
    Box<dyn FnOnce(&Connection, &ObjectPath) -> Result<Box<dyn InterfaceBinding>, Error>>;

/// Runtime list of binding constructors.
#[derive(Default)]
pub struct CompositionBuilder {
    ctors: Vec<BindingCtor>,
}

impl CompositionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F, B>(mut self, ctor: F) -> Self
    where
        F: FnOnce(&Connection, &ObjectPath) -> Result<B, Error> + 'static,
        B: InterfaceBinding + 'static,
    {
        self.ctors.push(Box::new(move |connection: &Connection, path: &ObjectPath| {
            ctor(connection, path).map(|binding| Box::new(binding) as Box<dyn InterfaceBinding>)
        }));
        self
    }

    pub fn with_bind<B>(self) -> Self
    where
        B: Bind + InterfaceBinding + 'static,
    {
        self.with(B::bind)
    }

    pub fn with_interface(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(move |connection, path| Interface::register(connection, path, name))
    }

    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }

    pub fn build(self, connection: &Connection, path: &ObjectPath) -> Result<Composition, Error> {
        let mut composition = Composition {
            bindings: Vec::with_capacity(self.ctors.len()),
        };
        for (index, ctor) in self.ctors.into_iter().enumerate() {
            match ctor(connection, path) {
                Ok(binding) => composition.bindings.push(binding),
                Err(err) => {
                    debug!(
                        path = %path,
                        index,
                        rolled_back = composition.bindings.len(),
                        error = %err,
                        "binding construction failed"
                    );
                    // Dropping the partial composition unwinds 0..index in reverse.
                    drop(composition);
                    return Err(err);
                }
            }
        }
        Ok(composition)
    }
}

impl fmt::Debug for CompositionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionBuilder")
            .field("len", &self.ctors.len())
            .finish()
    }
}

pub struct Composition {
    bindings: Vec<Box<dyn InterfaceBinding>>,
}

fn announce<B: InterfaceBinding + ?Sized>(binding: &B, failures: &mut Vec<Error>) {
    if let Err(err) = binding.emit_added() {
        failures.push(err.with_interface(binding.interface_name()));
    }
}

impl Composition {
    pub fn iter(&self) -> impl Iterator<Item = &dyn InterfaceBinding> {
        self.bindings.iter().map(|binding| &**binding)
    }
}

impl Compose for Composition {
    fn len(&self) -> usize {
        self.bindings.len()
    }

    fn interface_names(&self) -> Vec<&str> {
        self.iter().map(|binding| binding.interface_name()).collect()
    }

    fn emit_each_added(&self) -> Vec<Error> {
        let mut failures = Vec::new();
        for binding in self.iter() {
            announce(binding, &mut failures);
        }
        failures
    }

    fn teardown(self) {
        drop(self);
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        while let Some(binding) = self.bindings.pop() {
            drop(binding);
        }
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("interfaces", &self.interface_names())
            .finish()
    }
}

impl Bind for () {
    fn bind(_connection: &Connection, _path: &ObjectPath) -> Result<Self, Error> {
        Ok(())
    }
}

impl Compose for () {
    fn len(&self) -> usize {
        0
    }

    fn interface_names(&self) -> Vec<&str> {
        Vec::new()
    }

    fn emit_each_added(&self) -> Vec<Error> {
        Vec::new()
    }

    fn teardown(self) {}
}

// Locals in `bind` drop in reverse declaration order, which is the rollback
// order on a partial failure. `teardown` lists the same names reversed.
macro_rules! impl_compose_tuple {
    ($len:expr; $($ty:ident $var:ident),+; rev $($rev:ident),+) => {
        impl<$($ty: Bind),+> Bind for ($($ty,)+) {
            fn bind(connection: &Connection, path: &ObjectPath) -> Result<Self, Error> {
                $(let $var = <$ty as Bind>::bind(connection, path)?;)+
                Ok(($($var,)+))
            }
        }

        impl<$($ty: InterfaceBinding),+> Compose for ($($ty,)+) {
            fn len(&self) -> usize {
                $len
            }

            fn interface_names(&self) -> Vec<&str> {
                let ($($var,)+) = self;
                vec![$($var.interface_name()),+]
            }

            fn emit_each_added(&self) -> Vec<Error> {
                let ($($var,)+) = self;
                let mut failures = Vec::new();
                $(announce($var, &mut failures);)+
                failures
            }

            fn teardown(self) {
                let ($($var,)+) = self;
                $(drop($rev);)+
            }
        }
    };
}

impl_compose_tuple!(1; A a; rev a);
impl_compose_tuple!(2; A a, B b; rev b, a);
impl_compose_tuple!(3; A a, B b, C c; rev c, b, a);
impl_compose_tuple!(4; A a, B b, C c, D d; rev d, c, b, a);
impl_compose_tuple!(5; A a, B b, C c, D d, E e; rev e, d, c, b, a);
impl_compose_tuple!(6; A a, B b, C c, D d, E e, F f; rev f, e, d, c, b, a);
impl_compose_tuple!(7; A a, B b, C c, D d, E e, F f, G g; rev g, f, e, d, c, b, a);
impl_compose_tuple!(8; A a, B b, C c, D d, E e, F f, G g, H h; rev h, g, f, e, d, c, b, a);
