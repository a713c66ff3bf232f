//! Purpose: Compose interface bindings into bus objects with managed added/removed signals.
//! Exports: `core` (paths, bus seam, bindings, composition, lifecycle) and `api` (stable re-exports).
//! Role: Library backing the `busobject` CLI and embedders that own a bus connection.
//! Invariants: Whole-object signals originate only from `BusObject`.
//! Invariants: Teardown never panics; failures surface through `tracing`.
pub mod api;
pub mod core;
