// Core modules implementing paths, the bus seam, composition, and object lifecycle.
pub mod binding;
pub mod bus;
pub mod compose;
pub mod error;
pub mod memory;
pub mod object;
pub mod path;
