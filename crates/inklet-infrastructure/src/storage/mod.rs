//! Storage primitives for client-side state.

pub mod atomic_json;

pub use atomic_json::AtomicJsonFile;
