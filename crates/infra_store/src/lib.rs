//! Storage adapter
//!
//! Implements the collection and enforcement repository ports over shared
//! in-process state. One `InMemoryStore` instance backs the whole service;
//! swapping in a durable adapter is a matter of re-implementing the same
//! two traits.

pub mod memory;

pub use memory::InMemoryStore;
