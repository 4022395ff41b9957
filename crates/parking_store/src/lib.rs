//! Parking storage and occupancy management for ParkHub
//!
//! This crate provides a storage abstraction over users, lots, spots and
//! reservations. `SqliteParkingStore` is the production implementation;
//! `MemoryParkingStore` backs tests. Both enforce the booking invariant: a
//! spot is claimed atomically, so two concurrent bookings can never take the
//! same spot.

mod error;
mod memory;
mod sqlite;
mod store;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use store::*;
