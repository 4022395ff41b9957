//! Core entity definitions for ParkHub
//!
//! The four records of the parking domain (users, lots, spots, reservations)
//! plus the pure pricing and duration logic that operates on them. This crate
//! performs no I/O; persistence lives in `parking_store`.

mod lot;
mod reservation;
mod spot;
mod user;

pub use lot::*;
pub use reservation::*;
pub use spot::*;
pub use user::*;
