//! Domain models for the contact directory
//!
//! Contains the core entities without any I/O concerns.

mod contact;
mod geo;
mod id;

pub use contact::{Address, Contact, Gender};
pub use geo::{Country, GeoError, State};
pub use id::{Pid, PidError, PidKind};
