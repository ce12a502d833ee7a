//! Runtime management of the security pipeline: filter listing, bypass
//! conditions and filter on/off switches.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
