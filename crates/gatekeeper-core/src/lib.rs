//! # Gatekeeper Core
//!
//! Foundational types shared by every Gatekeeper crate:
//!
//! - [`errors`]: the HTTP-facing error type with a stable error code
//! - [`password`]: bcrypt hashing and constant-shape verification
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_core::errors::AppError;
//! use gatekeeper_core::password::{hash_password, verify_password};
//!
//! let error = AppError::forbidden(anyhow::anyhow!("Admin role required"));
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, codes};
pub use password::{hash_password, verify_password, verify_password_or_dummy};
