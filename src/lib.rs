//! # Gatekeeper
//!
//! An authentication gateway built with Axum. Every inbound request runs
//! through an ordered pipeline of security filters before it reaches a
//! handler.
//!
//! ## Overview
//!
//! - **Filter pipeline**: filters declare a priority plus optional
//!   `runs_before` / `runs_after` constraints; the registry resolves them into
//!   one deterministic order and refuses registrations that would form a cycle
//! - **Bypass conditions**: path, header and address predicates attached to a
//!   filter at runtime make it skip matching requests
//! - **Tokens**: short-lived signed access tokens backed by opaque refresh
//!   tokens held in Redis, rotated with a compare-and-swap so concurrent
//!   refreshes cannot both win
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── gatekeeper-core/      # AppError, password hashing
//! ├── gatekeeper-config/    # Environment-driven configuration
//! ├── gatekeeper-cache/     # Token store (Redis, in-memory)
//! ├── gatekeeper-auth/      # Claims, JWT, TokenManager, identity store
//! ├── gatekeeper-db/        # PostgreSQL identity store
//! └── gatekeeper-pipeline/  # Conditions, ordering, registry, executor
//! src/
//! ├── filters/              # authentication, jwt_verification, authorization
//! ├── middleware/           # AuthUser extractor, admin guard
//! ├── modules/              # auth, admin, health endpoints
//! └── utils/                # Cookie and token extraction helpers
//! ```
//!
//! Each feature module follows the same structure:
//!
//! - `controller.rs`: HTTP handlers with OpenAPI annotations
//! - `service.rs`: business logic
//! - `model.rs`: request and response types
//! - `router.rs`: route definitions
//!
//! ## Filters
//!
//! | Filter | Does |
//! |--------|------|
//! | `authentication` | Answers `POST /api/auth/login` with a token pair |
//! | `jwt_verification` | Verifies the bearer token, refreshing it in flight when expired |
//! | `authorization` | Applies path access rules (`/api/admin/**` needs `ADMIN`) |
//!
//! ## Error Handling
//!
//! Errors render as `{"error": "...", "code": "..."}`. Authentication
//! failures are uniform (`AUTHENTICATION_FAILED`); an expired session that
//! cannot be refreshed is `REFRESH_INVALID`.

pub mod docs;
pub mod filters;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;
