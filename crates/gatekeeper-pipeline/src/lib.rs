//! # Gatekeeper Pipeline
//!
//! A chain of security filters whose execution order is resolved from
//! declared priorities and `runs_before` / `runs_after` constraints, and
//! whose individual filters can be bypassed per request by runtime
//! conditions.
//!
//! - [`condition`]: bypass predicates over a request (path, header, address)
//! - [`path_matcher`]: Ant-style path patterns (`?`, `*`, `**`)
//! - [`filter`]: the [`SecurityFilter`] capability and its [`FilterDescriptor`]
//! - [`order`]: topological resolution of the execution order
//! - [`registry`]: [`FilterRegistry`], the single owner of filters and conditions
//! - [`executor`]: the axum middleware that walks the resolved order
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_pipeline::{FilterRegistry, PipelineExecutor, security_pipeline};
//!
//! let registry = Arc::new(FilterRegistry::new());
//! registry.register(Arc::new(MyFilter::new()))?;
//!
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(
//!         PipelineExecutor::new(registry, false),
//!         security_pipeline,
//!     ));
//! ```

pub mod condition;
pub mod error;
pub mod executor;
pub mod filter;
pub mod order;
pub mod path_matcher;
pub mod registry;
pub mod request;

pub use condition::{AddressMatch, Condition, ConditionInfo, ConditionKind, Predicate};
pub use error::{ConditionError, RegistryError};
pub use executor::{Chain, PipelineExecutor, security_pipeline};
pub use filter::{FilterDescriptor, SecurityFilter};
pub use order::{CycleError, resolve_order};
pub use path_matcher::path_matches;
pub use registry::FilterRegistry;
pub use request::{ClientAddr, RequestView, resolve_client_addr};
