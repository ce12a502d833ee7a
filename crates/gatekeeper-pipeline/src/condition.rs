//! Bypass conditions.
//!
//! A condition attached to a filter says "skip this filter for requests
//! like this one". Evaluation is a pure function of the predicate and the
//! request; the only mutable state is the `enabled` flag, which an
//! operator may flip at runtime.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::{HeaderName, Method};
use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ConditionError;
use crate::path_matcher::path_matches;
use crate::request::RequestView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Path,
    Header,
    Address,
    /// Synthetic condition installed by a filter status toggle.
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMatch {
    Exact(IpAddr),
    Range(IpNet),
}

impl AddressMatch {
    /// Parses a literal address (`10.0.0.1`) or a CIDR block (`10.0.0.0/8`).
    pub fn parse(value: &str) -> Result<Self, ConditionError> {
        let value = value.trim();
        if value.contains('/') {
            value
                .parse::<IpNet>()
                .map(Self::Range)
                .map_err(|_| ConditionError(format!("invalid CIDR block: {value}")))
        } else {
            value
                .parse::<IpAddr>()
                .map(Self::Exact)
                .map_err(|_| ConditionError(format!("invalid address: {value}")))
        }
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        match self {
            Self::Exact(expected) => expected == addr,
            Self::Range(network) => network.contains(addr),
        }
    }
}

impl std::fmt::Display for AddressMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(addr) => write!(f, "{addr}"),
            Self::Range(network) => write!(f, "{network}"),
        }
    }
}

#[derive(Debug)]
pub enum Predicate {
    /// Any pattern matches the path AND (no methods listed OR the method is listed).
    Path {
        patterns: Vec<String>,
        methods: Vec<Method>,
    },
    /// Header present, and its value fully matches `pattern` when one is set.
    Header {
        name: HeaderName,
        pattern: Option<Regex>,
        source: Option<String>,
    },
    Address(AddressMatch),
    /// Matches every request.
    Always,
    /// Matches no request.
    Never,
}

impl Predicate {
    fn kind(&self) -> ConditionKind {
        match self {
            Self::Path { .. } => ConditionKind::Path,
            Self::Header { .. } => ConditionKind::Header,
            Self::Address(_) => ConditionKind::Address,
            Self::Always | Self::Never => ConditionKind::Static,
        }
    }

    fn matches(&self, request: &RequestView<'_>) -> bool {
        match self {
            Self::Path { patterns, methods } => {
                patterns.iter().any(|p| path_matches(p, request.path))
                    && (methods.is_empty() || methods.contains(request.method))
            }
            // Only the first value of a repeated header is considered.
            Self::Header { name, pattern, .. } => match (request.headers.get(name), pattern) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(value), Some(regex)) => value.to_str().is_ok_and(|v| regex.is_match(v)),
            },
            Self::Address(expected) => request
                .remote_addr
                .is_some_and(|addr| expected.contains(&addr)),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Serialisable snapshot of a condition, used by the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub description: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// For static conditions: whether the owning filter is skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skips: Option<bool>,
}

#[derive(Debug)]
pub struct Condition {
    id: String,
    description: String,
    enabled: AtomicBool,
    predicate: Predicate,
}

impl Condition {
    /// Creates an enabled condition with a generated id.
    pub fn new(predicate: Predicate, description: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), predicate, description)
    }

    pub fn with_id(
        id: impl Into<String>,
        predicate: Predicate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            enabled: AtomicBool::new(true),
            predicate,
        }
    }

    /// Path condition over Ant patterns, optionally restricted to `methods`.
    pub fn path<S: AsRef<str>>(
        patterns: &[S],
        methods: &[S],
        description: impl Into<String>,
    ) -> Result<Self, ConditionError> {
        let patterns: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Err(ConditionError(
                "path condition needs at least one pattern".to_string(),
            ));
        }

        let methods = methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.as_ref().trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| ConditionError(format!("invalid method: {}", m.as_ref())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(Predicate::Path { patterns, methods }, description))
    }

    /// Header condition. An empty or absent `pattern` matches on presence alone.
    pub fn header(
        name: &str,
        pattern: Option<&str>,
        description: impl Into<String>,
    ) -> Result<Self, ConditionError> {
        let name = HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
            .map_err(|_| ConditionError(format!("invalid header name: {name}")))?;

        let source = pattern.map(str::trim).filter(|p| !p.is_empty());
        let regex = source
            .map(|p| {
                Regex::new(&format!("^(?:{p})$"))
                    .map_err(|e| ConditionError(format!("invalid header pattern: {e}")))
            })
            .transpose()?;

        Ok(Self::new(
            Predicate::Header {
                name,
                pattern: regex,
                source: source.map(str::to_string),
            },
            description,
        ))
    }

    /// Address condition over a literal IP or a CIDR block.
    pub fn address(value: &str, description: impl Into<String>) -> Result<Self, ConditionError> {
        Ok(Self::new(
            Predicate::Address(AddressMatch::parse(value)?),
            description,
        ))
    }

    /// Replaces the generated id, for conditions that must be addressable by name.
    pub fn named(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn always_skip(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(id, Predicate::Always, description)
    }

    pub fn never_skip(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(id, Predicate::Never, description)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ConditionKind {
        self.predicate.kind()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Whether the predicate holds for `request`, ignoring the enabled flag.
    pub fn matches(&self, request: &RequestView<'_>) -> bool {
        self.predicate.matches(request)
    }

    /// Whether this condition causes its filter to be skipped. A disabled
    /// condition never does.
    pub fn should_skip(&self, request: &RequestView<'_>) -> bool {
        self.is_enabled() && self.matches(request)
    }

    pub fn info(&self) -> ConditionInfo {
        let mut info = ConditionInfo {
            id: self.id.clone(),
            kind: self.kind(),
            description: self.description.clone(),
            enabled: self.is_enabled(),
            patterns: None,
            methods: None,
            header: None,
            value_pattern: None,
            address: None,
            skips: None,
        };

        match &self.predicate {
            Predicate::Path { patterns, methods } => {
                info.patterns = Some(patterns.clone());
                info.methods = Some(methods.iter().map(|m| m.to_string()).collect());
            }
            Predicate::Header { name, source, .. } => {
                info.header = Some(name.to_string());
                info.value_pattern = source.clone();
            }
            Predicate::Address(address) => info.address = Some(address.to_string()),
            Predicate::Always => info.skips = Some(true),
            Predicate::Never => info.skips = Some(false),
        }

        info
    }
}
