// ============================================================================
// Link Validation Framework
// ============================================================================

use crate::ids::LinkId;
use crate::port::PortOptions;
use std::fmt;

/// Everything a node gets to see when deciding on a connection.
///
/// "Other" is the port the pending link started from; the unprefixed fields
/// describe the port on the validating node. Link lists exclude the pending
/// link itself.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionRequest<'a> {
    pub other_options: &'a PortOptions,
    pub options: &'a PortOptions,
    pub other_count: usize,
    pub count: usize,
    pub other_links: &'a [LinkId],
    pub links: &'a [LinkId],
}

/// Result of link validation with optional rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Link is valid
    Valid,
    /// Link is invalid with a reason
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Check if the result is valid
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

impl From<bool> for ValidationResult {
    fn from(valid: bool) -> Self {
        if valid {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::Rejected)
        }
    }
}

/// Reasons why a connection was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cannot link a port to itself
    SamePort,
    /// Port has reached maximum connections
    MaxConnectionsReached { max: usize },
    /// Ports disagree on a compatibility option
    OptionMismatch { key: String },
    /// A predicate said no without giving a reason
    Rejected,
    /// Custom validation failure
    Custom(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePort => write!(f, "Cannot link port to itself"),
            Self::MaxConnectionsReached { max } => {
                write!(f, "Port has reached max {} connections", max)
            }
            Self::OptionMismatch { key } => write!(f, "Ports disagree on option '{}'", key),
            Self::Rejected => write!(f, "Connection rejected"),
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// Trait for custom link validation logic.
///
/// Closures taking a [`ConnectionRequest`] implement it too:
///
/// ```
/// use slint_node_graph::{ConnectionRequest, LinkValidator, ValidationResult};
///
/// let no_fan_in = |req: &ConnectionRequest<'_>| ValidationResult::from(req.count == 0);
/// # fn takes<V: LinkValidator>(_: V) {}
/// takes(no_fan_in);
/// ```
pub trait LinkValidator {
    fn validate(&self, request: &ConnectionRequest<'_>) -> ValidationResult;
}

impl<F> LinkValidator for F
where
    F: Fn(&ConnectionRequest<'_>) -> ValidationResult,
{
    fn validate(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        self(request)
    }
}

/// Accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl LinkValidator for AllowAll {
    fn validate(&self, _request: &ConnectionRequest<'_>) -> ValidationResult {
        ValidationResult::Valid
    }
}

/// Limits how many links may end at the validating node's port.
#[derive(Clone, Copy, Debug)]
pub struct MaxConnections {
    max: usize,
}

impl MaxConnections {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl LinkValidator for MaxConnections {
    fn validate(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        if request.count >= self.max {
            ValidationResult::Invalid(ValidationError::MaxConnectionsReached { max: self.max })
        } else {
            ValidationResult::Valid
        }
    }
}

/// Requires both ports to carry the same value under `key` (e.g. a data type).
#[derive(Clone, Debug)]
pub struct MatchingOption {
    key: String,
}

impl MatchingOption {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl LinkValidator for MatchingOption {
    fn validate(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        match (request.other_options.get(&self.key), request.options.get(&self.key)) {
            (Some(a), Some(b)) if a == b => ValidationResult::Valid,
            _ => ValidationResult::Invalid(ValidationError::OptionMismatch {
                key: self.key.clone(),
            }),
        }
    }
}

/// Composite validator that combines multiple validators
///
/// All validators must return Valid for the link to be valid (AND logic).
/// Returns the first error encountered (short-circuits on failure).
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn LinkValidator>>,
}

impl CompositeValidator {
    /// Create a new empty composite validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator; validators run in the order they were added.
    pub fn add<V: LinkValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl LinkValidator for CompositeValidator {
    fn validate(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        for v in &self.validators {
            let result = v.validate(request);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

impl fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
