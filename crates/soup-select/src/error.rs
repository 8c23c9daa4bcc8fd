use thiserror::Error;

use crate::selector::AttributeOperator;

/// A selector string that could not be compiled. Aborts the `select` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The argument of an `nth-*` pseudo-class is not `even`, `odd`, an
    /// integer or an `An+B` expression.
    #[error("Invalid nth expression: {query}")]
    InvalidNth {
        /// The argument as written.
        query: String,
    },

    /// A pseudo-class the matcher does not implement.
    #[error("Unknown pseudo-selector: {pseudo}")]
    UnknownPseudoClass {
        /// The pseudo-class as written, without the leading `:`.
        pseudo: String,
    },

    /// An attribute matcher whose operator compares against a value was
    /// built without one.
    #[error("Value not specified for [{attribute}{operator}]")]
    MissingAttributeValue {
        /// The attribute name.
        attribute: String,
        /// The comparison operator.
        operator: AttributeOperator,
    },

    /// The whole-word pattern for a `~=` matcher failed to build.
    #[error("Invalid word pattern for [{attribute}~={value}]: {reason}")]
    InvalidWordPattern {
        /// The attribute name.
        attribute: String,
        /// The word being searched for.
        value: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}
