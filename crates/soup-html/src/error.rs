use thiserror::Error;

/// A character reference that could not be decoded. Aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// `&code;` where `code` is not a named reference.
    #[error("Couldn't decode &{code};")]
    UnknownEntity {
        /// The code between `&` and `;`.
        code: String,
    },

    /// `&#code;` where the digits after `#` (or `#x`) do not form a number.
    #[error("Malformed numeric character reference &{code};")]
    MalformedNumeric {
        /// The code between `&` and `;`, including the leading `#`.
        code: String,
    },
}
