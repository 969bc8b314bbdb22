use std::{
    array::TryFromSliceError,
    convert::From,
    num::{ParseIntError, TryFromIntError},
};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatErr {
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),
    #[error("invalid size: {0}")]
    InvalidSize(String),
    #[error("scalar is not invertible")]
    NonInvertibleScalar,
    #[error("{0}")]
    Deserialization(String),
    #[error("{0}")]
    InternalOperation(String),
    #[error("invalid access policy: {0}")]
    InvalidAccessPolicy(String),
    #[error("invalid encrypted data: {0}")]
    InvalidEncryptedData(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("conversion failed")]
    ConversionFailed,
    #[error("error parsing access policy: {0}")]
    ParsingError(ParsingError),
}

impl From<TryFromIntError> for FormatErr {
    fn from(_e: TryFromIntError) -> Self {
        FormatErr::ConversionFailed
    }
}

impl From<TryFromSliceError> for FormatErr {
    fn from(_e: TryFromSliceError) -> Self {
        FormatErr::ConversionFailed
    }
}

impl From<ParseIntError> for FormatErr {
    fn from(_e: ParseIntError) -> Self {
        FormatErr::ConversionFailed
    }
}

impl From<std::string::FromUtf8Error> for FormatErr {
    fn from(e: std::string::FromUtf8Error) -> Self {
        FormatErr::Deserialization(e.to_string())
    }
}

impl From<regex::Error> for FormatErr {
    fn from(e: regex::Error) -> Self {
        ParsingError::RegexError(e).into()
    }
}

impl From<serde_json::Error> for FormatErr {
    fn from(e: serde_json::Error) -> Self {
        FormatErr::InvalidConfiguration(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("{0}")]
    UnexpectedEnd(String),
    #[error("{0}")]
    UnexpectedToken(String),
    #[error("empty string")]
    EmptyString,
    #[error("unbalanced parenthesis in {0}")]
    UnbalancedParenthesis(String),
    #[error("invalid threshold gate: {0}")]
    InvalidThreshold(String),
    #[error("{0}")]
    RegexError(#[from] regex::Error),
}

impl From<ParsingError> for FormatErr {
    fn from(pe: ParsingError) -> Self {
        FormatErr::ParsingError(pe)
    }
}
