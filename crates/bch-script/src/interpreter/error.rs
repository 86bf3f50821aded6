//! Verification error types.

use std::fmt;

/// Error codes for script verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterErrorCode {
    InvalidFlags,
    EvalFalse,
    EarlyReturn,
    BadOpcode,
    MalformedPush,
    ElementTooBig,
    InvalidStackOperation,
    MinimalData,
    Verify,
    EqualVerify,
    CheckSigVerify,
    CheckMultiSigVerify,
    InvalidPubKeyCount,
    InvalidSignatureCount,
    SigNullDummy,
    PubKeyType,
    CleanStack,
    NullFail,
    NotPushOnly,
    DiscourageUpgradableNOPs,
    InvalidSigHashType,
    IllegalForkID,
    SigTooShort,
    SigTooLong,
    SigInvalidSeqID,
    SigInvalidDataLen,
    SigMissingSTypeID,
    SigMissingSLen,
    SigInvalidSLen,
    SigInvalidRIntID,
    SigZeroRLen,
    SigNegativeR,
    SigTooMuchRPadding,
    SigInvalidSIntID,
    SigZeroSLen,
    SigNegativeS,
    SigTooMuchSPadding,
    SigHighS,
}

impl fmt::Display for InterpreterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A script verification error with an error code and description.
#[derive(Debug, Clone)]
pub struct InterpreterError {
    /// The machine-readable failure code.
    pub code: InterpreterErrorCode,
    /// Human-readable description of the failure.
    pub description: String,
}

impl InterpreterError {
    /// Create a new error with the given code and description.
    pub fn new(code: InterpreterErrorCode, description: String) -> Self {
        InterpreterError { code, description }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl std::error::Error for InterpreterError {}
