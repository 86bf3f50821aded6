/// BCH SDK - Transaction wire model and signature hash computation.
///
/// Provides the Transaction type with inputs, outputs, binary/hex
/// serialization, transaction ID computation, and the BIP143-with-FORKID
/// signature hash.

pub mod input;
pub mod output;
pub mod sighash;
pub mod transaction;

mod error;
pub use error::TransactionError;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use transaction::Transaction;
