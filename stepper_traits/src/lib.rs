pub mod operation;
pub mod quantity;

pub use operation::{OperationFailure, OperationFuture, ValueOperation};
pub use quantity::Quantity;
