/// The operand/operation algebra predictions are made of
pub mod operand;
pub mod operation;

pub use operand::{Aggregator, Operand, AGGREGATORS};
pub use operation::{BinaryOperator, Operation, BINARY_OPERATORS};
