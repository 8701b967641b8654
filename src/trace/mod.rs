/// Trace ingestion: statements, template interning, parsing, grouping
pub mod parser;
pub mod registry;
pub mod statement;
pub mod transaction;

pub use parser::StatementParser;
pub use registry::TemplateRegistry;
pub use statement::Statement;
pub use transaction::{cluster_transactions, is_delimiter, split_transactions, Cluster, Transaction};
