//! # SQL Speculator
//!
//! Builds a predictive model from a SQL workload trace: at any point in a
//! running transaction it names the next statement the application will
//! issue, together with concrete argument values, so a speculative
//! executor can start it before the client asks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sql_speculator::ModelBuilder;
//!
//! let builder = ModelBuilder::from_trace_file("workload.log").unwrap();
//! let model = builder.build_tree_model();
//! let mut predictor = builder.tree_predictor(&model);
//!
//! // Feed observed statements, ask for the next one.
//! for statement in builder.transactions()[0].iter() {
//!     if let Some(next) = predictor.predict_next() {
//!         println!("speculate: {}", next.render(builder.registry()));
//!     }
//!     predictor.move_to_next(statement);
//! }
//! ```
//!
//! ## How it works
//!
//! Arguments of a future statement are rarely fresh values: they echo
//! arguments and result cells of the statements just before it. Training
//! enumerates symbolic operands over a seven-statement window, keeps the
//! ones that reproduce every observed transaction, and stores them either
//! in a per-transaction-shape prediction tree or in a statement graph
//! keyed by the recent template path.

// Internal modules
pub mod algebra;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod predict;
pub mod trace;
pub mod value;

// Public API - Main types users need
pub use config::BuilderConfig;
pub use engine::{EvaluationReport, ModelBuilder};
pub use model::{GraphModel, Prediction, TreeModel};
pub use predict::{GraphPredictor, TreePredictor};
pub use trace::{Statement, StatementParser, TemplateRegistry};
pub use value::{UnorderedSet, Value};

// Re-export commonly used error types
pub use error::{ModelError, ModelResult};
