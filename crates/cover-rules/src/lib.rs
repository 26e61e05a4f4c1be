//! Vehicle coverage rules.
//!
//! A rule table declares boolean and enumerated input facts plus derived
//! boolean variables computed from them. [`SchemaDef::build`] validates a
//! table once into an immutable [`Schema`]; [`evaluate`] then computes every
//! derived variable for one set of facts. The built-in vehicle coverage table
//! lives in [`vehicles`].

pub mod engine;
pub mod parser;
pub mod schema;
pub mod types;
pub mod vehicles;

pub use engine::{
    EvalOptions, Evaluation, EvaluationContext, Facts, Outputs, UnknownFacts, evaluate,
    evaluate_batch, evaluate_batch_with_context, evaluate_with_context,
};
pub use schema::Schema;
pub use types::{
    Case, DerivedDef, EnumDomain, EvalError, Expr, FactDef, FactKind, FactValue, RulesError,
    SchemaDef, SchemaError,
};
pub use vehicles::ProcurementType;
