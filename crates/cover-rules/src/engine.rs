//! Evaluate a [`Schema`] against one set of facts.
//!
//! Facts are checked and defaulted into a fresh [`EvaluationContext`], then
//! every derived variable is computed once, in the schema's evaluation order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::schema::{Node, Schema, Slot, Value};
use crate::types::{EvalError, FactValue};

/// Input facts keyed by name.
pub type Facts = HashMap<String, FactValue>;

/// Every derived variable and its value.
pub type Outputs = BTreeMap<String, bool>;

/// What to do with input names the schema does not declare as facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFacts {
    #[default]
    Reject,
    Ignore,
}

/// Per-call evaluation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    pub unknown_facts: UnknownFacts,
}

/// Resolved facts and computed derived values for a single evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'s> {
    schema: &'s Schema,
    facts: Vec<Value>,
    derived: Vec<Option<bool>>,
}

impl<'s> EvaluationContext<'s> {
    /// Check the supplied facts and fill in defaults.
    pub fn new(
        schema: &'s Schema,
        supplied: &Facts,
        options: EvalOptions,
    ) -> Result<Self, EvalError> {
        let mut slots: Vec<Option<Value>> = vec![None; schema.facts.len()];

        // Sorted so the first reported error does not depend on hash order.
        let mut names: Vec<&String> = supplied.keys().collect();
        names.sort();

        for name in names {
            let value = &supplied[name];
            match schema.lookup(name) {
                Some(Slot::Fact(i)) => {
                    let resolved =
                        schema
                            .coerce_fact(i, value)
                            .ok_or_else(|| EvalError::InvalidFact {
                                fact: name.clone(),
                                expected: schema.facts[i].def.kind.to_string(),
                                value: format!("{} ({})", value, value.shape()),
                            })?;
                    slots[i] = Some(resolved);
                }
                Some(Slot::Derived(_)) | None => match options.unknown_facts {
                    UnknownFacts::Reject => return Err(EvalError::UnknownFact(name.clone())),
                    UnknownFacts::Ignore => {
                        tracing::trace!(fact = %name, "ignoring unknown fact");
                    }
                },
            }
        }

        let mut facts = Vec::with_capacity(slots.len());
        for (slot, fact) in slots.into_iter().zip(&schema.facts) {
            match slot.or(fact.default) {
                Some(v) => facts.push(v),
                None => return Err(EvalError::MissingFact(fact.def.name.clone())),
            }
        }

        Ok(Self {
            schema,
            facts,
            derived: vec![None; schema.derived.len()],
        })
    }

    /// The resolved value of a fact, defaults included.
    pub fn fact(&self, name: &str) -> Option<FactValue> {
        match self.schema.lookup(name)? {
            Slot::Fact(i) => Some(self.schema.external(i, self.facts[i])),
            Slot::Derived(_) => None,
        }
    }

    /// A derived value, if it has been computed.
    pub fn derived(&self, name: &str) -> Option<bool> {
        match self.schema.lookup(name)? {
            Slot::Derived(i) => self.derived[i],
            Slot::Fact(_) => None,
        }
    }

    /// All resolved facts keyed by name.
    pub fn facts(&self) -> BTreeMap<String, FactValue> {
        self.schema
            .facts
            .iter()
            .enumerate()
            .map(|(i, f)| (f.def.name.clone(), self.schema.external(i, self.facts[i])))
            .collect()
    }

    /// All computed derived values keyed by name.
    pub fn outputs(&self) -> Outputs {
        self.schema
            .derived
            .iter()
            .zip(&self.derived)
            .filter_map(|(d, v)| v.map(|b| (d.def.name.clone(), b)))
            .collect()
    }

    fn run(&mut self) {
        let schema = self.schema;
        for &i in &schema.order {
            let slot = &schema.derived[i];
            let value = self.eval(&slot.node);
            tracing::debug!(variable = %slot.def.name, value, "derived");
            self.derived[i] = Some(value);
        }
    }

    fn eval(&self, node: &Node) -> bool {
        match node {
            Node::Const(b) => *b,
            Node::Fact(i) => matches!(self.facts[*i], Value::Bool(true)),
            // Evaluation order guarantees dependencies are already set.
            Node::Derived(i) => self.derived[*i].unwrap_or(false),
            Node::Is { fact, member } => self.facts[*fact] == Value::Member(*member),
            Node::Not(inner) => !self.eval(inner),
            Node::Any(items) => items.iter().any(|n| self.eval(n)),
            Node::All(items) => items.iter().all(|n| self.eval(n)),
            Node::Select { cases, fallback } => cases
                .iter()
                .find(|(when, _)| self.eval(when))
                .map(|(_, then)| self.eval(then))
                .unwrap_or_else(|| self.eval(fallback)),
        }
    }
}

/// Outputs together with the context they were computed in.
#[derive(Debug, Clone)]
pub struct Evaluation<'s> {
    pub outputs: Outputs,
    pub context: EvaluationContext<'s>,
}

/// Compute every derived variable for one fact set.
pub fn evaluate(schema: &Schema, facts: &Facts, options: EvalOptions) -> Result<Outputs, EvalError> {
    evaluate_with_context(schema, facts, options).map(|e| e.outputs)
}

/// Like [`evaluate`], also returning the full context for diagnostics.
pub fn evaluate_with_context<'s>(
    schema: &'s Schema,
    facts: &Facts,
    options: EvalOptions,
) -> Result<Evaluation<'s>, EvalError> {
    let mut context = EvaluationContext::new(schema, facts, options)?;
    context.run();
    Ok(Evaluation {
        outputs: context.outputs(),
        context,
    })
}

/// Evaluate independent fact sets; one result per input, in order.
pub fn evaluate_batch(
    schema: &Schema,
    batch: &[Facts],
    options: EvalOptions,
) -> Vec<Result<Outputs, EvalError>> {
    evaluate_batch_with_context(schema, batch, options)
        .into_iter()
        .map(|r| r.map(|e| e.outputs))
        .collect()
}

/// Like [`evaluate_batch`], keeping each evaluation's context.
pub fn evaluate_batch_with_context<'s>(
    schema: &'s Schema,
    batch: &[Facts],
    options: EvalOptions,
) -> Vec<Result<Evaluation<'s>, EvalError>> {
    batch
        .iter()
        .map(|facts| evaluate_with_context(schema, facts, options))
        .collect()
}
