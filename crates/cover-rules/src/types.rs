//! Rule table data model.
//!
//! A rule table is a [`SchemaDef`]: enum domains, input facts and derived
//! variables whose formulas are [`Expr`] trees. Descriptors deserialize from
//! TOML or JSON and are turned into an immutable [`crate::schema::Schema`]
//! by [`SchemaDef::build`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current descriptor format version.
pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// Root structure for `.rules.toml` / `.rules.json` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Name of the rule table.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Descriptor format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Closed enumerations referenced by enum facts.
    #[serde(default)]
    pub domains: Vec<EnumDomain>,

    /// Input facts, in declaration order.
    #[serde(default)]
    pub facts: Vec<FactDef>,

    /// Derived variables, in declaration order.
    #[serde(default)]
    pub derived: Vec<DerivedDef>,

    /// Where this descriptor was loaded from (set by the parser).
    #[serde(skip)]
    pub source: String,
}

/// A closed, ordered set of mutually exclusive labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDomain {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumDomain {
    /// Position of `label` in the domain, if it is a member.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.members.iter().position(|m| m == label)
    }
}

/// The kind of value a fact holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FactKind {
    Bool,
    /// A member of the named domain.
    Enum { domain: String },
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKind::Bool => f.write_str("boolean"),
            FactKind::Enum { domain } => write!(f, "one of {}", domain),
        }
    }
}

/// An externally supplied input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactDef {
    pub name: String,

    #[serde(default)]
    pub label: String,

    pub kind: FactKind,

    /// Value used when the fact is omitted. `None` makes the fact required.
    #[serde(default)]
    pub default: Option<FactValue>,
}

/// A named boolean output computed from a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDef {
    pub name: String,

    #[serde(default)]
    pub label: String,

    pub formula: Expr,
}

/// One arm of a [`Expr::Select`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub when: Expr,
    pub then: Expr,
}

/// A boolean formula.
///
/// `Any` and `All` are plain logical OR / AND over their operands. There is
/// no arithmetic: two true operands of `Any` are still just `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(bool),
    /// A boolean fact or another derived variable.
    Var(String),
    /// Equality of an enum fact against one domain member.
    Is { var: String, value: String },
    Not(Box<Expr>),
    Any(Vec<Expr>),
    All(Vec<Expr>),
    /// First case whose `when` holds wins; `fallback` (default false) otherwise.
    Select {
        cases: Vec<Case>,
        #[serde(default)]
        fallback: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn var(name: &str) -> Self {
        Expr::Var(name.to_string())
    }

    pub fn is(var: &str, value: &str) -> Self {
        Expr::Is {
            var: var.to_string(),
            value: value.to_string(),
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Names of all variables this formula reads, in first-seen order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(name) | Expr::Is { var: name, .. } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Not(inner) => inner.collect_refs(out),
            Expr::Any(items) | Expr::All(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Expr::Select { cases, fallback } => {
                for case in cases {
                    case.when.collect_refs(out);
                    case.then.collect_refs(out);
                }
                if let Some(fb) = fallback {
                    fb.collect_refs(out);
                }
            }
        }
    }
}

/// A fact value as supplied by a caller or a descriptor default.
///
/// Booleans and enum labels are the only valid shapes; anything else is kept
/// so the evaluator can report it as an invalid fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Label(String),
    Other(serde_json::Value),
}

impl FactValue {
    /// Parse a command-line style value: `true`/`false` are booleans,
    /// everything else is a label.
    pub fn parse_loose(s: &str) -> Self {
        match s {
            "true" => FactValue::Bool(true),
            "false" => FactValue::Bool(false),
            other => FactValue::Label(other.to_string()),
        }
    }

    /// Short description of the value's shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            FactValue::Bool(_) => "boolean",
            FactValue::Label(_) => "string",
            FactValue::Other(v) => match v {
                serde_json::Value::Null => "null",
                serde_json::Value::Number(_) => "number",
                serde_json::Value::Array(_) => "array",
                serde_json::Value::Object(_) => "object",
                _ => "value",
            },
        }
    }
}

impl From<bool> for FactValue {
    fn from(b: bool) -> Self {
        FactValue::Bool(b)
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        FactValue::Label(s.to_string())
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Bool(b) => write!(f, "{}", b),
            FactValue::Label(s) => f.write_str(s),
            FactValue::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Errors detected while building a schema.
///
/// Each variant names the variable at fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate variable name: {0}")]
    DuplicateName(String),

    #[error("duplicate domain name: {0}")]
    DuplicateDomain(String),

    #[error("domain '{domain}' lists member '{member}' more than once")]
    DuplicateMember { domain: String, member: String },

    #[error("default override for undeclared fact '{0}'")]
    UndeclaredFact(String),

    #[error("fact '{fact}' uses undeclared domain '{domain}'")]
    UnknownDomain { fact: String, domain: String },

    #[error("fact '{fact}' has invalid default '{value}': expected {expected}")]
    InvalidDefault {
        fact: String,
        value: String,
        expected: String,
    },

    #[error("'{variable}' references undeclared variable '{reference}'")]
    UnresolvedReference { variable: String, reference: String },

    #[error("'{variable}' uses '{reference}' as {expected}")]
    KindMismatch {
        variable: String,
        reference: String,
        expected: String,
    },

    #[error("'{variable}' compares '{fact}' against '{member}', which is not a member of {domain}")]
    UnknownMember {
        variable: String,
        fact: String,
        domain: String,
        member: String,
    },

    #[error("dependency cycle involving derived variable '{0}'")]
    Cycle(String),

    #[error("unsupported schema version {0} (expected {SCHEMA_VERSION})")]
    UnsupportedVersion(u32),
}

/// Errors reported for a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("missing required fact: {0}")]
    MissingFact(String),

    #[error("invalid value {value} for fact '{fact}': expected {expected}")]
    InvalidFact {
        fact: String,
        expected: String,
        value: String,
    },

    #[error("unknown fact: {0}")]
    UnknownFact(String),
}

/// Errors loading a rule table from disk.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
