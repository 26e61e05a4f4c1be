//! Schema building: resolve references, check kinds and enum members, and
//! order derived variables so each is computed after everything it reads.

use std::collections::{HashMap, HashSet};

use crate::types::{
    DerivedDef, EnumDomain, Expr, FactDef, FactKind, FactValue, SCHEMA_VERSION, SchemaDef,
    SchemaError,
};

/// Where a name lives inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Fact(usize),
    Derived(usize),
}

/// Resolved kind of a fact; enum kinds point at a domain index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Bool,
    Enum(usize),
}

/// A fact value checked against its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Value {
    Bool(bool),
    Member(usize),
}

/// A formula with every name resolved to a slot.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Const(bool),
    Fact(usize),
    Derived(usize),
    Is { fact: usize, member: usize },
    Not(Box<Node>),
    Any(Vec<Node>),
    All(Vec<Node>),
    Select {
        cases: Vec<(Node, Node)>,
        fallback: Box<Node>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct FactSlot {
    pub def: FactDef,
    pub kind: Kind,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct DerivedSlot {
    pub def: DerivedDef,
    pub node: Node,
    /// Derived variables this one reads directly.
    pub deps: Vec<usize>,
}

/// An immutable, validated rule table.
///
/// Built once with [`SchemaDef::build`] and shared read-only by any number of
/// evaluations.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    domains: Vec<EnumDomain>,
    pub(crate) facts: Vec<FactSlot>,
    pub(crate) derived: Vec<DerivedSlot>,
    pub(crate) order: Vec<usize>,
    index: HashMap<String, Slot>,
}

impl SchemaDef {
    /// Replace the default of a declared fact. The value is checked when the
    /// schema is built.
    pub fn set_default(&mut self, fact: &str, value: FactValue) -> Result<(), SchemaError> {
        let def = self
            .facts
            .iter_mut()
            .find(|f| f.name == fact)
            .ok_or_else(|| SchemaError::UndeclaredFact(fact.to_string()))?;
        def.default = Some(value);
        Ok(())
    }

    /// Validate the descriptor and produce an immutable [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.version != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion(self.version));
        }

        let mut domain_names = HashSet::new();
        for domain in &self.domains {
            if !domain_names.insert(domain.name.as_str()) {
                return Err(SchemaError::DuplicateDomain(domain.name.clone()));
            }
            let mut members = HashSet::new();
            for member in &domain.members {
                if !members.insert(member.as_str()) {
                    return Err(SchemaError::DuplicateMember {
                        domain: domain.name.clone(),
                        member: member.clone(),
                    });
                }
            }
        }

        let mut index: HashMap<String, Slot> = HashMap::new();
        for (i, fact) in self.facts.iter().enumerate() {
            if index.insert(fact.name.clone(), Slot::Fact(i)).is_some() {
                return Err(SchemaError::DuplicateName(fact.name.clone()));
            }
        }
        for (i, derived) in self.derived.iter().enumerate() {
            if index.insert(derived.name.clone(), Slot::Derived(i)).is_some() {
                return Err(SchemaError::DuplicateName(derived.name.clone()));
            }
        }

        let mut facts = Vec::with_capacity(self.facts.len());
        for def in self.facts {
            let kind = match &def.kind {
                FactKind::Bool => Kind::Bool,
                FactKind::Enum { domain } => self
                    .domains
                    .iter()
                    .position(|d| &d.name == domain)
                    .map(Kind::Enum)
                    .ok_or_else(|| SchemaError::UnknownDomain {
                        fact: def.name.clone(),
                        domain: domain.clone(),
                    })?,
            };
            let default = match &def.default {
                Some(value) => Some(coerce(kind, &self.domains, value).ok_or_else(|| {
                    SchemaError::InvalidDefault {
                        fact: def.name.clone(),
                        value: value.to_string(),
                        expected: def.kind.to_string(),
                    }
                })?),
                None => None,
            };
            facts.push(FactSlot { def, kind, default });
        }

        let mut derived = Vec::with_capacity(self.derived.len());
        for def in self.derived {
            let mut deps = Vec::new();
            let node = {
                let mut compiler = Compiler {
                    variable: &def.name,
                    index: &index,
                    facts: &facts,
                    domains: &self.domains,
                    deps: &mut deps,
                };
                compiler.compile(&def.formula)?
            };
            derived.push(DerivedSlot { def, node, deps });
        }

        let order = topo_order(&derived)?;

        tracing::debug!(
            schema = %self.name,
            facts = facts.len(),
            derived = derived.len(),
            "built schema"
        );

        Ok(Schema {
            name: self.name,
            domains: self.domains,
            facts,
            derived,
            order,
            index,
        })
    }
}

impl Schema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domains(&self) -> &[EnumDomain] {
        &self.domains
    }

    /// Fact descriptors in declaration order, with defaults as built.
    pub fn facts(&self) -> impl Iterator<Item = &FactDef> {
        self.facts.iter().map(|f| &f.def)
    }

    /// Derived variables in evaluation order.
    pub fn evaluation_order(&self) -> impl Iterator<Item = &DerivedDef> {
        self.order.iter().map(|&i| &self.derived[i].def)
    }

    /// Names of the derived variables `name` reads directly.
    pub fn dependencies(&self, name: &str) -> Option<Vec<&str>> {
        match self.index.get(name)? {
            Slot::Derived(i) => Some(
                self.derived[*i]
                    .deps
                    .iter()
                    .map(|&d| self.derived[d].def.name.as_str())
                    .collect(),
            ),
            Slot::Fact(_) => Some(Vec::new()),
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Slot> {
        self.index.get(name).copied()
    }

    /// Check a supplied value against fact `i`.
    pub(crate) fn coerce_fact(&self, i: usize, value: &FactValue) -> Option<Value> {
        coerce(self.facts[i].kind, &self.domains, value)
    }

    /// Render a resolved value back into its external form.
    pub(crate) fn external(&self, i: usize, value: Value) -> FactValue {
        match (self.facts[i].kind, value) {
            (Kind::Enum(d), Value::Member(m)) => FactValue::Label(self.domains[d].members[m].clone()),
            (_, Value::Bool(b)) => FactValue::Bool(b),
            (Kind::Bool, Value::Member(_)) => unreachable!("boolean fact holding an enum member"),
        }
    }
}

fn coerce(kind: Kind, domains: &[EnumDomain], value: &FactValue) -> Option<Value> {
    match (kind, value) {
        (Kind::Bool, FactValue::Bool(b)) => Some(Value::Bool(*b)),
        (Kind::Enum(d), FactValue::Label(label)) => domains[d].position(label).map(Value::Member),
        _ => None,
    }
}

struct Compiler<'a> {
    variable: &'a str,
    index: &'a HashMap<String, Slot>,
    facts: &'a [FactSlot],
    domains: &'a [EnumDomain],
    deps: &'a mut Vec<usize>,
}

impl Compiler<'_> {
    fn compile(&mut self, expr: &Expr) -> Result<Node, SchemaError> {
        Ok(match expr {
            Expr::Const(b) => Node::Const(*b),
            Expr::Var(name) => match self.resolve(name)? {
                Slot::Fact(i) if self.facts[i].kind == Kind::Bool => Node::Fact(i),
                Slot::Fact(_) => return Err(self.mismatch(name, "a boolean")),
                Slot::Derived(i) => {
                    if !self.deps.contains(&i) {
                        self.deps.push(i);
                    }
                    Node::Derived(i)
                }
            },
            Expr::Is { var, value } => match self.resolve(var)? {
                Slot::Fact(i) => match self.facts[i].kind {
                    Kind::Enum(d) => {
                        let domain = &self.domains[d];
                        let member =
                            domain
                                .position(value)
                                .ok_or_else(|| SchemaError::UnknownMember {
                                    variable: self.variable.to_string(),
                                    fact: var.clone(),
                                    domain: domain.name.clone(),
                                    member: value.clone(),
                                })?;
                        Node::Is { fact: i, member }
                    }
                    Kind::Bool => return Err(self.mismatch(var, "an enumeration")),
                },
                Slot::Derived(_) => return Err(self.mismatch(var, "an enumeration")),
            },
            Expr::Not(inner) => Node::Not(Box::new(self.compile(inner)?)),
            Expr::Any(items) => Node::Any(self.compile_all(items)?),
            Expr::All(items) => Node::All(self.compile_all(items)?),
            Expr::Select { cases, fallback } => {
                let mut compiled = Vec::with_capacity(cases.len());
                for case in cases {
                    compiled.push((self.compile(&case.when)?, self.compile(&case.then)?));
                }
                let fallback = match fallback {
                    Some(fb) => self.compile(fb)?,
                    None => Node::Const(false),
                };
                Node::Select {
                    cases: compiled,
                    fallback: Box::new(fallback),
                }
            }
        })
    }

    fn compile_all(&mut self, items: &[Expr]) -> Result<Vec<Node>, SchemaError> {
        items.iter().map(|e| self.compile(e)).collect()
    }

    fn resolve(&self, name: &str) -> Result<Slot, SchemaError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnresolvedReference {
                variable: self.variable.to_string(),
                reference: name.to_string(),
            })
    }

    fn mismatch(&self, name: &str, expected: &str) -> SchemaError {
        SchemaError::KindMismatch {
            variable: self.variable.to_string(),
            reference: name.to_string(),
            expected: expected.to_string(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Depth-first post-order over derived dependencies. Roots are visited in
/// declaration order so the result is stable for a given descriptor.
fn topo_order(derived: &[DerivedSlot]) -> Result<Vec<usize>, SchemaError> {
    fn visit(
        i: usize,
        derived: &[DerivedSlot],
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<(), SchemaError> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Active => return Err(SchemaError::Cycle(derived[i].def.name.clone())),
            Mark::New => {}
        }
        marks[i] = Mark::Active;
        for &dep in &derived[i].deps {
            visit(dep, derived, marks, order)?;
        }
        marks[i] = Mark::Done;
        order.push(i);
        Ok(())
    }

    let mut marks = vec![Mark::New; derived.len()];
    let mut order = Vec::with_capacity(derived.len());
    for i in 0..derived.len() {
        visit(i, derived, &mut marks, &mut order)?;
    }
    Ok(order)
}
