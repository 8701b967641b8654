/// Heterogeneous scalar values extracted from a SQL trace
///
/// A trace cell or argument is null, a 64-bit float (the whole numeric
/// domain; integer literals are coerced on parse), a string, or an
/// unordered set of values (from `IN (...)` lists and result columns).
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Tolerance for float comparison. Two numbers closer than this are the
/// same value as far as the model is concerned.
pub const FLOAT_TOLERANCE: f64 = 1e-5;

/// A value observed in a statement's arguments or result rows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Null,
    Num(f64),
    Str(String),
    Set(UnorderedSet),
}

impl Value {
    /// The numeric payload, if this is a number.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// The set payload, if this is a set.
    pub fn as_set(&self) -> Option<&UnorderedSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Num(a), Value::Num(b)) => (a - b).abs() < FLOAT_TOLERANCE,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => {
                0u8.hash(state);
            }
            Value::Num(n) => {
                1u8.hash(state);
                OrderedFloat(*n).hash(state);
            }
            Value::Str(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Set(set) => {
                3u8.hash(state);
                set.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Num(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Set(set) => write!(f, "{}", set),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// An unordered set of values with structural equality
///
/// Insertion deduplicates; equality is containment both ways, independent
/// of insertion order. Sets in practice hold a handful of IN-list elements
/// or one result column, so membership is a linear scan.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnorderedSet {
    elements: Vec<Value>,
}

impl UnorderedSet {
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        let mut set = Self::new();
        for value in values {
            set.insert(value);
        }
        set
    }

    /// Insert a value, keeping the set deduplicated.
    pub fn insert(&mut self, value: Value) {
        if !self.contains(&value) {
            self.elements.push(value);
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.elements.iter().any(|e| e == value)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// First element in insertion order; enumeration uses it to type a set.
    pub fn first(&self) -> Option<&Value> {
        self.elements.first()
    }
}

impl PartialEq for UnorderedSet {
    fn eq(&self, other: &Self) -> bool {
        if self.elements.len() != other.elements.len() {
            return false;
        }
        self.elements.iter().all(|e| other.contains(e))
    }
}

impl Eq for UnorderedSet {}

impl Hash for UnorderedSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: fold element hashes with XOR, then mix in the
        // length so {} and {0.0} differ even if an element hashes to 0.
        let mut acc: u64 = 0;
        for element in &self.elements {
            let mut hasher = fxhash::FxHasher::default();
            element.hash(&mut hasher);
            acc ^= hasher.finish();
        }
        acc.hash(state);
        self.elements.len().hash(state);
    }
}

impl fmt::Display for UnorderedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .elements
            .iter()
            .map(|e| match e {
                Value::Str(s) => format!("'{}'", s),
                other => other.to_string(),
            })
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}
