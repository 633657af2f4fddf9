use crate::ast::{Expr, Stmt};
use crate::table::Table;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A native operation: takes the evaluated arguments, returns a value or a
/// diagnostic message (which the evaluator turns into a runtime error at the
/// call site).
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A function parameter with an optional default expression.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// A user function definition. Shared by reference between the registry,
/// class method tables, and any function values in flight.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// Runtime values. Numbers keep an integer/double split internally -- both
/// report as type "number" and compare by numeric value, but integer
/// arithmetic stays integral (`10 / 3` is `3`) while anything touched by a
/// decimal divides as IEEE-754 (`10.0 / 4` is `2.5`).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    /// Arrays share their backing storage; pushing through one handle is
    /// visible through every other.
    Array(Rc<RefCell<Vec<Value>>>),
    /// Objects share their backing table. Class instances rely on this so
    /// that `this` mutations in methods are visible to the caller.
    Object(Rc<RefCell<Table>>),
    Function(Rc<FuncDef>),
    Builtin(NativeFn),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(table: Table) -> Value {
        Value::Object(Rc::new(RefCell::new(table)))
    }

    /// Either numeric variant, widened to a double.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Double(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Object(_) => true,
            Value::Function(_) => true,
            Value::Builtin(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "number",
            Value::Double(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Builtin(_) => "function",
        }
    }

    fn write_rendered(&self, f: &mut fmt::Formatter, nested: bool) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => write_double(f, *n),
            Value::Str(s) => {
                // Strings render bare at top level but quoted when they sit
                // inside an array or object rendering.
                if nested {
                    write!(f, "\"{}\"", s)
                } else {
                    f.write_str(s)
                }
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_rendered(f, true)?;
                }
                write!(f, "]")
            }
            Value::Object(table) => {
                write!(f, "{{")?;
                for (i, (key, value)) in table.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.write_rendered(f, true)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Builtin(_) => write!(f, "<builtin>"),
        }
    }
}

/// Doubles that are exactly representable integers print without a decimal
/// point; everything else (including NaN and infinities) uses the shortest
/// float form.
fn write_double(f: &mut fmt::Formatter, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && (-1e15..=1e15).contains(&n) {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_rendered(f, false)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Int(l), Value::Int(r)) => l == r,
            (Value::Double(l), Value::Double(r)) => l == r,
            (Value::Int(l), Value::Double(r)) => (*l as f64) == *r,
            (Value::Double(l), Value::Int(r)) => *l == (*r as f64),
            (Value::Str(l), Value::Str(r)) => l == r,
            // Aggregates compare by identity, not structure.
            (Value::Array(l), Value::Array(r)) => Rc::ptr_eq(l, r),
            (Value::Object(l), Value::Object(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}
