//! Module-level values: scalars and tuples.

use std::fmt;

use crate::operand::Operand;
use crate::scalar::Scalar;

/// A constant-pool or global-data value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Tuple(Tuple),
}

/// A tuple value.
///
/// Elements are [`Operand`]s, not plain scalars: the tuple a `call` passes
/// as its actual-argument pack may reference SSA locals, and lifetime
/// analysis walks into those references.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    pub elements: Vec<Operand>,
}

impl Tuple {
    pub fn new(elements: Vec<Operand>) -> Self {
        Tuple { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Value {
    /// The scalar payload, if this is a scalar value.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(scalar) => Some(*scalar),
            Value::Tuple(_) => None,
        }
    }

    /// The tuple payload, if this is a tuple value.
    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            Value::Tuple(tuple) => Some(tuple),
            Value::Scalar(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(scalar) => write!(f, "{scalar}"),
            Value::Tuple(tuple) => {
                write!(f, "(")?;
                for (i, element) in tuple.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
        }
    }
}
