#![authorize(roles = "user")]

use std::collections::HashMap;

pub mod strings;

/// Integer arithmetic
pub struct IntMath;

/// Two operands of a binary operation
pub struct Operands {
    pub left: i64,
    pub right: i64,
    #[serde(skip)]
    pub trace: Option<String>,
}

pub enum Rounding {
    Down,
    Nearest = 5,
    Up,
}

pub struct Outcome {
    #[required]
    pub value: i64,
    pub rounding: Rounding,
    /// Earlier outcomes this one was derived from
    pub history: Vec<Outcome>,
}

impl IntMath {
    pub fn new() -> Self {
        IntMath
    }

    /// Adds both operands
    pub fn add(&self, operands: Operands) -> Outcome {
        Outcome {
            value: operands.left + operands.right,
            rounding: Rounding::Nearest,
            history: Vec::new(),
        }
    }

    #[authorize(policy = "calculators")]
    pub async fn divide(&self, operands: Operands, rounding: Rounding) -> Result<Outcome, String> {
        if operands.right == 0 {
            return Err("division by zero".to_string());
        }
        Ok(Outcome {
            value: operands.left / operands.right,
            rounding,
            history: Vec::new(),
        })
    }

    #[deprecated = "use add"]
    pub fn plus(&self, left: i64, right: i64) -> i64 {
        left + right
    }

    pub fn totals(&self, values: HashMap<String, i64>) -> Option<i64> {
        values.into_values().reduce(|a, b| a + b)
    }

    fn reset(&self) {}
}

impl Clone for IntMath {
    fn clone(&self) -> Self {
        IntMath
    }
}
