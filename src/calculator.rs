//! Scientific calculator with an in-memory history of evaluated entries

use std::fmt::Display;

use log::debug;

use crate::errors::Error;

/// Operations taking two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`; a zero divisor is rejected
    Divide,
    /// `a ^ b`
    Exponent,
}

impl BinaryOp {
    /// The symbol written between the operands in history entries
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Exponent => "^",
        }
    }

    fn apply(self, a: f64, b: f64) -> Result<f64, Error> {
        Ok(match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide if b == 0.0 => return Err(Error::DivisionByZero),
            BinaryOp::Divide => a / b,
            BinaryOp::Exponent => a.powf(b),
        })
    }
}

/// Operations taking one operand. Trigonometric functions take degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `√a`; negative operands are rejected
    SquareRoot,
    /// `sin(a)`
    Sin,
    /// `cos(a)`
    Cos,
    /// `tan(a)`
    Tan,
}

impl UnaryOp {
    fn apply(self, a: f64) -> Result<f64, Error> {
        Ok(match self {
            UnaryOp::SquareRoot if a < 0.0 => {
                return Err(Error::InputInvalid(
                    "Cannot take square root of negative number.".to_owned(),
                ))
            }
            UnaryOp::SquareRoot => a.sqrt(),
            UnaryOp::Sin => a.to_radians().sin(),
            UnaryOp::Cos => a.to_radians().cos(),
            UnaryOp::Tan => a.to_radians().tan(),
        })
    }

    fn entry(self, a: f64, result: f64) -> String {
        match self {
            UnaryOp::SquareRoot => format!("√{a} = {result}"),
            UnaryOp::Sin => format!("sin({a}) = {result}"),
            UnaryOp::Cos => format!("cos({a}) = {result}"),
            UnaryOp::Tan => format!("tan({a}) = {result}"),
        }
    }
}

/// Parses a form field as a number.
fn parse_operand(field: &str, message: &str) -> Result<f64, Error> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::InputInvalid(message.to_owned()))
}

/// Evaluates operations on raw input fields, remembering each success.
///
/// Failed evaluations are reported and leave the history as it was.
#[derive(Debug, Default, Clone)]
pub struct Calculator {
    history: Vec<String>,
}

impl Calculator {
    /// Creates a calculator with an empty history
    #[must_use]
    pub fn new() -> Self {
        Calculator::default()
    }

    /// Evaluates `a op b`, recording `"{a} {symbol} {b} = {result}"`.
    /// # Errors
    /// [`Error::InputInvalid`] if either field is not a number, [`Error::DivisionByZero`]
    /// for a zero divisor
    pub fn binary(&mut self, op: BinaryOp, a: &str, b: &str) -> Result<f64, Error> {
        let a = parse_operand(a, "Please enter valid numbers.")?;
        let b = parse_operand(b, "Please enter valid numbers.")?;
        let result = op.apply(a, b)?;
        self.record(format!("{a} {} {b} = {result}", op.symbol()));
        Ok(result)
    }

    /// Evaluates `op(a)`, recording an entry such as `"sin(30) = 0.49999999999999994"`.
    /// # Errors
    /// [`Error::InputInvalid`] if the field is not a number or is negative for a square root
    pub fn unary(&mut self, op: UnaryOp, a: &str) -> Result<f64, Error> {
        let a = parse_operand(a, "Please enter a valid number.")?;
        let result = op.apply(a)?;
        self.record(op.entry(a, result));
        Ok(result)
    }

    fn record(&mut self, entry: String) {
        debug!("Calculated {entry}");
        self.history.push(entry);
    }

    /// Every successful evaluation, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Forgets the history
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Display for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.history {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
