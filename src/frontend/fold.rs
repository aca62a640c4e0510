use crate::frontend::ast::{BinaryOperator, ConstantKind, Expression, ExpressionKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    DivisionByZero,
    NotConstant,
    OutOfRange,
}

impl fmt::Display for FoldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            FoldError::DivisionByZero => "division by zero",
            FoldError::NotConstant => "not a compile-time constant",
            FoldError::OutOfRange => "constant out of range",
        };
        write!(f, "{}", text)
    }
}

/// Evaluates an expression as a signed 32-bit integer with wrapping
/// arithmetic. Identifiers, array indexing, string literals and shifts are
/// not compile-time constants.
pub fn evaluate(expr: &Expression) -> Result<i32, FoldError> {
    match &expr.kind {
        ExpressionKind::Constant { kind, value } => match kind {
            ConstantKind::Decimal => parse_decimal(value),
            ConstantKind::Hexadecimal => parse_hex(value),
            ConstantKind::Character => {
                Ok(value.as_bytes().first().copied().unwrap_or(0) as i32)
            }
            ConstantKind::String => Err(FoldError::NotConstant),
        },
        ExpressionKind::Binary { op, left, right } => {
            let left = evaluate(left)?;
            let right = evaluate(right)?;
            apply(*op, left, right)
        }
        ExpressionKind::Identifier(_) | ExpressionKind::Index { .. } => {
            Err(FoldError::NotConstant)
        }
    }
}

fn apply(op: BinaryOperator, left: i32, right: i32) -> Result<i32, FoldError> {
    match op {
        BinaryOperator::Add => Ok(left.wrapping_add(right)),
        BinaryOperator::Sub => Ok(left.wrapping_sub(right)),
        BinaryOperator::Mul => Ok(left.wrapping_mul(right)),
        BinaryOperator::Div => {
            if right == 0 {
                Err(FoldError::DivisionByZero)
            } else {
                Ok(left.wrapping_div(right))
            }
        }
        BinaryOperator::Mod => {
            if right == 0 {
                Err(FoldError::DivisionByZero)
            } else {
                Ok(left.wrapping_rem(right))
            }
        }
        BinaryOperator::Eq => Ok((left == right) as i32),
        BinaryOperator::Neq => Ok((left != right) as i32),
        BinaryOperator::Lt => Ok((left < right) as i32),
        BinaryOperator::Le => Ok((left <= right) as i32),
        BinaryOperator::Gt => Ok((left > right) as i32),
        BinaryOperator::Ge => Ok((left >= right) as i32),
        BinaryOperator::Shl | BinaryOperator::Shr => Err(FoldError::NotConstant),
    }
}

fn parse_decimal(text: &str) -> Result<i32, FoldError> {
    // The lexer caps lexemes at ten digits, so an i64 parse cannot overflow;
    // the range check against i32 is what matters.
    let value: i64 = text.parse().map_err(|_| FoldError::OutOfRange)?;
    i32::try_from(value).map_err(|_| FoldError::OutOfRange)
}

fn parse_hex(text: &str) -> Result<i32, FoldError> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);

    let magnitude = i64::from_str_radix(digits, 16).map_err(|_| FoldError::OutOfRange)?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).map_err(|_| FoldError::OutOfRange)
}
