use sbstcmp::frontend::ast::{BinaryOperator, ConstantKind, Expression, ExpressionKind};
use sbstcmp::frontend::fold::{FoldError, evaluate};
use sbstcmp::frontend::token::Pos;

fn constant(kind: ConstantKind, value: &str) -> Expression {
    Expression::new(
        Pos { line: 1, column: 1 },
        ExpressionKind::Constant {
            kind,
            value: value.to_string(),
        },
    )
}

fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::new(
        left.pos,
        ExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    )
}

fn decimal(value: &str) -> Expression {
    constant(ConstantKind::Decimal, value)
}

#[test]
fn constants_evaluate() {
    assert_eq!(evaluate(&decimal("42")), Ok(42));
    assert_eq!(evaluate(&decimal("-42")), Ok(-42));
    assert_eq!(evaluate(&constant(ConstantKind::Hexadecimal, "0x10")), Ok(16));
    assert_eq!(evaluate(&constant(ConstantKind::Hexadecimal, "0X7FFFFFFF")), Ok(i32::MAX));
    assert_eq!(evaluate(&constant(ConstantKind::Hexadecimal, "-0x10")), Ok(-16));
    assert_eq!(evaluate(&constant(ConstantKind::Character, "a")), Ok(97));
    assert_eq!(evaluate(&constant(ConstantKind::Character, "\n")), Ok(10));
}

#[test]
fn arithmetic_and_comparisons() {
    let sum = binary(BinaryOperator::Add, decimal("2"), decimal("3"));
    assert_eq!(evaluate(&sum), Ok(5));

    let quotient = binary(BinaryOperator::Div, decimal("7"), decimal("2"));
    assert_eq!(evaluate(&quotient), Ok(3));

    let remainder = binary(BinaryOperator::Mod, decimal("7"), decimal("2"));
    assert_eq!(evaluate(&remainder), Ok(1));

    let less = binary(BinaryOperator::Lt, decimal("1"), decimal("2"));
    assert_eq!(evaluate(&less), Ok(1));

    let equal = binary(BinaryOperator::Eq, decimal("1"), decimal("2"));
    assert_eq!(evaluate(&equal), Ok(0));
}

#[test]
fn arithmetic_wraps() {
    let overflow = binary(
        BinaryOperator::Add,
        constant(ConstantKind::Hexadecimal, "0x7FFFFFFF"),
        decimal("1"),
    );
    assert_eq!(evaluate(&overflow), Ok(i32::MIN));

    let product = binary(BinaryOperator::Mul, decimal("65536"), decimal("65536"));
    assert_eq!(evaluate(&product), Ok(0));
}

#[test]
fn division_by_zero_is_trapped() {
    let division = binary(BinaryOperator::Div, decimal("1"), decimal("0"));
    assert_eq!(evaluate(&division), Err(FoldError::DivisionByZero));

    let remainder = binary(BinaryOperator::Mod, decimal("1"), decimal("0"));
    assert_eq!(evaluate(&remainder), Err(FoldError::DivisionByZero));
}

#[test]
fn out_of_range_constants() {
    assert_eq!(evaluate(&decimal("9999999999")), Err(FoldError::OutOfRange));
    assert_eq!(
        evaluate(&constant(ConstantKind::Hexadecimal, "0xFFFFFFFF")),
        Err(FoldError::OutOfRange)
    );
}

#[test]
fn non_constants_are_rejected() {
    let name = Expression::new(
        Pos { line: 1, column: 1 },
        ExpressionKind::Identifier("n".to_string()),
    );
    assert_eq!(evaluate(&name), Err(FoldError::NotConstant));

    let string = constant(ConstantKind::String, "hi");
    assert_eq!(evaluate(&string), Err(FoldError::NotConstant));

    let shift = binary(BinaryOperator::Shl, decimal("1"), decimal("4"));
    assert_eq!(evaluate(&shift), Err(FoldError::NotConstant));
}

#[test]
fn folding_is_deterministic() {
    let expr = binary(
        BinaryOperator::Mul,
        binary(BinaryOperator::Add, decimal("2"), decimal("3")),
        constant(ConstantKind::Character, "a"),
    );
    assert_eq!(evaluate(&expr), evaluate(&expr));
    assert_eq!(evaluate(&expr), Ok(485));

    let failing = binary(BinaryOperator::Div, decimal("1"), decimal("0"));
    assert_eq!(evaluate(&failing), evaluate(&failing));
}
