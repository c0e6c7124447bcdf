//! Expression evaluation.
//!
//! Walks the syntax tree produced by the parser and resolves every operator,
//! constant and function through closed `match` tables. Nothing outside those
//! tables can be reached from user input.

use std::f64::consts::{E, PI};

use tracing::debug;

use super::error::{ErrorKind, EvalError};
use super::format::format_value;
use super::parser::{BinaryOp, Node, UnaryOp, parse};
use super::sanitize::sanitize;

/// Evaluate a user supplied expression and return its canonical rendering.
///
/// Blank input evaluates to `"0"`. Every internal failure is folded into one
/// of the two [`ErrorKind`]s.
pub fn evaluate_expression(input: &str) -> Result<String, ErrorKind> {
    evaluate(input)
        .inspect_err(|err| debug!(expression = input, error = %err, "rejected expression"))
        .map_err(ErrorKind::from)
}

fn evaluate(input: &str) -> Result<String, EvalError> {
    let Some(text) = sanitize(input)? else {
        return Ok("0".to_string());
    };

    let tree = parse(&text)?;
    let value = eval_node(&tree)?;
    format_value(value)
}

/// Compute the value of a syntax tree.
///
/// Division and modulo by zero are left to produce infinities or NaN; the
/// formatter decides how those are reported.
pub fn eval_node(node: &Node) -> Result<f64, EvalError> {
    match node {
        Node::Number(value) => Ok(*value),
        Node::Identifier(name) => constant(name),
        Node::Unary { op, operand } => {
            let value = eval_node(operand)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Pos => value,
            })
        }
        Node::Binary { op, left, right } => {
            let left = eval_node(left)?;
            let right = eval_node(right)?;
            apply_binary(*op, left, right)
        }
        Node::Call { name, args } => {
            let function = Function::lookup(name)
                .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
            let args = args.iter().map(eval_node).collect::<Result<Vec<_>, _>>()?;
            function.call(&args)
        }
    }
}

fn constant(name: &str) -> Result<f64, EvalError> {
    match name {
        "pi" => Ok(PI),
        "e" => Ok(E),
        _ => Err(EvalError::UnknownIdentifier(name.to_string())),
    }
}

fn apply_binary(op: BinaryOp, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div => Ok(left / right),
        BinaryOp::Mod => Ok(floored_mod(left, right)),
        BinaryOp::Pow => {
            let value = left.powf(right);
            // 0^-1 is a division by zero; 10^400 is not.
            if value.is_infinite() && left.is_finite() && right.is_finite() && left != 0.0 {
                return Err(EvalError::Overflow);
            }
            Ok(value)
        }
    }
}

/// Remainder carrying the sign of the divisor, so `-7 % 3 == 2`.
fn floored_mod(left: f64, right: f64) -> f64 {
    let rem = left % right;
    if rem != 0.0 && (rem < 0.0) != (right < 0.0) {
        rem + right
    } else {
        rem
    }
}

/// The callable functions. All of them take exactly one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Log,
    Ln,
    Abs,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "asin" => Some(Self::Asin),
            "acos" => Some(Self::Acos),
            "atan" => Some(Self::Atan),
            "sqrt" => Some(Self::Sqrt),
            "log" => Some(Self::Log),
            "ln" => Some(Self::Ln),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sqrt => "sqrt",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Abs => "abs",
        }
    }

    fn call(self, args: &[f64]) -> Result<f64, EvalError> {
        let &[x] = args else {
            return Err(EvalError::Arity {
                name: self.name().to_string(),
                expected: 1,
                found: args.len(),
            });
        };

        match self {
            Self::Sin => Ok(x.sin()),
            Self::Cos => Ok(x.cos()),
            Self::Tan => Ok(x.tan()),
            Self::Asin => Ok(x.asin()),
            Self::Acos => Ok(x.acos()),
            Self::Atan => Ok(x.atan()),
            Self::Sqrt => Ok(x.sqrt()),
            Self::Log | Self::Ln if x <= 0.0 => Err(EvalError::Domain(self.name())),
            Self::Log => Ok(x.log10()),
            Self::Ln => Ok(x.ln()),
            Self::Abs => Ok(x.abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> Result<String, ErrorKind> {
        evaluate_expression(input)
    }

    fn eval_f64(input: &str) -> f64 {
        eval(input)
            .unwrap_or_else(|err| panic!("{input}: {err}"))
            .parse()
            .unwrap()
    }

    #[test]
    fn test_basic_evaluation() {
        assert_eq!(eval("2 + 2").unwrap(), "4");
        assert_eq!(eval("sqrt(16)+2*3").unwrap(), "10");
        assert_eq!(eval("2^10").unwrap(), "1024");
        assert_eq!(eval("2**10").unwrap(), "1024");
        assert_eq!(eval("(1+2)*3").unwrap(), "9");
        assert_eq!(eval("-3+5").unwrap(), "2");
        assert_eq!(eval("+4").unwrap(), "4");
    }

    #[test]
    fn test_internal_whitespace_is_removed() {
        assert_eq!(eval("1 2").unwrap(), "12");
        assert_eq!(eval("1 000 + 1").unwrap(), "1001");
        assert_eq!(eval("s q r t ( 9 )").unwrap(), "3");
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(eval("").unwrap(), "0");
        assert_eq!(eval("   ").unwrap(), "0");
    }

    #[test]
    fn test_negative_zero_results() {
        assert_eq!(eval("-0").unwrap(), "-0");
        assert_eq!(eval("-1e-13").unwrap(), "-0");
        assert_eq!(eval("0*-1").unwrap(), "-0");
        assert_eq!(eval("0*1").unwrap(), "0");
    }

    #[test]
    fn test_percent() {
        assert_eq!(eval("50%").unwrap(), "0.5");
        assert_eq!(eval("200*15%").unwrap(), "30");
        assert_eq!(eval("12.5%").unwrap(), "0.125");
    }

    #[test]
    fn test_percent_swallows_modulo_of_literals() {
        assert_eq!(eval("10%3"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("%5"), Err(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_floored_modulo() {
        assert_eq!(eval("(7)%3").unwrap(), "1");
        assert_eq!(eval("(-7)%3").unwrap(), "2");
        assert_eq!(eval("(7)%(-3)").unwrap(), "-2");
        assert_eq!(eval("(7.5)%2").unwrap(), "1.5");
    }

    #[test]
    fn test_power_associativity() {
        assert_eq!(eval("2^3^2").unwrap(), "512");
        assert_eq!(eval("2^-1").unwrap(), "0.5");
        assert_eq!(eval("-2^2").unwrap(), "4");
    }

    #[test]
    fn test_constants_and_functions() {
        assert_eq!(eval("pi").unwrap(), "3.14159265359");
        assert_eq!(eval("e").unwrap(), "2.718281828459");
        assert_eq!(eval("sin(0)").unwrap(), "0");
        assert_eq!(eval("cos(0)").unwrap(), "1");
        assert_eq!(eval("sin(pi/2)").unwrap(), "1");
        assert_eq!(eval("cos(pi)").unwrap(), "-1");
        assert_eq!(eval("tan(0)").unwrap(), "0");
        assert_eq!(eval("atan(1)*4").unwrap(), "3.14159265359");
        assert_eq!(eval("asin(1)*2").unwrap(), "3.14159265359");
        assert_eq!(eval("acos(1)").unwrap(), "0");
        assert_eq!(eval("log(1000)").unwrap(), "3");
        assert_eq!(eval("ln(e)").unwrap(), "1");
        assert_eq!(eval("abs(-5.5)").unwrap(), "5.5");
        assert_eq!(eval("sqrt(2)^2").unwrap(), "2");
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(eval("10/0"), Err(ErrorKind::DivideByZero));
        assert_eq!(eval("-1/0"), Err(ErrorKind::DivideByZero));
        assert_eq!(eval("0^-1"), Err(ErrorKind::DivideByZero));
        assert_eq!(eval("1e308*10"), Err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_nan_results_are_invalid() {
        assert_eq!(eval("0/0"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("(5)%0"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("sqrt(-1)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("asin(2)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("(-8)^(1/3)"), Err(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_domain_and_overflow_errors() {
        assert_eq!(eval("log(0)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("ln(-1)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("10^400"), Err(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(eval("foo(1)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("x+1"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("PI"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("pi(1)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("exp(1)"), Err(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(eval("sqrt(1,2)"), Err(ErrorKind::InvalidExpression));
        assert_eq!(eval("abs()"), Err(ErrorKind::InvalidExpression));
        assert_eq!(
            Function::Sqrt.call(&[1.0, 2.0]),
            Err(EvalError::Arity {
                name: "sqrt".into(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["1+", "((1)", "(1))", "2pi", "1.2.3", "*3", "sin", "sin 3"] {
            assert_eq!(eval(input), Err(ErrorKind::InvalidExpression), "input: {input}");
        }
    }

    #[test]
    fn test_injection_attempts_rejected() {
        for input in [
            "__import__('os').system('ls')",
            "1; 2",
            "a = 1",
            "1 == 1",
            "open",
            "lambda: 1",
            "[1, 2]",
            "1 if 1 else 2",
        ] {
            assert_eq!(eval(input), Err(ErrorKind::InvalidExpression), "input: {input}");
        }
    }

    #[test]
    fn test_large_results_use_scientific_notation() {
        assert_eq!(eval("1e13*2").unwrap(), "2.000000e+13");
        assert_eq!(eval("10^15*1.23456").unwrap(), "1.234560e+15");
        assert_eq!(eval("-(10^12)").unwrap(), "-1.000000e+12");

        let rendered = eval("123456789*987654321").unwrap();
        let (mantissa, _) = rendered.split_once('e').unwrap();
        let (_, fraction) = mantissa.split_once('.').unwrap();
        assert_eq!(fraction.len(), 6);
    }

    #[test]
    fn test_canonical_output_is_stable() {
        for input in ["1/3", "2/3", "0.5", "1e13*2", "-17.25", "pi*1e12", "1/7"] {
            let first = eval(input).unwrap();
            assert_eq!(eval(&first).unwrap(), first, "input: {input}");
        }
    }

    #[test]
    fn test_output_round_trips() {
        for (input, exact) in [
            ("1/3", 1.0 / 3.0),
            ("22/7", 22.0 / 7.0),
            ("1e13*2", 2e13),
            ("pi*1e12", PI * 1e12),
        ] {
            let parsed = eval_f64(input);
            assert!(
                (parsed - exact).abs() <= 1e-6 * exact.abs().max(1.0),
                "{input}: {parsed} vs {exact}"
            );
        }
    }

    #[test]
    fn test_basic_arithmetic_matches_exact_values() {
        // Deterministic LCG so the generated cases are reproducible.
        let mut state: u64 = 0x5eed;
        let mut next = |bound: u64| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % bound
        };

        for _ in 0..500 {
            let a = (next(999) + 1) as f64;
            let b = (next(999) + 1) as f64;
            let c = (next(999) + 1) as f64;
            let (input, exact) = match next(4) {
                0 => (format!("{a}+{b}*{c}"), a + b * c),
                1 => (format!("({a}-{b})*{c}"), (a - b) * c),
                2 => (format!("{a}*{b}-{c}/4"), a * b - c / 4.0),
                _ => (format!("({a}+{b})/({c}+1)"), (a + b) / (c + 1.0)),
            };

            let got = eval_f64(&input);
            let tolerance = 1e-9 * exact.abs().max(1.0);
            assert!((got - exact).abs() <= tolerance, "{input}: {got} vs {exact}");
        }
    }

    #[test]
    fn test_concurrent_evaluation() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    (0..100)
                        .map(|j| evaluate_expression(&format!("{i}*{j}+sqrt(16)")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let results = handle.join().unwrap();
            for (j, result) in results.into_iter().enumerate() {
                assert_eq!(result, Ok(format!("{}", i * j + 4)));
            }
        }
    }
}
