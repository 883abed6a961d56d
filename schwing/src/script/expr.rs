//! Prefix expression evaluator.
//!
//! Expressions are written operator-first with parenthesised sub-expressions:
//!
//! ```text
//! (Add X (Mul 2 3))     (And (Less X 5) (Not Done))
//! ```
//!
//! There is no parse tree.  [`evaluate`] inspects the leading token of a
//! token slice and recurses over the balanced argument groups that follow it.
//!
//! | Family | Operators | Arguments |
//! |--------|-----------|-----------|
//! | comparison | `Eq` `Less` `Greater` `Leq` `Geq` | two integers → boolean |
//! | logic | `Or` `And` `Not` | booleans (`Not` takes one) → boolean |
//! | arithmetic | `Add` `Sub` `Mul` `Div` `Mod` | two integers → integer |
//!
//! Only the first two arguments are used; extra arguments are evaluated and
//! then ignored.  `Div` divides its *second* argument by its first and
//! floors the result, while `Mod` is `first % second`.

use crate::error::EvalError;
use super::value::Value;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Variable lookup used by the evaluator.
pub trait EvalContext {
    /// `None` if `name` is not a variable; `Some(None)` if it is one whose
    /// asynchronous read has not produced a value.
    fn get_var(&self, name: &str) -> Option<Option<Value>>;
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Comparison,
    Logic,
    Arithmetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Less,
    Greater,
    Leq,
    Geq,
    Or,
    And,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Op {
    pub const ALL: [Op; 13] = [
        Op::Eq,
        Op::Less,
        Op::Greater,
        Op::Leq,
        Op::Geq,
        Op::Or,
        Op::And,
        Op::Not,
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Mod,
    ];

    pub fn from_keyword(s: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.keyword() == s)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Op::Eq => "Eq",
            Op::Less => "Less",
            Op::Greater => "Greater",
            Op::Leq => "Leq",
            Op::Geq => "Geq",
            Op::Or => "Or",
            Op::And => "And",
            Op::Not => "Not",
            Op::Add => "Add",
            Op::Sub => "Sub",
            Op::Mul => "Mul",
            Op::Div => "Div",
            Op::Mod => "Mod",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Op::Eq | Op::Less | Op::Greater | Op::Leq | Op::Geq => Family::Comparison,
            Op::Or | Op::And | Op::Not => Family::Logic,
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => Family::Arithmetic,
        }
    }

    fn arity(self) -> usize {
        if self == Op::Not {
            1
        } else {
            2
        }
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate a token slice to a value.
pub fn evaluate<S: AsRef<str>>(tokens: &[S], ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    let tokens = strip_parens(tokens)?;
    let Some(head) = tokens.first() else {
        return Err(EvalError::EmptyExpression);
    };
    let head = head.as_ref();

    if let Some(v) = Value::parse_literal(head) {
        return Ok(v);
    }
    if let Some(slot) = ctx.get_var(head) {
        return slot.ok_or_else(|| EvalError::NoValue(head.to_owned()));
    }
    match Op::from_keyword(head) {
        Some(op) => {
            let args = split_args(&tokens[1..])?
                .into_iter()
                .map(|group| evaluate(group, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            apply(op, &args)
        }
        None => Err(EvalError::UnknownToken(head.to_owned())),
    }
}

/// Remove any number of wrapping `(` … `)` pairs.
fn strip_parens<S: AsRef<str>>(mut tokens: &[S]) -> Result<&[S], EvalError> {
    while tokens.first().map(AsRef::as_ref) == Some("(") {
        if tokens.len() < 2 || tokens.last().map(AsRef::as_ref) != Some(")") {
            return Err(EvalError::UnbalancedParens(render(tokens)));
        }
        tokens = &tokens[1..tokens.len() - 1];
    }
    Ok(tokens)
}

/// Cut a token slice into argument groups at paren depth 0.
pub fn split_args<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<&[S]>, EvalError> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;

    for (end, tok) in tokens.iter().enumerate() {
        match tok.as_ref() {
            "(" => depth += 1,
            ")" => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| EvalError::UnbalancedParens(render(tokens)))?;
            }
            _ => {}
        }
        if depth == 0 {
            groups.push(&tokens[start..=end]);
            start = end + 1;
        }
    }
    if depth != 0 {
        return Err(EvalError::UnbalancedParens(render(tokens)));
    }
    Ok(groups)
}

fn apply(op: Op, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < op.arity() {
        return Err(EvalError::Arity {
            op: op.keyword(),
            expected: op.arity(),
            found: args.len(),
        });
    }

    match op.family() {
        Family::Comparison => {
            let (a, b) = (int_arg(op, args[0])?, int_arg(op, args[1])?);
            Ok(Value::Bool(match op {
                Op::Eq => a == b,
                Op::Less => a < b,
                Op::Greater => a > b,
                Op::Leq => a <= b,
                _ => a >= b,
            }))
        }
        Family::Logic => {
            let a = bool_arg(op, args[0])?;
            if op == Op::Not {
                return Ok(Value::Bool(!a));
            }
            let b = bool_arg(op, args[1])?;
            Ok(Value::Bool(if op == Op::And { a && b } else { a || b }))
        }
        Family::Arithmetic => {
            let (a, b) = (int_arg(op, args[0])?, int_arg(op, args[1])?);
            arith(op, a, b).map(Value::Int)
        }
    }
}

fn arith(op: Op, a: i64, b: i64) -> Result<i64, EvalError> {
    let overflow = || EvalError::Overflow(op.keyword());
    match op {
        Op::Add => a.checked_add(b).ok_or_else(overflow),
        Op::Sub => a.checked_sub(b).ok_or_else(overflow),
        Op::Mul => a.checked_mul(b).ok_or_else(overflow),
        Op::Div => {
            if a == 0 || b == 0 {
                return Err(EvalError::DivisionByZero("Div"));
            }
            floor_div(b, a).ok_or_else(overflow)
        }
        Op::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero("Mod"));
            }
            a.checked_rem(b).ok_or_else(overflow)
        }
        _ => Err(EvalError::UnknownToken(op.keyword().to_owned())),
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(n: i64, d: i64) -> Option<i64> {
    let q = n.checked_div(d)?;
    if n % d != 0 && ((n < 0) != (d < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

fn int_arg(op: Op, v: Value) -> Result<i64, EvalError> {
    v.as_int().ok_or(EvalError::TypeMismatch {
        op: op.keyword(),
        expected: "an integer",
        found: v,
    })
}

fn bool_arg(op: Op, v: Value) -> Result<bool, EvalError> {
    v.as_bool().ok_or(EvalError::TypeMismatch {
        op: op.keyword(),
        expected: "a boolean",
        found: v,
    })
}

fn render<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;
    use std::collections::HashMap;

    // ── Minimal EvalContext for tests ─────────────────────────────────────────

    struct TestCtx {
        vars: HashMap<String, Option<Value>>,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx { vars: HashMap::new() }
        }
        fn with(mut self, k: &str, v: Option<Value>) -> Self {
            self.vars.insert(k.into(), v);
            self
        }
    }

    impl EvalContext for TestCtx {
        fn get_var(&self, name: &str) -> Option<Option<Value>> {
            self.vars.get(name).copied()
        }
    }

    fn eval(src: &str) -> Result<Value, EvalError> {
        eval_ctx(src, &TestCtx::new())
    }

    fn eval_ctx(src: &str, ctx: &TestCtx) -> Result<Value, EvalError> {
        evaluate(&tokenize(src), ctx)
    }

    #[test]
    fn literals() {
        assert_eq!(eval("42"), Ok(Value::Int(42)));
        assert_eq!(eval("-3"), Ok(Value::Int(-3)));
        assert_eq!(eval("true"), Ok(Value::Bool(true)));
        assert_eq!(eval("((false))"), Ok(Value::Bool(false)));
    }

    #[test]
    fn add_in_parens() {
        assert_eq!(eval("(Add 1 2)"), Ok(Value::Int(3)));
    }

    #[test]
    fn nested_arithmetic() {
        assert_eq!(eval("Add 1 (Mul 2 (Sub 10 4))"), Ok(Value::Int(13)));
    }

    #[test]
    fn div_operand_order() {
        assert_eq!(evaluate(&["Div", "10", "2"], &TestCtx::new()), Ok(Value::Int(0)));
        assert_eq!(eval("Div 2 10"), Ok(Value::Int(5)));
        assert_eq!(eval("Div 2 -7"), Ok(Value::Int(-4)));
    }

    #[test]
    fn mod_operand_order() {
        assert_eq!(evaluate(&["Mod", "10", "3"], &TestCtx::new()), Ok(Value::Int(1)));
        assert_eq!(eval("Mod -7 3"), Ok(Value::Int(-1)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval("Div 5 0"), Err(EvalError::DivisionByZero("Div")));
        assert_eq!(eval("Div 0 5"), Err(EvalError::DivisionByZero("Div")));
        assert_eq!(eval("Mod 5 0"), Err(EvalError::DivisionByZero("Mod")));
        assert_eq!(eval("Mod 0 5"), Ok(Value::Int(0)));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            eval("Add 9223372036854775807 1"),
            Err(EvalError::Overflow("Add"))
        );
    }

    #[test]
    fn comparison() {
        assert_eq!(eval("Eq 3 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("Less 2 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("Greater 2 3"), Ok(Value::Bool(false)));
        assert_eq!(eval("Leq 3 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("Geq 2 3"), Ok(Value::Bool(false)));
    }

    #[test]
    fn comparison_rejects_booleans() {
        assert!(matches!(
            eval("Eq true true"),
            Err(EvalError::TypeMismatch { op: "Eq", .. })
        ));
    }

    #[test]
    fn logic() {
        assert_eq!(eval("And true (Less 1 2)"), Ok(Value::Bool(true)));
        assert_eq!(eval("Or false false"), Ok(Value::Bool(false)));
        assert_eq!(eval("Not (Eq 1 2)"), Ok(Value::Bool(true)));
        assert!(matches!(eval("And 1 true"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn not_ignores_second_argument_value() {
        assert_eq!(eval("Not true 5"), Ok(Value::Bool(false)));
    }

    #[test]
    fn extra_arguments_are_still_evaluated() {
        assert_eq!(eval("Add 1 2 3"), Ok(Value::Int(3)));
        assert_eq!(eval("Add 1 2 Nope"), Err(EvalError::UnknownToken("Nope".into())));
    }

    #[test]
    fn arity_errors() {
        assert_eq!(
            eval("Add 1"),
            Err(EvalError::Arity { op: "Add", expected: 2, found: 1 })
        );
        assert_eq!(
            eval("Not"),
            Err(EvalError::Arity { op: "Not", expected: 1, found: 0 })
        );
    }

    #[test]
    fn variables() {
        let ctx = TestCtx::new().with("X", Some(Value::Int(7)));
        assert_eq!(eval_ctx("Add X 1", &ctx), Ok(Value::Int(8)));
    }

    #[test]
    fn variable_shadows_keyword() {
        let ctx = TestCtx::new().with("Add", Some(Value::Int(5)));
        assert_eq!(eval_ctx("Add 1 2", &ctx), Ok(Value::Int(5)));
    }

    #[test]
    fn pending_variable_has_no_value() {
        let ctx = TestCtx::new().with("B", None);
        assert_eq!(eval_ctx("Eq B 1", &ctx), Err(EvalError::NoValue("B".into())));
    }

    #[test]
    fn unknown_token() {
        assert_eq!(eval("Foo 1"), Err(EvalError::UnknownToken("Foo".into())));
        assert_eq!(eval("12abc"), Err(EvalError::UnknownToken("12abc".into())));
    }

    #[test]
    fn empty_expression() {
        assert_eq!(eval(""), Err(EvalError::EmptyExpression));
        assert_eq!(eval("()"), Err(EvalError::EmptyExpression));
    }

    #[test]
    fn unbalanced_parens() {
        assert!(matches!(eval("(Add 1 2"), Err(EvalError::UnbalancedParens(_))));
        assert!(matches!(eval("Add (Mul 1 2 3"), Err(EvalError::UnbalancedParens(_))));
        assert!(matches!(eval("Add 1 2)"), Err(EvalError::UnbalancedParens(_))));
    }

    #[test]
    fn split_args_groups() {
        let toks = tokenize("1 (Add 2 3) X");
        let groups = split_args(&toks).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1], ["(", "Add", "2", "3", ")"]);
    }

    #[test]
    fn keyword_table_roundtrip() {
        for op in Op::ALL {
            assert_eq!(Op::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(Op::from_keyword("add"), None);
    }
}
