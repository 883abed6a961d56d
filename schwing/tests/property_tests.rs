use proptest::prelude::*;
use schwing::script::expr::evaluate;
use schwing::script::lexer::{split_program, tokenize};
use schwing::script::{Session, Tick, Value};
use schwing::var::VarStore;

proptest! {
    /// One instruction per terminator, whatever sits between them.
    #[test]
    fn split_length_equals_terminator_count(body in "[a-zA-Z0-9 ()\n;:]*") {
        let src = format!("{body};");
        let lines = split_program(&src).unwrap();
        let terminators = src.chars().filter(|c| matches!(c, ';' | ':')).count();
        prop_assert_eq!(lines.len(), terminators);
    }
}

proptest! {
    /// Anything not ending in a terminator is rejected.
    #[test]
    fn unterminated_source_is_rejected(body in "[a-zA-Z0-9 ;:]*[a-zA-Z0-9 ]") {
        prop_assert!(split_program(&body).is_err());
    }
}

proptest! {
    /// Tokens never contain spaces, and parentheses only appear alone.
    #[test]
    fn tokenizer_invariants(s in "\\PC*") {
        for tok in tokenize(&s) {
            prop_assert!(!tok.is_empty());
            prop_assert!(!tok.contains(' '));
            if tok.contains('(') || tok.contains(')') {
                prop_assert!(tok == "(" || tok == ")");
            }
        }
    }
}

proptest! {
    /// The evaluator returns Ok or Err on arbitrary token soup, never panics.
    #[test]
    fn evaluator_does_not_panic(s in "[()A-Za-z0-9 -]*") {
        let _ = evaluate(&tokenize(&s), &VarStore::new());
    }
}

proptest! {
    /// Arithmetic agrees with i64 where it is defined.
    #[test]
    fn add_and_mod_match_native(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let vars = VarStore::new();
        let add = evaluate(&tokenize(&format!("Add {a} {b}")), &vars).unwrap();
        prop_assert_eq!(add, Value::Int(a + b));
        if b != 0 {
            let m = evaluate(&tokenize(&format!("Mod {a} {b}")), &vars).unwrap();
            prop_assert_eq!(m, Value::Int(a % b));
        }
    }
}

proptest! {
    /// A counting loop runs exactly `n` times for any bound.
    #[test]
    fn while_loop_iteration_count(n in 0i64..40) {
        let mut s = Session::new();
        s.load(&format!(
            "Set X 0; Set K 0; While-start (Less X {n}); Set X (Add X 1); Set K (Add K 1); While-end;"
        )).unwrap();
        s.run().unwrap();
        let mut tick = s.tick();
        while tick == Tick::Continue {
            tick = s.tick();
        }
        prop_assert_eq!(tick, Tick::Finished);
        prop_assert_eq!(s.vars().get_int("K"), Some(n));
    }
}
