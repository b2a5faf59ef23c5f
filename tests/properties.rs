use fenn_reader::algebra::{compare, equal, hash};
use fenn_reader::parse::Parser;
use fenn_reader::tuple;
use fenn_reader::value::Value;
use proptest::prelude::*;
use std::cmp::Ordering;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<f64>().prop_map(Value::Number),
        Just(Value::Number(f64::NAN)),
        Just(Value::Number(-0.0)),
        (-3i32..3).prop_map(|n| Value::Number(n as f64)),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(|b| Value::string(&b)),
        "[ab]{0,3}".prop_map(|s| Value::symbol(&s)),
        "[ab]{0,3}".prop_map(|s| Value::keyword(&s)),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4)
            .prop_map(|items| Value::tuple(tuple::from_slice(&items)))
    })
}

fn atom_source() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z][a-z0-9?!-]{0,8}",
        "[a-z][a-z0-9-]{0,8}".prop_map(|s| format!(":{s}")),
        "[a-zA-Z0-9 _]{0,10}".prop_map(|s| format!("\"{s}\"")),
        Just("nil".to_string()),
        Just("true".to_string()),
    ]
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in value(), b in value()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
    }

    #[test]
    fn compare_agrees_with_equal(a in value(), b in value()) {
        prop_assert_eq!(compare(&a, &b) == Ordering::Equal, equal(&a, &b));
        prop_assert!(equal(&a, &a));
    }

    #[test]
    fn equal_values_hash_equal(a in value(), b in value()) {
        if equal(&a, &b) {
            prop_assert_eq!(hash(&a), hash(&b));
        }
        prop_assert_eq!(hash(&a), hash(&a.clone()));
    }

    #[test]
    fn compare_is_transitive(a in value(), b in value(), c in value()) {
        let mut v = [a, b, c];
        v.sort();
        prop_assert!(compare(&v[0], &v[1]) != Ordering::Greater);
        prop_assert!(compare(&v[1], &v[2]) != Ordering::Greater);
        prop_assert!(compare(&v[0], &v[2]) != Ordering::Greater);
    }

    #[test]
    fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut p = Parser::new();
        for &c in &input {
            p.consume(c);
            if p.take_error().is_some() {
                prop_assert_eq!(p.delimiters(), "");
            }
        }
        p.end_of_input();
        let _ = p.take_error();
        while p.produce().is_some() {}
        prop_assert_eq!(p.pending(), 0);
    }

    #[test]
    fn tuples_keep_their_elements(items in prop::collection::vec(atom_source(), 0..8)) {
        let src = format!("[{}]", items.join(" "));
        let mut p = Parser::new();
        p.feed(src.as_bytes());
        p.end_of_input();
        prop_assert_eq!(p.take_error(), None);
        let v = p.produce();
        let t = v.as_ref().and_then(Value::as_tuple);
        prop_assert_eq!(t.map(|t| t.len()), Some(items.len()));
        prop_assert!(p.produce().is_none());
    }
}
