//! Property-based tests for module names and registry round-trips.

use proptest::prelude::*;
use spacey_define::module_system::name::{is_relative, key, normalize, resolve_relative};
use spacey_define::{Loader, Object, Value};
use std::collections::BTreeSet;

/// A single name segment, never `.` or `..`.
fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_-]{0,7}").expect("valid regex")
}

fn path_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 1..=max)
}

/// Join segments with noisy separators: doubled slashes, padding, trailing `/`.
fn noisy_join(segments: &[String], noise: &[bool]) -> String {
    let mut out = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        let noisy = noise.get(idx).copied().unwrap_or(false);
        if noisy {
            out.push_str("/ ");
        }
        out.push_str(segment);
        out.push('/');
        if noisy {
            out.push(' ');
        }
    }
    out
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[a-z /]{0,24}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert_eq!(key(&raw), once.to_lowercase());
    }

    #[test]
    fn noisy_names_normalize_to_plain_join(
        segments in path_strategy(5),
        noise in prop::collection::vec(any::<bool>(), 5),
    ) {
        let noisy = noisy_join(&segments, &noise);
        prop_assert_eq!(normalize(&noisy), segments.join("/"));
    }

    #[test]
    fn dot_reference_stays_in_module_directory(
        module in path_strategy(5),
        target in path_strategy(3),
    ) {
        let reference = format!("./{}", target.join("/"));
        prop_assert!(is_relative(&reference));

        let mut expected = module[..module.len() - 1].to_vec();
        expected.extend(target.iter().cloned());
        prop_assert_eq!(resolve_relative(&module.join("/"), &reference), expected.join("/"));
    }

    #[test]
    fn each_parent_segment_walks_up_one_level(
        module in path_strategy(6),
        ups in 1usize..6,
        target in segment_strategy(),
    ) {
        let reference = format!("{}{}", "../".repeat(ups), target);
        let keep = (module.len() - 1).saturating_sub(ups);

        let mut expected = module[..keep].to_vec();
        expected.push(target);
        prop_assert_eq!(resolve_relative(&module.join("/"), &reference), expected.join("/"));
    }

    #[test]
    fn declared_values_resolve_by_identity(
        names in prop::collection::btree_set("[a-z]{1,6}(/[a-z]{1,6}){0,2}", 1..8),
    ) {
        let loader = Loader::new();
        let mut declared = Vec::new();
        let mut taken = BTreeSet::new();

        for (idx, name) in names.iter().enumerate() {
            prop_assume!(taken.insert(key(name)));
            let value = if idx % 2 == 0 {
                Value::Object(Object::new())
            } else {
                Value::from(name.clone())
            };
            loader.declare(name, value.clone()).unwrap();
            declared.push((name.clone(), value));
        }

        for (name, value) in &declared {
            let resolved = loader.require_value(&name.to_uppercase()).unwrap();
            prop_assert!(resolved.ptr_eq(value));
        }

        for (name, _) in &declared {
            prop_assert!(loader.undeclare(name));
            prop_assert!(loader.resolve(name.as_str()).unwrap_err().is_not_found());
        }
    }
}
