//! Property-based invariant tests for form state.
//!
//! 1. Every map is pruned to exactly the declared field names after any sync.
//! 2. Reset is idempotent.
//! 3. Clicking the same checkbox option twice restores the selection.
//! 4. A required text field is satisfied iff its trimmed value is non-empty.
//! 5. A submit attempt fires exactly one callback, and succeeds iff every
//!    required field is filled.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use formkit::{FieldDescriptor, FieldKind, FormController, FormElement, SubmitStatus};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const NAMES: [&str; 6] = ["name", "description", "grants", "enabled", "protocol", "scopes"];

fn kind_strategy() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::Text),
        Just(FieldKind::Password),
        Just(FieldKind::TextArea),
        Just(FieldKind::Number),
        Just(FieldKind::Dropdown),
        Just(FieldKind::Radio),
        Just(FieldKind::Checkbox),
        Just(FieldKind::Toggle),
        Just(FieldKind::Scopes),
    ]
}

/// A declared subset of `NAMES`, each with a kind and required flag.
fn tree_strategy() -> impl Strategy<Value = Vec<(usize, FieldKind, bool)>> {
    proptest::collection::btree_set(0..NAMES.len(), 0..=NAMES.len()).prop_flat_map(|picked| {
        let picked: Vec<usize> = picked.into_iter().collect();
        let n = picked.len();
        (
            Just(picked),
            proptest::collection::vec(kind_strategy(), n),
            proptest::collection::vec(any::<bool>(), n),
        )
            .prop_map(|(picked, kinds, required)| {
                picked
                    .into_iter()
                    .zip(kinds)
                    .zip(required)
                    .map(|((idx, kind), req)| (idx, kind, req))
                    .collect()
            })
    })
}

fn build(tree: &[(usize, FieldKind, bool)]) -> Vec<FormElement> {
    tree.iter()
        .map(|&(idx, kind, required)| {
            let field = FieldDescriptor::new(NAMES[idx], kind);
            let field = if required { field.required("required") } else { field };
            FormElement::Field(field)
        })
        .collect()
}

/// Touch every declared field in a kind-appropriate way.
fn edit_all(form: &mut FormController, tree: &[(usize, FieldKind, bool)], text: &str) {
    for &(idx, kind, _) in tree {
        let name = NAMES[idx];
        match kind {
            FieldKind::Toggle => form.handle_toggle(name).unwrap(),
            FieldKind::Checkbox => form.handle_change_checkbox(name, text).unwrap(),
            _ => form.handle_change(name, text).unwrap(),
        }
    }
}

fn key_set<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<&'a str> {
    names.collect()
}

fn assert_pruned(form: &FormController, tree: &[(usize, FieldKind, bool)]) -> Result<(), TestCaseError> {
    let declared: BTreeSet<&str> = tree.iter().map(|&(idx, _, _)| NAMES[idx]).collect();
    let state = form.state();
    prop_assert_eq!(&key_set(state.values().names()), &declared);
    prop_assert_eq!(&key_set(state.touched_map().keys().map(String::as_str)), &declared);
    prop_assert_eq!(&key_set(state.modifying_map().keys().map(String::as_str)), &declared);
    prop_assert_eq!(&key_set(state.required_map().keys().map(String::as_str)), &declared);
    prop_assert_eq!(&key_set(state.validity_map().keys().map(String::as_str)), &declared);
    prop_assert_eq!(&key_set(state.recorded_names()), &declared);
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Pruning
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn maps_match_declared_fields(
        trees in proptest::collection::vec(tree_strategy(), 1..6),
        text in "[a-z ]{0,6}",
    ) {
        let mut form = FormController::new(build(&trees[0])).unwrap();
        assert_pruned(&form, &trees[0])?;
        for tree in &trees[1..] {
            let declared = tree_declared_in(&form, tree);
            edit_all(&mut form, declared.as_slice(), &text);
            form.set_elements(build(tree)).unwrap();
            assert_pruned(&form, tree)?;
        }
    }
}

/// Entries of `tree` already declared in `form`, with the kinds `form` knows.
fn tree_declared_in(form: &FormController, tree: &[(usize, FieldKind, bool)]) -> Vec<(usize, FieldKind, bool)> {
    tree.iter()
        .filter_map(|&(idx, _, required)| {
            form.field(NAMES[idx]).ok().map(|f| (idx, f.kind(), required))
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Reset is idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reset_idempotent(tree in tree_strategy(), text in "[a-z ]{0,6}") {
        let mut form = FormController::new(build(&tree)).unwrap();
        edit_all(&mut form, &tree, &text);
        form.reset();
        let once = form.values().clone();
        form.reset();
        prop_assert_eq!(form.values(), &once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Checkbox round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn checkbox_double_click_restores(
        initial in proptest::collection::btree_set("[a-e]", 0..5),
        option in "[a-g]",
    ) {
        let initial: Vec<String> = initial.into_iter().collect();
        let mut form = FormController::new([FormElement::Field(
            FieldDescriptor::checkbox("grants").initial_value(initial.clone()),
        )])
        .unwrap();
        form.handle_change_checkbox("grants", &option).unwrap();
        let once = form.value("grants").and_then(|v| v.as_list()).unwrap().to_vec();
        prop_assert_eq!(once.contains(&option), !initial.contains(&option));
        form.handle_change_checkbox("grants", &option).unwrap();

        let mut after = form.value("grants").and_then(|v| v.as_list()).unwrap().to_vec();
        let mut before = initial;
        after.sort();
        before.sort();
        prop_assert_eq!(after, before);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Required gate
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn required_text_gate(value in "[ \\ta-z]{0,8}") {
        let mut form = FormController::new([FormElement::Field(
            FieldDescriptor::text("name").required("Name is required"),
        )])
        .unwrap();
        form.handle_change("name", value.as_str()).unwrap();
        form.handle_blur("name").unwrap();
        prop_assert_eq!(
            form.state().is_required_satisfied("name"),
            !value.trim().is_empty()
        );
        prop_assert_eq!(form.values().text("name"), Some(value.trim()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Submission gating
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn exactly_one_callback_per_attempt(
        filled in proptest::collection::vec(any::<bool>(), 1..6),
        optional in any::<bool>(),
    ) {
        let mut elements: Vec<FormElement> = filled
            .iter()
            .enumerate()
            .map(|(i, _)| FormElement::Field(FieldDescriptor::text(format!("f{i}")).required("x")))
            .collect();
        if optional {
            elements.push(FormElement::Field(FieldDescriptor::text("optional")));
        }

        let submits = Rc::new(RefCell::new(0u32));
        let errors = Rc::new(RefCell::new(0u32));
        let (s, e) = (Rc::clone(&submits), Rc::clone(&errors));
        let mut form = FormController::new(elements)
            .unwrap()
            .on_submit(move |_| *s.borrow_mut() += 1)
            .on_submit_error(move |_, _| *e.borrow_mut() += 1);

        for (i, fill) in filled.iter().enumerate() {
            let name = format!("f{i}");
            if *fill {
                form.handle_change(&name, "value").unwrap();
            }
            form.handle_blur(&name).unwrap();
        }

        let status = form.submit();
        let all_filled = filled.iter().all(|f| *f);
        prop_assert_eq!(*submits.borrow() + *errors.borrow(), 1);
        prop_assert_eq!(*submits.borrow() == 1, all_filled);
        prop_assert_eq!(
            status,
            if all_filled { SubmitStatus::Submitted } else { SubmitStatus::Blocked }
        );
    }
}
