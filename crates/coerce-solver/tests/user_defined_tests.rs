use super::*;
use crate::compilation::Compilation;
use crate::fixture::{capture_logs, zoo};
use crate::types::ConstraintFlags;

fn resolve(comp: &Compilation, source: TypeId, target: TypeId, implicit_only: bool) -> UserDefinedConversionResult {
    comp.classifier()
        .resolve_user_defined_conversion(source, target, implicit_only)
}

#[test]
fn test_single_operator_is_valid() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Meters", Vec::new());
    let meters = comp.named(def);
    let operator = comp.add_conversion_operator(def, true, TypeId::DOUBLE, meters);

    let result = resolve(&comp, TypeId::DOUBLE, meters, true);
    assert!(result.is_valid());
    assert_eq!(result.outcome(), "valid");
    let Some(best) = result.best() else {
        panic!("expected a best operator");
    };
    assert_eq!(best.operator, operator);
    assert!(best.source_conversion.is_identity());
    assert!(best.target_conversion.is_identity());
    assert!(!best.lifted);
    assert_eq!(best.constrained_to, None);
    assert_eq!(result.to_string(), format!("valid (operator {})", operator.0));
}

#[test]
fn test_pre_conversion_reaches_operator_parameter() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Meters", Vec::new());
    let meters = comp.named(def);
    comp.add_conversion_operator(def, true, TypeId::DOUBLE, meters);

    let result = resolve(&comp, TypeId::INT, meters, true);
    let Some(best) = result.best() else {
        panic!("int reaches double by a standard conversion");
    };
    assert_eq!(best.source_conversion.kind(), ConversionKind::ImplicitNumeric);
    assert_eq!(best.from_type, TypeId::DOUBLE);
}

#[test]
fn test_explicit_operator_needs_explicit_resolution() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Meters", Vec::new());
    let meters = comp.named(def);
    comp.add_conversion_operator(def, false, meters, TypeId::DOUBLE);

    let implicit = resolve(&comp, meters, TypeId::DOUBLE, true);
    assert_eq!(implicit.outcome(), "no-applicable-operators");
    assert!(implicit.candidates().is_empty());
    assert!(resolve(&comp, meters, TypeId::DOUBLE, false).is_valid());

    let conversion = comp.classifier().classify_user_defined(meters, TypeId::DOUBLE, false);
    assert_eq!(conversion.kind(), ConversionKind::ExplicitUserDefined);
    assert!(comp.classifier().classify_user_defined(meters, TypeId::DOUBLE, true) == Conversion::NO_CONVERSION);
}

#[test]
fn test_explicit_resolution_allows_narrowing_post_conversion() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Meters", Vec::new());
    let meters = comp.named(def);
    comp.add_conversion_operator(def, false, meters, TypeId::DOUBLE);

    let result = resolve(&comp, meters, TypeId::INT, false);
    let Some(best) = result.best() else {
        panic!("double narrows to int explicitly");
    };
    assert_eq!(best.target_conversion.kind(), ConversionKind::ExplicitNumeric);
}

#[test]
fn test_no_best_source_type() {
    let comp = Compilation::default();
    let ia = comp.named(comp.declare_interface("IA", Vec::new()));
    let ib = comp.named(comp.declare_interface("IB", Vec::new()));
    let source = comp.named(comp.declare_class("Source", None, vec![ia, ib]));
    let target_def = comp.declare_class("Target", None, Vec::new());
    let target = comp.named(target_def);
    comp.add_conversion_operator(target_def, true, ia, target);
    comp.add_conversion_operator(target_def, true, ib, target);

    let result = resolve(&comp, source, target, true);
    assert!(matches!(result, UserDefinedConversionResult::NoBestSourceType { .. }));
    assert_eq!(result.candidates().len(), 2);
    assert_eq!(result.to_string(), "no-best-source-type (2 candidates)");

    let conversion = comp.classifier().classify_user_defined(source, target, true);
    assert_eq!(conversion.kind(), ConversionKind::ImplicitUserDefined);
    assert_eq!(conversion.method(), None);
    assert!(!conversion.is_valid());
}

#[test]
fn test_no_best_target_type() {
    let comp = Compilation::default();
    let ia = comp.named(comp.declare_interface("IA", Vec::new()));
    let ib = comp.named(comp.declare_interface("IB", Vec::new()));
    let both = comp.named(comp.declare_interface("IBoth", vec![ia, ib]));
    let source_def = comp.declare_class("Source", None, Vec::new());
    let source = comp.named(source_def);
    let first = comp.named(comp.declare_class("First", None, vec![ia, ib]));
    let second = comp.named(comp.declare_class("Second", None, vec![ia, ib]));
    comp.add_conversion_operator(source_def, true, source, first);
    comp.add_conversion_operator(source_def, true, source, second);

    let to_ia = resolve(&comp, source, ia, true);
    assert!(matches!(to_ia, UserDefinedConversionResult::NoBestTargetType { .. }));
    assert_eq!(to_ia.outcome(), "no-best-target-type");
    assert!(!resolve(&comp, source, both, true).is_valid());
}

#[test]
fn test_duplicate_operators_are_ambiguous() {
    let comp = Compilation::default();
    let source_def = comp.declare_class("Source", None, Vec::new());
    let target_def = comp.declare_class("Target", None, Vec::new());
    let source = comp.named(source_def);
    let target = comp.named(target_def);
    comp.add_conversion_operator(source_def, true, source, target);
    comp.add_conversion_operator(target_def, true, source, target);

    let result = resolve(&comp, source, target, true);
    assert!(matches!(result, UserDefinedConversionResult::Ambiguous { .. }));
    assert_eq!(result.candidates().len(), 2);
    assert!(result.best().is_none());
}

#[test]
fn test_operators_on_base_classes_are_found() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let Some(animal_def) = crate::type_queries::named_type(&comp, z.animal).map(|n| n.def) else {
        panic!("Animal is named");
    };
    let operator = comp.add_conversion_operator(animal_def, true, z.animal, TypeId::STRING);
    let result = resolve(&comp, z.dog, TypeId::STRING, true);
    assert_eq!(result.best().map(|b| b.operator), Some(operator));
    assert_eq!(
        result.best().map(|b| b.source_conversion.kind()),
        Some(ConversionKind::ImplicitReference)
    );
}

#[test]
fn test_operators_on_interfaces_are_ignored() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let Some(pet_def) = crate::type_queries::named_type(&comp, z.pet).map(|n| n.def) else {
        panic!("IPet is named");
    };
    comp.add_conversion_operator(pet_def, true, z.pet, TypeId::STRING);
    assert_eq!(resolve(&comp, z.cat, TypeId::STRING, true).outcome(), "no-applicable-operators");
}

#[test]
fn test_lifted_form_for_nullable_source() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Meters", Vec::new());
    let meters = comp.named(def);
    comp.add_conversion_operator(def, true, meters, TypeId::DOUBLE);
    let types = comp.types();

    let result = resolve(&comp, types.nullable(meters), types.nullable(TypeId::DOUBLE), true);
    let Some(best) = result.best() else {
        panic!("lifted operator applies");
    };
    assert!(best.lifted);
    assert_eq!(best.from_type, types.nullable(meters));
    assert_eq!(best.to_type, types.nullable(TypeId::DOUBLE));

    assert!(!resolve(&comp, types.nullable(meters), TypeId::DOUBLE, true).is_valid());
}

#[test]
fn test_operators_reached_through_type_parameter_constraint() {
    let comp = Compilation::default();
    let base_def = comp.declare_class("Token", None, Vec::new());
    let base = comp.named(base_def);
    let operator = comp.add_conversion_operator(base_def, true, base, TypeId::STRING);
    let tp = comp.type_param("T");
    comp.types().set_constraints(tp, ConstraintFlags::empty(), vec![base]);
    let t = comp.types().type_param(tp);

    let result = resolve(&comp, t, TypeId::STRING, true);
    let Some(best) = result.best() else {
        panic!("operator found through the constraint");
    };
    assert_eq!(best.operator, operator);
    assert_eq!(best.constrained_to, Some(t));
}

#[test]
fn test_generic_operator_is_instantiated() {
    let comp = Compilation::default();
    let span = comp.span_of(TypeId::CHAR);
    let read_only = comp.read_only_span_of(TypeId::CHAR);
    let result = resolve(&comp, span, read_only, true);
    let Some(best) = result.best() else {
        panic!("Span<char> widens to ReadOnlySpan<char>");
    };
    assert_eq!(best.from_type, span);
    assert_eq!(best.to_type, read_only);
    assert!(!resolve(&comp, comp.span_of(TypeId::INT), read_only, true).is_valid());
}

#[test]
fn test_deep_hierarchy_truncates_operator_search() {
    let comp = Compilation::default();
    let root_def = comp.declare_class("Level0", None, Vec::new());
    let root = comp.named(root_def);
    let mut leaf = root;
    for depth in 1..48 {
        leaf = comp.named(comp.declare_class(&format!("Level{depth}"), Some(leaf), Vec::new()));
    }
    let target = comp.named(comp.declare_class("Target", None, Vec::new()));
    comp.add_conversion_operator(root_def, true, root, target);

    assert!(resolve(&comp, root, target, true).is_valid());

    let mut result = None;
    let lines = capture_logs("coerce_solver::conversion::user_defined=debug", || {
        result = Some(resolve(&comp, leaf, target, true));
    });
    assert!(result.is_some_and(|r| !r.is_valid()));
    assert!(
        lines.iter().any(|line| line.contains("operator search truncated")),
        "{lines:?}"
    );
}
