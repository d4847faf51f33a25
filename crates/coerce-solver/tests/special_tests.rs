use super::*;
use crate::compilation::Compilation;
use crate::fixture::unsafe_compilation;

// =============================================================================
// Deconstruction
// =============================================================================

#[test]
fn test_tuple_deconstructs_element_wise() {
    let comp = Compilation::default();
    let source = comp.types().tuple_of(&[TypeId::INT, TypeId::STRING]);
    let conversion = comp
        .classifier()
        .classify_deconstruction(source, &[TypeId::LONG, TypeId::OBJECT]);
    assert_eq!(conversion.kind(), ConversionKind::Deconstruction);
    assert_eq!(conversion.to_string(), "Deconstruction(ImplicitNumeric, ImplicitReference)");
    assert_eq!(
        conversion.deconstruction_info(),
        Some(&DeconstructionInfo { method: None, arity: 2 })
    );

    let classifier = comp.classifier();
    assert!(!classifier.classify_deconstruction(source, &[TypeId::INT]).exists());
    assert!(!classifier
        .classify_deconstruction(source, &[TypeId::STRING, TypeId::STRING])
        .exists());
    assert!(!classifier.classify_deconstruction(source, &[]).exists());
    assert!(!classifier.classify_deconstruction(TypeId::ERROR, &[TypeId::INT]).exists());
}

#[test]
fn test_deconstruct_method() {
    let comp = Compilation::default();
    let def = comp.declare_struct("Point", Vec::new());
    let point = comp.named(def);
    let method = comp.add_deconstructor(def, &[TypeId::INT, TypeId::INT]);
    let classifier = comp.classifier();

    let conversion = classifier.classify_deconstruction(point, &[TypeId::LONG, TypeId::DOUBLE]);
    assert_eq!(
        conversion.deconstruction_info().and_then(|info| info.method),
        Some(method)
    );
    assert_eq!(conversion.nested().len(), 2);

    assert!(!classifier
        .classify_deconstruction(point, &[TypeId::STRING, TypeId::INT])
        .exists());
    assert!(!classifier
        .classify_deconstruction(point, &[TypeId::INT, TypeId::INT, TypeId::INT])
        .exists());
}

#[test]
fn test_deconstruct_arity_selects_overload() {
    let comp = Compilation::default();
    let def = comp.declare_class("Range", None, Vec::new());
    let range = comp.named(def);
    let pair = comp.add_deconstructor(def, &[TypeId::INT, TypeId::INT]);
    let triple = comp.add_deconstructor(def, &[TypeId::INT, TypeId::INT, TypeId::BOOL]);
    let classifier = comp.classifier();
    let method = |targets: &[TypeId]| {
        classifier
            .classify_deconstruction(range, targets)
            .deconstruction_info()
            .and_then(|info| info.method)
    };
    assert_eq!(method(&[TypeId::INT, TypeId::INT]), Some(pair));
    assert_eq!(method(&[TypeId::INT, TypeId::INT, TypeId::BOOL]), Some(triple));
}

#[test]
fn test_ambiguous_deconstruct_methods() {
    let comp = Compilation::default();
    let def = comp.declare_class("Pair", None, Vec::new());
    comp.add_deconstructor(def, &[TypeId::INT, TypeId::INT]);
    comp.add_deconstructor(def, &[TypeId::LONG, TypeId::LONG]);
    let conversion = comp
        .classifier()
        .classify_deconstruction(comp.named(def), &[TypeId::LONG, TypeId::LONG]);
    assert_eq!(conversion, Conversion::NO_CONVERSION);
}

#[test]
fn test_deconstruct_found_on_base_class() {
    let comp = Compilation::default();
    let base_def = comp.declare_class("Shape", None, Vec::new());
    let base = comp.named(base_def);
    let inherited = comp.add_deconstructor(base_def, &[TypeId::DOUBLE, TypeId::DOUBLE]);
    let circle_def = comp.declare_class("Circle", Some(base), Vec::new());
    let circle = comp.named(circle_def);
    let classifier = comp.classifier();
    let found = |targets: &[TypeId]| {
        classifier
            .classify_deconstruction(circle, targets)
            .deconstruction_info()
            .and_then(|info| info.method)
    };
    assert_eq!(found(&[TypeId::DOUBLE, TypeId::DOUBLE]), Some(inherited));

    let own = comp.add_deconstructor(circle_def, &[TypeId::INT, TypeId::INT]);
    assert_eq!(found(&[TypeId::DOUBLE, TypeId::DOUBLE]), Some(own));
}

// =============================================================================
// fixed initializers
// =============================================================================

#[test]
fn test_fixed_initializer_pins_arrays_and_strings() {
    let comp = unsafe_compilation();
    let types = comp.types();
    let classifier = comp.classifier();
    let ints = types.sz_array(TypeId::INT);
    assert_eq!(
        classifier
            .classify_fixed_initializer(ints, types.pointer(TypeId::INT))
            .kind(),
        ConversionKind::PinnedObjectToPointer
    );
    assert_eq!(
        classifier
            .classify_fixed_initializer(ints, types.pointer(TypeId::VOID))
            .kind(),
        ConversionKind::PinnedObjectToPointer
    );
    assert_eq!(
        classifier
            .classify_fixed_initializer(TypeId::STRING, types.pointer(TypeId::CHAR))
            .kind(),
        ConversionKind::PinnedObjectToPointer
    );
    assert!(!classifier
        .classify_fixed_initializer(ints, types.pointer(TypeId::LONG))
        .exists());
    assert!(!classifier
        .classify_fixed_initializer(TypeId::STRING, types.pointer(TypeId::INT))
        .exists());
    assert!(!classifier.classify_fixed_initializer(ints, TypeId::INT).exists());
}

#[test]
fn test_fixed_initializer_requires_unsafe() {
    let comp = Compilation::default();
    let types = comp.types();
    let conversion = comp
        .classifier()
        .classify_fixed_initializer(types.sz_array(TypeId::INT), types.pointer(TypeId::INT));
    assert!(!conversion.exists());
}
