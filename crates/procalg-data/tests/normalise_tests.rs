use procalg_data::parse::parse_specification;
use procalg_data::{DataSpecification, Sort, SpecificationError};

fn spec(text: &str) -> DataSpecification {
    parse_specification(text, "test.spec").unwrap()
}

const TYPES: &str = "
sort Color = struct red | green | blue;
     Tree = struct leaf(value: Nat) | node(left: Tree, right: Tree);
     Stream;
cons scons: Bool # Stream -> Stream;
map  first: Stream -> Bool;
var  b: Bool; s: Stream;
eqn  first(scons(b, s)) = b;
";

#[test]
fn normalisation_is_idempotent() {
    let s = spec(TYPES);
    let once = s.normalised().unwrap();
    let again = once.to_specification();
    let twice = again.normalised().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn normalisation_is_cached_until_mutation() {
    let mut s = spec(TYPES);
    assert!(s.needs_normalisation());
    let first: *const _ = s.normalised().unwrap();
    assert!(!s.needs_normalisation());
    let second: *const _ = s.normalised().unwrap();
    assert_eq!(first, second);
    s.add_sort(Sort::basic("Extra"));
    assert!(s.needs_normalisation());
    assert!(s.normalised().unwrap().sorts().contains(&Sort::basic("Extra")));
}

#[test]
fn bag_imports_its_dependencies() {
    let s = spec("sort B = Bag(Nat);");
    let n = s.normalised().unwrap();
    for sort in [
        Sort::basic("B"),
        Sort::set(Sort::nat()),
        Sort::fbag(Sort::nat()),
        Sort::nat(),
        Sort::pos(),
        Sort::bool_(),
    ] {
        assert!(n.sorts().contains(&sort), "missing {sort}");
    }
    assert!(!n.constructors_of(&Sort::nat()).is_empty());
    assert!(!n.constructors_of(&Sort::pos()).is_empty());
    // A structured alias names its right hand side.
    assert_eq!(n.normalise_sort(&Sort::bag(Sort::nat())), Sort::basic("B"));
    assert!(!n.sorts().contains(&Sort::bag(Sort::nat())));
}

#[test]
fn alias_cycles_are_rejected() {
    let s = spec("sort A = B; B = C; C = A;");
    assert!(matches!(s.normalised(), Err(SpecificationError::CircularAlias { .. })));
}

#[test]
fn two_aliases_naming_each_other_are_rejected() {
    let s = spec("sort A = B; B = A;");
    let err = s.normalised().unwrap_err();
    assert!(matches!(err, SpecificationError::CircularAlias { ref alias } if alias == "A" || alias == "B"));
    let message = err.to_string();
    assert!(message.contains("is defined in terms of itself"), "{message}");
    assert!(message.contains("Sort alias A") || message.contains("Sort alias B"), "{message}");
}

#[test]
fn conflicting_alias_definitions_are_rejected() {
    let s = spec("sort A = List(Nat); A = List(Bool);");
    assert!(matches!(s.normalised(), Err(SpecificationError::DuplicateAlias { .. })));
}

#[test]
fn aliases_resolve_inside_compound_sorts() {
    let s = spec("sort N = Nat; L = List(N); map f: N -> L;");
    let n = s.normalised().unwrap();
    let f = n.find_mapping("f");
    assert_eq!(f.len(), 1);
    assert_eq!(
        f[0].sort(),
        &Sort::function(vec![Sort::nat()], Sort::basic("L"))
    );
}

#[test]
fn ill_typed_equations_are_rejected() {
    let err = parse_specification("map f: Bool -> Nat; var b: Bool; eqn f(b) = b;", "bad.spec").unwrap_err();
    assert!(err.to_string().contains("Type error"), "{err}");
}

#[test]
fn finiteness() {
    let s = spec(TYPES);
    let n = s.normalised().unwrap();
    assert!(n.is_certainly_finite(&Sort::bool_()));
    assert!(!n.is_certainly_finite(&Sort::nat()));
    assert!(!n.is_certainly_finite(&Sort::pos()));
    assert!(n.is_certainly_finite(&Sort::set(Sort::bool_())));
    assert!(!n.is_certainly_finite(&Sort::list(Sort::bool_())));
    assert!(!n.is_certainly_finite(&Sort::bag(Sort::bool_())));
    assert!(n.is_certainly_finite(&Sort::basic("Color")));
    assert!(!n.is_certainly_finite(&Sort::basic("Tree")));
    assert!(!n.is_certainly_finite(&Sort::basic("Stream")));
    assert!(n.is_certainly_finite(&Sort::function(
        vec![Sort::bool_()],
        Sort::basic("Color")
    )));
    assert!(!n.is_certainly_finite(&Sort::function(vec![Sort::nat()], Sort::bool_())));
}

#[test]
fn merged_specifications_normalise_together() {
    let mut a = spec("sort Color = struct red | green;");
    let b = spec("map swap: Color -> Color;");
    a.merge(&b);
    let n = a.normalised().unwrap();
    assert_eq!(n.find_mapping("swap").len(), 1);
    assert_eq!(n.constructors_of(&Sort::basic("Color")).len(), 2);
}
