use procalg_lts::{bisimulation_compare, bisimulation_reduce, read_aut, BisimPartitioner, Equivalence, Lts, TAU};

#[test]
fn deadlocks_are_merged() {
    let mut lts = read_aut("des (0, 2, 3)\n(0, \"a\", 1)\n(0, \"a\", 2)\n", "deadlocks.aut").unwrap();
    bisimulation_reduce(&mut lts, Equivalence::Strong);
    assert_eq!(lts.num_states(), 2);
    assert_eq!(lts.num_transitions(), 1);
}

#[test]
fn tau_prefix_is_invisible_only_for_branching() {
    // a.b versus tau.a.b
    let left = read_aut("des (0, 2, 3)\n(0, \"a\", 1)\n(1, \"b\", 2)\n", "left.aut").unwrap();
    let right = read_aut(
        "des (0, 3, 4)\n(0, \"tau\", 1)\n(1, \"a\", 2)\n(2, \"b\", 3)\n",
        "right.aut",
    )
    .unwrap();
    assert!(!bisimulation_compare(&left, &right, Equivalence::Strong));
    assert!(bisimulation_compare(&left, &right, Equivalence::Branching));
    assert!(bisimulation_compare(&left, &right, Equivalence::DivergencePreservingBranching));
}

#[test]
fn choice_after_tau_is_not_branching_bisimilar() {
    // a + tau.b versus a + b
    let mut left = Lts::new(3, 0);
    let a = left.add_label("a");
    let b = left.add_label("b");
    left.add_transition(0, a, 2);
    left.add_transition(0, TAU, 1);
    left.add_transition(1, b, 2);
    let mut right = Lts::new(2, 0);
    let a = right.add_label("a");
    let b = right.add_label("b");
    right.add_transition(0, a, 1);
    right.add_transition(0, b, 1);
    assert!(!bisimulation_compare(&left, &right, Equivalence::Branching));
}

#[test]
fn tau_cycle_collapses_unless_divergence_is_preserved() {
    let lts = read_aut(
        "des (0, 4, 3)\n(0, \"tau\", 1)\n(1, \"tau\", 0)\n(1, \"a\", 2)\n(0, \"a\", 2)\n",
        "cycle.aut",
    )
    .unwrap();
    let mut branching = lts.clone();
    bisimulation_reduce(&mut branching, Equivalence::Branching);
    assert_eq!(branching.num_states(), 2);
    assert!(branching.transitions().iter().all(|t| t.label != TAU));

    let mut divergent = lts;
    bisimulation_reduce(&mut divergent, Equivalence::DivergencePreservingBranching);
    assert_eq!(divergent.num_states(), 2);
    let init = divergent.initial_state();
    assert!(divergent
        .transitions()
        .iter()
        .any(|t| t.from == init && t.label == TAU && t.to == init));
}

#[test]
fn entry_state_of_an_a_cycle_joins_the_cycle() {
    // every state can do `a` forever, so all three are strongly bisimilar
    let lts = read_aut("des (0, 3, 3)\n(0, \"a\", 1)\n(1, \"a\", 2)\n(2, \"a\", 1)\n", "cycle.aut").unwrap();
    let partitioner = BisimPartitioner::new(&lts, Equivalence::Strong.into());
    assert_eq!(partitioner.num_eq_classes(), 1);
    assert!(partitioner.in_same_class(1, 2));
    assert!(partitioner.in_same_class(0, 1));

    // a `b` loop on state 0 sets it apart
    let mut with_exit = lts.clone();
    let b = with_exit.add_label("b");
    with_exit.add_transition(0, b, 0);
    let partitioner = BisimPartitioner::new(&with_exit, Equivalence::Strong.into());
    assert_eq!(partitioner.num_eq_classes(), 2);
    assert!(partitioner.in_same_class(1, 2));
    assert!(!partitioner.in_same_class(0, 1));
}

#[test]
fn partitioner_classes_cover_every_state() {
    let mut lts = Lts::new(5, 0);
    let a = lts.add_label("a");
    for s in 0..4 {
        lts.add_transition(s, a, s + 1);
    }
    let partitioner = BisimPartitioner::new(&lts, Equivalence::Strong.into());
    assert_eq!(partitioner.num_eq_classes(), 5);
    let mut classes = partitioner.classes();
    classes.sort_unstable();
    assert_eq!(classes, vec![0, 1, 2, 3, 4]);
}
