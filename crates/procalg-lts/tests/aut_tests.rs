use procalg_lts::{bisimulation_reduce, load_aut, save_aut, to_aut_string, Equivalence, LtsError};

const BUFFER: &str = r#"des (0, 6, 4)
(0, "in", 1)
(1, "tau", 2)
(2, "out", 0)
(0, "in", 3)
(3, "out", 0)
(1, "out", 0)
"#;

#[test]
fn saved_reduction_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("buffer.aut");
    std::fs::write(&input, BUFFER).unwrap();

    let mut lts = load_aut(&input).unwrap();
    assert_eq!(lts.num_states(), 4);
    assert_eq!(lts.num_transitions(), 6);
    bisimulation_reduce(&mut lts, Equivalence::Branching);

    let output = dir.path().join("reduced.aut");
    save_aut(&lts, &output).unwrap();
    let reloaded = load_aut(&output).unwrap();
    assert_eq!(reloaded.num_states(), lts.num_states());
    assert_eq!(reloaded.num_transitions(), lts.num_transitions());
    assert_eq!(reloaded.initial_state(), lts.initial_state());
    assert_eq!(to_aut_string(&reloaded), to_aut_string(&lts));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_aut(&dir.path().join("absent.aut")).unwrap_err();
    assert!(matches!(err, LtsError::Io { .. }), "{err:?}");
}
