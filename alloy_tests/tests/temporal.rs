mod temporal {
    use alloy_tests::{expect_sat_trace, expect_unsat, run};

    #[test]
    fn always_some_gives_a_trace_where_every_state_is_nonempty_with_a_valid_loop() {
        let outcome = run("var sig S {} fact { always some S } run {} for 3 but 3 steps");
        let trace = expect_sat_trace(&outcome);
        assert_eq!(trace.states.len(), 3);
        assert!(trace.loop_state < 3);
        for state in &trace.states {
            let s = state.relations.get("S").expect("S should be reported");
            assert!(!s.is_empty());
        }
    }

    #[test]
    fn always_empty_contradicts_eventually_nonempty() {
        let outcome = run("var sig S {} fact { always no S and eventually some S } run {} for 3 but 3 steps");
        expect_unsat(&outcome);
    }
}
