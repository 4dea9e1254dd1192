mod properties {
    use alloy_tests::{expect_sat, run};

    #[test]
    fn running_the_same_source_twice_gives_the_same_verdict_and_diagnostics() {
        let source = "sig A { r: A } fact { no a: A | a in a.^r } run {} for 3";
        let first = run(source);
        let second = run(source);
        assert_eq!(first.report, second.report);
        assert_eq!(first.diagnostics.len(), second.diagnostics.len());
    }

    #[test]
    fn an_extracted_relation_always_lies_within_its_declared_bounds() {
        let outcome = run("sig A { r: A } run {} for 3");
        let instance = expect_sat(&outcome);
        let universe_size = instance.universe.len();
        let r = instance.relations.get("A.r").expect("A.r should be reported");
        for tuple in r.iter() {
            assert!(tuple.iter().all(|atom| *atom < universe_size));
        }
    }
}

mod errors {
    use alloy_tests::{expect_model_errors, run};

    #[test]
    fn a_syntax_error_never_reaches_the_solver() {
        let outcome = run("sig A {} fact { @@@ } run {} for 3");
        expect_model_errors(&outcome);
    }

    #[test]
    fn an_undefined_command_name_is_reported_as_a_model_error() {
        let outcome = alloy_tests::run_named("sig A {} run {} for 3", "nonexistent");
        expect_model_errors(&outcome);
    }
}
