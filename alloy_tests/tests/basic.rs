mod basic {
    use alloy_tests::{expect_sat, expect_unsat, run};

    #[test]
    fn a_bare_signature_is_satisfiable_with_exactly_the_scoped_atoms() {
        let outcome = run("sig A {} run {} for 3");
        let instance = expect_sat(&outcome);
        let a = instance.relations.get("A").expect("A should be reported");
        assert_eq!(a.len(), 3);
        let names: Vec<&str> = a.iter().map(|t| instance.universe[t[0]].as_str()).collect();
        assert_eq!(names, vec!["A$0", "A$1", "A$2"]);
    }

    #[test]
    fn an_empty_sig_forced_by_fact_is_satisfiable_with_no_atoms() {
        let outcome = run("sig A {} fact { no A } run {} for 3");
        let instance = expect_sat(&outcome);
        let a = instance.relations.get("A").expect("A should be reported");
        assert!(a.is_empty());
    }

    #[test]
    fn contradictory_multiplicity_facts_are_unsatisfiable() {
        let outcome = run("sig A {} fact { some A and no A } run {} for 3");
        expect_unsat(&outcome);
    }
}

mod commands {
    use alloy_tests::{expect_sat, run_named};

    #[test]
    fn a_named_command_is_resolved_by_name_rather_than_position() {
        let source = "sig A {} sig B {} check first {} for 3 run second {} for 2";
        let outcome = run_named(source, "second");
        let instance = expect_sat(&outcome);
        assert_eq!(instance.relations.get("A").map(|r| r.len()), Some(2));
    }
}
