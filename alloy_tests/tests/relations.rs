mod acyclicity {
    use alloy_tests::{expect_sat, run};

    #[test]
    fn a_field_forced_acyclic_by_fact_extracts_an_acyclic_relation() {
        let outcome = run("sig A { r: A } fact { no a: A | a in a.^r } run {} for 3");
        let instance = expect_sat(&outcome);
        let r = instance.relations.get("A.r").expect("A.r should be reported");
        for tuple in r.iter() {
            assert_ne!(tuple[0], tuple[1], "a direct self-loop is already a cycle");
        }
    }
}

mod abstract_sigs {
    use alloy_tests::{expect_sat, run};

    #[test]
    fn an_abstract_signature_is_exactly_partitioned_by_its_children() {
        let outcome = run("abstract sig Shape {} sig Circle extends Shape {} sig Square extends Shape {} run {} for 3");
        let instance = expect_sat(&outcome);
        let shape = instance.relations.get("Shape").expect("Shape should be reported");
        let circle = instance.relations.get("Circle").expect("Circle should be reported");
        let square = instance.relations.get("Square").expect("Square should be reported");
        assert_eq!(shape.len(), circle.len() + square.len());
        for tuple in circle.iter().chain(square.iter()) {
            assert!(shape.contains(tuple));
        }
    }
}
