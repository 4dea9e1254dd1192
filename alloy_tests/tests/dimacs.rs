mod dimacs {
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;
    use alloy_sat::reports::Report;

    #[test]
    fn a_satisfiable_cnf_document_is_decided_sat() {
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs("p cnf 3 3\n1 2 0\n-1 2 0\n1 -2 0\n".as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
    }

    #[test]
    fn contradictory_unit_clauses_are_decided_unsat() {
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs("p cnf 1 2\n1 0\n-1 0\n".as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }

    #[test]
    fn writing_and_reading_back_a_cnf_preserves_its_clauses() {
        let mut original = Context::from_config(Config::default());
        original.read_dimacs("p cnf 3 2\n1 -2 0\n2 3 0\n".as_bytes()).unwrap();

        let mut buffer = Vec::new();
        original.write_dimacs(&mut buffer).unwrap();

        let mut reread = Context::from_config(Config::default());
        reread.read_dimacs(buffer.as_slice()).unwrap();

        assert_eq!(original.solve().unwrap(), reread.solve().unwrap());
    }
}
