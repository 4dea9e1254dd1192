mod boundary {
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;
    use alloy_sat::reports::Report;
    use alloy_tests::{expect_unsat, run};

    fn var(pigeon: usize, hole: usize, holes: usize) -> i64 {
        (pigeon * holes + hole + 1) as i64
    }

    /// Pigeonhole(n+1, n): `n+1` pigeons into `n` holes, each pigeon in some
    /// hole, no two pigeons sharing a hole -- unsatisfiable for every `n`.
    fn pigeonhole_unsat(holes: usize) {
        let pigeons = holes + 1;
        let mut cnf = String::new();
        for p in 0..pigeons {
            let clause: Vec<String> = (0..holes).map(|h| var(p, h, holes).to_string()).collect();
            cnf.push_str(&clause.join(" "));
            cnf.push_str(" 0\n");
        }
        for h in 0..holes {
            for p1 in 0..pigeons {
                for p2 in (p1 + 1)..pigeons {
                    cnf.push_str(&format!("-{} -{} 0\n", var(p1, h, holes), var(p2, h, holes)));
                }
            }
        }
        let header = format!("p cnf {} {}\n", pigeons * holes, cnf.lines().count());
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs((header + &cnf).as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }

    #[test]
    fn pigeonhole_two_holes_three_pigeons_is_unsat() {
        pigeonhole_unsat(2);
    }

    #[test]
    fn pigeonhole_three_holes_four_pigeons_is_unsat() {
        pigeonhole_unsat(3);
    }

    #[test]
    fn a_single_unit_clause_is_sat() {
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs("p cnf 1 1\n1 0\n".as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
    }

    #[test]
    fn requesting_more_tuples_than_the_upper_bound_allows_is_unsat() {
        let outcome = run("sig A {} fact { #A = 5 } run {} for 3");
        expect_unsat(&outcome);
    }
}
