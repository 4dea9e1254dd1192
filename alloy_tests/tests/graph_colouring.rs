mod graph_colouring {
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;
    use alloy_sat::reports::Report;

    /// Encodes "vertex v has at least one of its `colours` colours, no
    /// vertex has two" plus "adjacent vertices differ", for a triangle
    /// (every vertex adjacent to every other).
    fn var(vertex: usize, colour: usize, colours: usize) -> i64 {
        (vertex * colours + colour + 1) as i64
    }

    fn triangle_colouring(colours: usize) -> String {
        let vertices = 3;
        let mut clauses = Vec::new();
        for v in 0..vertices {
            let clause: Vec<String> = (0..colours).map(|c| var(v, c, colours).to_string()).collect();
            clauses.push(format!("{} 0", clause.join(" ")));
        }
        for v1 in 0..vertices {
            for v2 in (v1 + 1)..vertices {
                for c in 0..colours {
                    clauses.push(format!("-{} -{} 0", var(v1, c, colours), var(v2, c, colours)));
                }
            }
        }
        let header = format!("p cnf {} {}\n", vertices * colours, clauses.len());
        header + &clauses.join("\n") + "\n"
    }

    #[test]
    fn a_triangle_is_satisfiable_with_three_colours() {
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs(triangle_colouring(3).as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
    }

    #[test]
    fn a_triangle_is_unsatisfiable_with_two_colours() {
        let mut ctx = Context::from_config(Config::default());
        ctx.read_dimacs(triangle_colouring(2).as_bytes()).unwrap();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }
}
