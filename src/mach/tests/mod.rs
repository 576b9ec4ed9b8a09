use crate::mach::{Event, Limits, Opcode, Program, Runtime, Word};


fn runtime(program: &Program) -> Runtime {
    let limits = Limits {
        pool_size: 4096,
        cycles: 100,
    };
    let mut r = Runtime::with_limits(limits).unwrap();
    r.load(program).unwrap();
    r.start(0);
    r
}

/// Collects printed output until the program halts.
fn run(runtime: &mut Runtime) -> (String, Option<Word>) {
    let mut s = String::new();
    loop {
        match runtime.execute(100) {
            Event::Stopped => return (s, None),
            Event::Running => {}
            Event::Print(ps) => s.push_str(&ps),
            Event::Exit(code) => return (s, Some(code)),
            Event::Error(error) => {
                s.push_str(&format!("{}\n", error));
                return (s, None);
            }
        }
    }
}

fn imm(p: &mut Program, v: Word) {
    p.push_with(Opcode::Imm, v);
}
