use c4::lang::Lexer;
use c4::mach::{Event, Limits, Pool, Program, Runtime};

pub fn limits() -> Limits {
    Limits {
        pool_size: 4096,
        cycles: 100,
    }
}

/// Tokenizes `src` and hands its data pool to a fresh runtime.
pub fn boot(src: &str, program: &Program) -> Runtime {
    let mut lexer = Lexer::with_pool(src, Pool::data(limits().pool_size).unwrap());
    lexer.by_ref().for_each(drop);
    let (_, data, errors) = lexer.finish();
    assert!(errors.is_empty(), "{:?}", errors);
    let mut runtime = Runtime::new(limits(), data).unwrap();
    runtime.load(program).unwrap();
    runtime.start(0);
    runtime
}

pub fn exec(runtime: &mut Runtime) -> String {
    exec_n(runtime, 100)
}

pub fn exec_n(runtime: &mut Runtime, cycles: usize) -> String {
    let mut s = String::new();
    let mut slices = 0;
    loop {
        match runtime.execute(cycles) {
            Event::Stopped => break,
            Event::Running => {
                slices += 1;
                if slices > 1000 {
                    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
                    break;
                }
            }
            Event::Print(ps) => s.push_str(&ps),
            Event::Exit(code) => {
                s.push_str(&format!("exit({})\n", code));
                break;
            }
            Event::Error(error) => {
                s.push_str(&format!("{}\n", error));
                break;
            }
        }
    }
    s
}
