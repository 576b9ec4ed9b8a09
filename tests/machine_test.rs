use c4::lang::ErrorCode;
use c4::mach::{Address, Opcode, Pool, Program, Runtime, Segment, Word};
use std::io::Write;

mod common;
use common::*;

fn program(f: impl FnOnce(&mut Program)) -> Program {
    let mut p = Program::new();
    f(&mut p);
    p
}

#[test]
fn test_bootstrap() {
    let mut runtime = Runtime::new(limits(), Pool::data(16).unwrap()).unwrap();
    runtime.load(&Program::bootstrap()).unwrap();
    runtime.start(0);
    let mut out = vec![];
    assert_eq!(runtime.run(&mut out), Ok(30));
    assert_eq!(String::from_utf8(out).unwrap(), "exit(30)\n");
    assert_eq!(exec(&mut boot("", &Program::bootstrap())), "exit(30)\n");
}

#[test]
fn test_bootstrap_listing() {
    assert_eq!(
        Program::bootstrap().to_string(),
        "    0  IMM 10\n    2  PUSH\n    3  IMM 20\n    5  ADD\n    6  PUSH\n    7  EXIT\n"
    );
}

#[test]
fn test_add_keeps_stack_balanced() {
    let p = program(|p| {
        p.push_with(Opcode::Imm, 10);
        p.push(Opcode::Push);
        p.push_with(Opcode::Imm, 20);
        p.push(Opcode::Add);
    });
    let mut runtime = boot("", &p);
    let sp = runtime.registers().sp;
    runtime.execute(3);
    assert_eq!(runtime.registers().ax, 20);
    assert_eq!(runtime.registers().sp, sp - 1);
    runtime.execute(1);
    assert_eq!(runtime.registers().ax, 30);
    assert_eq!(runtime.registers().sp, sp);
}

#[test]
fn test_call_enter_leave() {
    let mut p = Program::new();
    let call = p.push_branch(Opcode::Call, 0);
    p.push(Opcode::Exit);
    let f = p.here();
    p.push_with(Opcode::Ent, 2);
    p.push(Opcode::Lev);
    p.patch(call, f);
    let mut runtime = boot("", &p);
    let before = runtime.registers();
    runtime.execute(3);
    let after = runtime.registers();
    assert_eq!(after.pc, 2);
    assert_eq!(after.bp, before.bp);
    assert_eq!(after.sp, before.sp);
}

#[test]
fn test_reload_shorter_program() {
    let mut runtime = boot("", &Program::bootstrap());
    assert_eq!(exec(&mut runtime), "exit(30)\n");
    let p = program(|p| {
        p.push_with(Opcode::Imm, 5);
        p.push(Opcode::Push);
        p.push(Opcode::Exit);
    });
    runtime.load(&p).unwrap();
    runtime.start(0);
    assert_eq!(exec(&mut runtime), "exit(5)\n");
    assert_eq!(runtime.memory().code().len(), 4);
}

#[test]
fn test_unknown_instruction() {
    let mut runtime = boot("", &Program::from_words(vec![999]));
    assert_eq!(
        exec(&mut runtime),
        "UNKNOWN INSTRUCTION AT 0; unknown instruction:999\n"
    );
}

#[test]
fn test_unknown_instruction_status() {
    let mut runtime = boot("", &Program::from_words(vec![Opcode::Exit as Word + 1]));
    let error = runtime.run(&mut std::io::sink()).unwrap_err();
    assert!(error.is(ErrorCode::UnknownInstruction));
    assert!(error.status() < 0);
}

#[test]
fn test_faults_do_not_panic() {
    let far = Address::new(Segment::Data, 5000).to_word();
    let cases: Vec<(Program, ErrorCode)> = vec![
        (
            program(|p| {
                p.push_with(Opcode::Imm, far);
                p.push(Opcode::Li);
            }),
            ErrorCode::SegmentationFault,
        ),
        (
            program(|p| {
                p.push_with(Opcode::Imm, 0);
                p.push(Opcode::Lc);
            }),
            ErrorCode::SegmentationFault,
        ),
        (
            program(|p| {
                p.push_branch(Opcode::Call, 0);
            }),
            ErrorCode::StackOverflow,
        ),
        (
            program(|p| {
                p.push(Opcode::Sub);
            }),
            ErrorCode::StackUnderflow,
        ),
        (
            program(|p| {
                p.push_with(Opcode::Imm, 1);
                p.push(Opcode::Push);
                p.push_with(Opcode::Imm, 0);
                p.push(Opcode::Div);
            }),
            ErrorCode::DivisionByZero,
        ),
    ];
    for (p, code) in cases {
        let mut runtime = boot("", &p);
        match runtime.run(&mut std::io::sink()) {
            Err(error) => assert_eq!(error.code(), code as u16, "{}", error),
            Ok(n) => panic!("exit({})", n),
        }
    }
}

#[test]
fn test_printf() {
    let src = r#"char *f = "%d-%s|%5d|%-3c|%x\n"; char *s = "ok";"#;
    let strings: Vec<Word> = c4::lang::Lexer::new(src)
        .unwrap()
        .filter_map(|t| match t {
            c4::lang::token::Token::Num(n) => Some(n),
            _ => None,
        })
        .collect();
    // Pools fill identically, so the addresses match those in `boot`.
    let (f, s) = (strings[0], strings[1]);
    let p = program(|p| {
        for arg in &[f, 42, s, 7, b'z' as Word, 255] {
            p.push_with(Opcode::Imm, *arg);
            p.push(Opcode::Push);
        }
        p.push(Opcode::Prtf);
        p.push_with(Opcode::Adj, 6);
        p.push(Opcode::Push);
        p.push(Opcode::Exit);
    });
    let mut runtime = boot(src, &p);
    let top = runtime.registers().sp;
    assert_eq!(exec(&mut runtime), "42-ok|    7|z  |ff\nexit(19)\n");
    assert_eq!(runtime.registers().sp, top - 1);
}

#[test]
fn test_open_read_close() {
    let path = std::env::temp_dir().join(format!("c4-machine-{}", std::process::id()));
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"hello world")
        .unwrap();
    let src = format!("\"{}\" \"%.5s\\n\"", path.display());
    let mut lexer = c4::lang::Lexer::new(&src).unwrap();
    let name = lexer.next().and_then(|t| t.value()).unwrap();
    let fmt = lexer.next().and_then(|t| t.value()).unwrap();

    let mut p = Program::new();
    p.push_with(Opcode::Ent, 2);
    // buf = malloc(16)
    p.push_with(Opcode::Lea, -2);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, 16);
    p.push(Opcode::Push);
    p.push(Opcode::Malc);
    p.push_with(Opcode::Adj, 1);
    p.push(Opcode::Si);
    // fd = open(name, 0)
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, name);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, 0);
    p.push(Opcode::Push);
    p.push(Opcode::Open);
    p.push_with(Opcode::Adj, 2);
    p.push(Opcode::Si);
    // n = read(fd, buf, 16)
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push_with(Opcode::Lea, -2);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, 16);
    p.push(Opcode::Push);
    p.push(Opcode::Read);
    p.push_with(Opcode::Adj, 3);
    p.push(Opcode::Push);
    // printf("%.5s\n", buf)
    p.push_with(Opcode::Imm, fmt);
    p.push(Opcode::Push);
    p.push_with(Opcode::Lea, -2);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push(Opcode::Prtf);
    p.push_with(Opcode::Adj, 2);
    // exit(n + close(fd))
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push(Opcode::Clos);
    p.push_with(Opcode::Adj, 1);
    p.push(Opcode::Add);
    p.push(Opcode::Push);
    p.push(Opcode::Exit);

    let mut runtime = boot(&src, &p);
    assert_eq!(exec(&mut runtime), "hello\nexit(11)\n");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_open_missing_file() {
    let src = "\"/no/such/c4/file\"";
    let name = c4::lang::Lexer::new(src)
        .unwrap()
        .next()
        .and_then(|t| t.value())
        .unwrap();
    let p = program(|p| {
        p.push_with(Opcode::Imm, name);
        p.push(Opcode::Push);
        p.push_with(Opcode::Imm, 0);
        p.push(Opcode::Push);
        p.push(Opcode::Open);
        p.push_with(Opcode::Adj, 2);
        p.push(Opcode::Push);
        p.push(Opcode::Exit);
    });
    assert_eq!(exec(&mut boot(src, &p)), "exit(-1)\n");
}

#[test]
fn test_slices_resume() {
    let mut p = Program::new();
    p.push_with(Opcode::Ent, 1);
    let top = p.here();
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Push);
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, 1);
    p.push(Opcode::Add);
    p.push(Opcode::Si);
    p.push(Opcode::Push);
    p.push_with(Opcode::Imm, 100);
    p.push(Opcode::Lt);
    p.push_branch(Opcode::Jnz, top);
    p.push_with(Opcode::Lea, -1);
    p.push(Opcode::Li);
    p.push(Opcode::Push);
    p.push(Opcode::Exit);
    assert_eq!(exec_n(&mut boot("", &p), 7), "exit(100)\n");
}
