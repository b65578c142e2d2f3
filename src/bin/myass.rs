// `myass [-f] <source-file>`: reads a source file, assembles it, and writes
// the resulting machine code to stdout. `-f` switches to a colorized,
// offset-annotated hex dump instead of raw bytes. This binary is a thin
// demonstration of the library's public API: file I/O, argument parsing and
// pretty-printing all live here, outside `myass::assembler`.

use myass::Assembler;
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use termion::color::{Fg, Green, Red, Reset, Yellow};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let (pretty, path) = match args.as_slice() {
        [flag, path] if flag == "-f" => (true, path.as_str()),
        [path] => (false, path.as_str()),
        _ => {
            eprintln!("usage: myass [-f] <source-file>");
            return ExitCode::FAILURE;
        }
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}error:{} cannot read '{}': {}", Fg(Red), Fg(Reset), path, err);
            return ExitCode::FAILURE;
        }
    };

    let assembler = Assembler::new();
    let assembled = match assembler.assemble(&source) {
        Ok(assembled) => assembled,
        Err(err) => {
            eprintln!("{}{}{}", Fg(Red), err, Fg(Reset));
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if pretty {
        print_hex_dump(&mut out, &assembled);
    } else {
        let _ = out.write_all(&assembled.code);
    }

    ExitCode::SUCCESS
}

fn print_hex_dump(out: &mut impl Write, assembled: &myass::Assembled) {
    for (index, instruction) in assembled.instructions.iter().enumerate() {
        let bytes = &assembled.code[instruction.offset..instruction.offset + instruction.len];
        let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();

        let _ = writeln!(
            out,
            "{}[{:04}]{} {}{:>5}{}: {}",
            Fg(Yellow),
            index,
            Fg(Reset),
            Fg(Green),
            instruction.offset,
            Fg(Reset),
            hex.join(" ")
        );
    }
}
