extern crate clap;
extern crate minic;
extern crate minic_backend;
extern crate minic_errors;
extern crate minic_ir;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use minic_errors::Reporter;


#[derive(Debug)]
enum Error {
    Io(io::Error),
    BuildFail,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[derive(Debug)]
struct Params {
    input: PathBuf,
    emit_ir: bool,
}

type Result<T> = ::std::result::Result<T, Error>;

fn main() {
    match run() {
        Ok(()) => {}
        Err(Error::BuildFail) => {
            ::std::process::exit(1);
        }
        Err(Error::Io(ref err)) => {
            eprintln!("ERREUR: {}", err);
            eprintln!("usage: minic path/to/file.c");
            ::std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let params = parse_params();
    let source = read_file(&params.input)?;
    let reporter = Reporter::new();
    let ir = minic::build_ir(&source, reporter.clone());
    emit_diagnostics(&reporter);
    let ir = match ir {
        Ok(ir) => ir,
        Err(()) => return Err(Error::BuildFail),
    };
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    if params.emit_ir {
        minic_ir::emit_program(&ir, &mut stdout)?;
        if let Err((function, err)) = minic_ir::validate_ir(&ir) {
            eprintln!("ir validation error in function {}: {:?}", function, err);
        }
        return Ok(());
    }
    emit_target(&ir, &mut stdout)?;
    Ok(())
}

#[cfg(not(feature = "aarch64"))]
fn emit_target<W: Write>(ir: &minic_ir::Program, out: W) -> io::Result<()> {
    minic_backend::emit_x86(ir, minic_backend::Platform::host(), out)
}

#[cfg(feature = "aarch64")]
fn emit_target<W: Write>(ir: &minic_ir::Program, out: W) -> io::Result<()> {
    minic_backend::emit_arm(ir, out)
}

fn parse_params() -> Params {
    use clap::{App, Arg};

    let matches = App::new("minic")
        .about("Compiles a small subset of C to assembly")
        .arg(
            Arg::with_name("input")
                .index(1)
                .required(true)
                .help("Path to the source file"),
        )
        .arg(
            Arg::with_name("emit-ir")
                .long("emit-ir")
                .help("Print the intermediate representation instead of assembly"),
        )
        .get_matches();

    Params {
        input: Path::new(matches.value_of_os("input").unwrap()).to_owned(),
        emit_ir: matches.is_present("emit-ir"),
    }
}

fn read_file(name: &Path) -> Result<String> {
    use std::fs::File;
    let mut file = File::open(name)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

fn emit_diagnostics(reporter: &Reporter) {
    let mut diagnostics = reporter.get_diagnostics();
    diagnostics.sort_by_key(|d| d.primary_span.map(|s| s.start));
    minic_errors::print_diagnostics(&diagnostics);
}
