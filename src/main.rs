use std::process;

fn main() {
    if let Err(e) = exprkit::cli::run() {
        eprintln!("{:?}", miette::Report::new(e));
        process::exit(1);
    }
}
