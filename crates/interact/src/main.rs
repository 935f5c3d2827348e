fn main() {
    if let Err(err) = interact::cli::main() {
        eprintln!("error: {err:#}");
        std::process::exit(interact::cli::exit_code(&err));
    }
}
