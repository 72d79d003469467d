fn main() {
    pageir_cli::init_tracing();
    if let Err(err) = pageir_cli::run_from_env() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
