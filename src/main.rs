fn main() {
    if let Err(e) = medscreen_lib::run() {
        tracing::error!("{e}");
        eprintln!("medscreen: {e}");
        std::process::exit(1);
    }
}
