fn main() {
    if let Err(err) = event_modeling_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
