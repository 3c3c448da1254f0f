use spend_tracker::cli::run_cli;

fn main() {
    spend_tracker::init();
    if let Err(err) = run_cli() {
        eprintln!("spend_tracker_cli: {err}");
        std::process::exit(1);
    }
}
