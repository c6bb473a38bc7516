fn main() {
    if let Err(error) = coi_dashboard_lib::run() {
        eprintln!("{:#}", error);
        std::process::exit(1);
    }
}
