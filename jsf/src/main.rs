use jsf::core::CoreApp;

fn main() {
    if let Err(e) = CoreApp::run() {
        eprintln!("\nError: {}\n", e);
        std::process::exit(1);
    }
}
