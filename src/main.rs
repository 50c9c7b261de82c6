fn main() {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    if let Err(err) = firstfill::app::cli::run() {
        eprintln!("error: {}", err.message);
        std::process::exit(1);
    }
}
