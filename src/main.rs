use tasktree::cli::{error, run};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // No-op outside Windows
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        std::process::exit(error::report(&e));
    }
}
