use tinysh::Interpreter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // Logs go to stderr so they never mix with command output (RUST_LOG controls the level).
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let status = match Interpreter::default().repl() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {e:?}");
            1
        }
    };
    std::process::exit(status);
}
