use anyhow::Context;
use clap::Parser;
use tracing::error;

use review_digest::{app, config::Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                message,
                "panic occurred"
            );
        } else {
            error!(thread = thread_name, message, "panic occurred");
        }
    }));

    let cli = Cli::parse();
    app::run(cli).await.context("review digest failed")
}
