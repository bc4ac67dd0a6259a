#[tokio::main]
async fn main() {
    if let Err(e) = mediqueue::run().await {
        tracing::error!("{e}");
        eprintln!("mediqueue: {e}");
        std::process::exit(1);
    }
}
