#[tokio::main]
async fn main() {
    if let Err(e) = clinicdesk::run().await {
        tracing::error!("{e}");
        eprintln!("clinicdesk: {e}");
        std::process::exit(1);
    }
}
