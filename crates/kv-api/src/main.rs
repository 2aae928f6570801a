#[tokio::main]
async fn main() {
    if let Err(err) = kv_api::run().await {
        eprintln!("kv-api failed to start: {err}");
        std::process::exit(1);
    }
}
