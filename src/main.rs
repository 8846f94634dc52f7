#[tokio::main]
async fn main() -> std::io::Result<()> {
    skirmish_server::run_with_config().await
}
