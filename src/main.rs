#[tokio::main]
async fn main() -> anyhow::Result<()> {
    project_chat::run().await
}
