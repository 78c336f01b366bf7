#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = enrollment_portal::run().await {
        eprintln!("enrollment-portal fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
