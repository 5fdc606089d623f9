#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = course_report_bench::run_auth_smoke().await {
        eprintln!("auth-smoke fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
