#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = course_report_bench::run().await {
        eprintln!("course-report-bench fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
