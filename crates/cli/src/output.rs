use crate::error::CliError;
use engine_runtime::summary::JobSummary;

fn render(summary: &JobSummary) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(summary)?;
    Ok(json)
}

pub async fn write_report(summary: &JobSummary, path: String) -> Result<(), CliError> {
    let report_json = render(summary)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(summary: &JobSummary) -> Result<(), CliError> {
    let report_json = render(summary)?;
    println!("{report_json}");
    Ok(())
}
