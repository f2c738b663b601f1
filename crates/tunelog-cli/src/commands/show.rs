use chrono::NaiveDate;
use tunelog_core::SyncService;

use crate::error::CliError;

pub async fn run_show(service: &SyncService, date: Option<NaiveDate>) -> Result<(), CliError> {
    let date = date.unwrap_or_else(|| service.today());
    let document = service
        .read_day(date)
        .await?
        .ok_or(CliError::DocumentNotFound(date))?;
    print!("{}", document.content);
    Ok(())
}
