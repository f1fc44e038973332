use super::Notifier;
use crate::error::Error;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Appends notifications to the file named by the channel id.
pub struct OutboxNotifier;

impl Notifier for OutboxNotifier {
    fn publish(&self, channel_id: &str, body: &str, subject: &str) -> Result<(), Error> {
        let path = Path::new(channel_id);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "Date: {}", Utc::now().to_rfc3339())?;
        writeln!(file, "Subject: {}", subject)?;
        writeln!(file)?;
        writeln!(file, "{}", body.trim_end())?;
        writeln!(file, "---")?;
        Ok(())
    }
}
