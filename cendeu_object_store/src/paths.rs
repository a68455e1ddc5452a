use chrono::{DateTime, Utc};

/// Format the blob key for an uploaded ledger file.
///
/// Keys are prefixed with the upload timestamp so repeated uploads of
/// the same file name never collide.
pub fn format_blob_key(uploaded_at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "imports/{}-{}",
        uploaded_at.format("%Y-%m-%dT%H-%M-%S%.3f"),
        file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blob_key_format() {
        let uploaded_at = Utc.with_ymd_and_hms(2023, 11, 30, 12, 0, 7).unwrap();
        let key = format_blob_key(uploaded_at, "ledger.txt");
        assert_eq!(key, "imports/2023-11-30T12-00-07.000-ledger.txt");
    }
}
