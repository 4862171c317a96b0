#![forbid(unsafe_code)]

use std::path::Path;

use crimewatch_storage::RecordStore;

/// One line per stored crime report, oldest first, followed by a count line.
pub fn execute_list_reports(store_path: &Path) -> Result<String, String> {
    let store = RecordStore::open(store_path);
    let reports = store
        .crime_reports()
        .map_err(|e| format!("failed to read crime reports: {e}"))?;
    let mut lines: Vec<String> = reports
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}",
                r.crime_type,
                r.location,
                r.name,
                r.attachment.as_field()
            )
        })
        .collect();
    lines.push(format!("reports={}", reports.len()));
    Ok(lines.join("\n"))
}

/// Usernames only. Passwords are never printed.
pub fn execute_list_users(store_path: &Path) -> Result<String, String> {
    let store = RecordStore::open(store_path);
    let users = store
        .credentials()
        .map_err(|e| format!("failed to read credentials: {e}"))?;
    let mut lines: Vec<String> = users.iter().map(|u| u.username.clone()).collect();
    lines.push(format!("users={}", users.len()));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimewatch_kernel_contracts::credential::CredentialRecord;
    use crimewatch_kernel_contracts::report::{AttachmentRef, CrimeReportRecord};

    #[test]
    fn at_store_cli_01_empty_store_prints_zero_counts() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(execute_list_reports(dir.path()).unwrap(), "reports=0");
        assert_eq!(execute_list_users(dir.path()).unwrap(), "users=0");
    }

    #[test]
    fn at_store_cli_02_listings_follow_file_order_and_hide_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path());
        store
            .append(&CredentialRecord {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                email: "a@example.com".to_string(),
            })
            .unwrap();
        store
            .append(&CrimeReportRecord {
                name: "Jo".to_string(),
                phone_number: "555".to_string(),
                location: "Main St".to_string(),
                crime_type: "Theft".to_string(),
                description: "Bike taken".to_string(),
                attachment: AttachmentRef::Absent,
            })
            .unwrap();

        let users = execute_list_users(dir.path()).unwrap();
        assert_eq!(users, "alice\nusers=1");
        assert!(!users.contains("hunter2"));
        assert_eq!(
            execute_list_reports(dir.path()).unwrap(),
            "Theft\tMain St\tJo\tNo Attachment\nreports=1"
        );
    }
}
