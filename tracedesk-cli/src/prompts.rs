use anyhow::Result;
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use uuid::Uuid;

use tracedesk_core::models::split_lines;
use tracedesk_core::{RegisterRequest, Requirement, TestCase, TestCaseStatus};

/// Prompts for an account password without echoing it
pub fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    Ok(password)
}

/// Prompts for whatever registration details were not given as flags
pub fn prompt_registration(name: Option<&str>, email: Option<&str>) -> Result<RegisterRequest> {
    let name = match name {
        Some(n) => n.to_string(),
        None => Text::new("Name:").prompt()?,
    };
    let email = match email {
        Some(e) => e.to_string(),
        None => Text::new("Email:").prompt()?,
    };
    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_custom_confirmation_message("Confirm password:")
        .prompt()?;

    Ok(RegisterRequest {
        name,
        email,
        password,
    })
}

/// Prompts the user for a new requirement
pub fn prompt_new_requirement() -> Result<Requirement> {
    let req_id = Text::new("Requirement id:").with_placeholder("REQ-001").prompt()?;
    let content = inquire::Editor::new("Content:").prompt()?;

    let mut req = Requirement::new(req_id.trim(), content.trim());
    req.classification = Text::new("Classification:").with_default("Functional").prompt()?;
    req.module = Text::new("Module:").prompt()?;

    Ok(req)
}

/// Prompts the user for a new test case. The id is provisional; the server
/// may assign its own.
pub fn prompt_new_test_case(description: Option<&str>) -> Result<TestCase> {
    let description = match description {
        Some(d) => d.to_string(),
        None => Text::new("Description:").prompt()?,
    };

    let mut tc = TestCase::new(provisional_test_id(), description);
    tc.preconditions = Text::new("Preconditions:").prompt()?;

    // One step / outcome per line
    tc.steps = split_lines(&inquire::Editor::new("Steps (one per line):").prompt()?);
    tc.expected_outcome =
        split_lines(&inquire::Editor::new("Expected outcomes (one per line):").prompt()?);

    tc.classification = Text::new("Classification:").prompt()?;
    tc.module = Text::new("Module:").prompt()?;

    let status_options = vec![
        TestCaseStatus::NotRun,
        TestCaseStatus::Passed,
        TestCaseStatus::Failed,
        TestCaseStatus::Blocked,
    ];
    tc.status = Some(Select::new("Status:", status_options).prompt()?);

    Ok(tc)
}

/// Asks before a destructive action; `yes` skips the prompt
pub fn confirm_delete(what: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirm = Confirm::new(&format!("Are you sure you want to delete {}?", what))
        .with_default(false)
        .prompt()?;
    Ok(confirm)
}

pub fn provisional_test_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("TC-{}", &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisional_ids_are_distinct() {
        let a = provisional_test_id();
        let b = provisional_test_id();
        assert!(a.starts_with("TC-"));
        assert_eq!(a.len(), 11);
        assert_ne!(a, b);
    }

    #[test]
    fn test_confirm_skipped_with_yes() {
        assert!(confirm_delete("REQ-1", true).unwrap());
    }
}
