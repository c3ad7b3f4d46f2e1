use crate::submissions::dtos::SubmissionRecord;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "Checkup-Submit/1.0";

static GITHUB_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build GitHub client")
});

#[derive(Error, Debug)]
pub enum IssueError {
    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("GitHub request failed: {0}")]
    Request(String),
}

#[derive(Deserialize)]
struct IssueCreated {
    html_url: String,
}

/// File the submission as a labeled issue for human review. Returns the
/// issue URL.
pub async fn create_submission_issue(
    token: &str,
    owner: &str,
    repo: &str,
    record: &SubmissionRecord,
) -> Result<String, IssueError> {
    let issue_title: String = format!("Brief Submission: {}", record.title)
        .chars()
        .take(220)
        .collect();
    let issue_body = [
        "<!-- brief-submission-v1 -->".to_string(),
        format!("Title: {}", record.title),
        format!("Summary: {}", record.summary),
        format!("Source URL: {}", record.source_url),
        format!("City: {}", record.city),
        format!("Sector: {}", record.sector),
        format!("Date: {}", record.date),
        format!("Submitter: {}", record.submitter_name),
        format!("Email: {}", record.submitter_email),
        format!("Notes: {}", record.notes),
        String::new(),
        format!("Timestamp: {}", record.submitted_at.to_rfc3339()),
        format!("IP Hash: {}", record.ip_hash),
        format!("User Agent: {}", record.user_agent),
    ]
    .join("\n");

    let response = GITHUB_CLIENT
        .post(format!("https://api.github.com/repos/{}/{}/issues", owner, repo))
        .bearer_auth(token)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .json(&json!({
            "title": issue_title,
            "body": issue_body,
            "labels": ["brief-submission", "needs-review"],
        }))
        .send()
        .await
        .map_err(|err| IssueError::Request(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(500)
            .collect();
        return Err(IssueError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let created: IssueCreated = response
        .json()
        .await
        .map_err(|err| IssueError::Request(err.to_string()))?;
    Ok(created.html_url)
}
