use serde::Serialize;

/// Outcome of fetching one target (the page itself or a robots/sitemap
/// probe). Every expected failure mode — non-2xx, timeout, network error,
/// redirect exhaustion, guard rejection mid-chain — lands in this shape so
/// downstream scoring never branches on errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub ok: bool,
    /// Final HTTP status. Synthetic codes mark non-HTTP outcomes: 408 for a
    /// timeout, 508 for redirect exhaustion, 520 for other network failures.
    pub status: u16,
    pub final_url: String,
    pub html: String,
    pub timed_out: bool,
    /// The target answered 403 or 429, i.e. it actively refused us.
    pub blocked_status: bool,
    pub redirect_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn failure(
        status: u16,
        final_url: impl Into<String>,
        redirect_count: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            status,
            final_url: final_url.into(),
            html: String::new(),
            timed_out: false,
            blocked_status: false,
            redirect_count,
            error: Some(error.into()),
        }
    }

    pub fn timeout(
        final_url: impl Into<String>,
        redirect_count: u32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            ok: false,
            status: 408,
            final_url: final_url.into(),
            html: String::new(),
            timed_out: true,
            blocked_status: false,
            redirect_count,
            error: Some(format!("Fetch timed out after {} seconds.", timeout_secs)),
        }
    }
}
