//! Rate-limit detection and parsing.
//!
//! Providers report quota exhaustion in free-form error text. Each provider
//! has its own literal signature (see [`ProviderKind::quota_signature`]);
//! only messages carrying one of them are classified as rate limits. The
//! field extractors below are tuned to Gemini's wording and simply leave
//! fields empty for other providers.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use skillforge_types::llm::{ProviderKind, RateLimitInfo};

static RETRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Please retry in ([\d.]+)s").expect("valid regex"));
static METRIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"metric: ([^,]+)").expect("valid regex"));
static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"limit: (\d+)").expect("valid regex"));
static MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"model:\s*([a-z0-9\-.]+[a-z0-9])").expect("valid regex"));
static MESSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'message': '([^']+)'").expect("valid regex"));

/// The provider whose quota signature appears in `message`, if any.
pub fn matching_provider(message: &str) -> Option<ProviderKind> {
    ProviderKind::ALL
        .into_iter()
        .find(|kind| message.contains(kind.quota_signature()))
}

/// True iff `message` carries any provider's quota-exceeded signature.
pub fn is_rate_limit_error(message: &str) -> bool {
    matching_provider(message).is_some()
}

/// Parse a quota-exhaustion message. Returns `None` when no provider
/// signature is present.
pub fn parse_rate_limit(message: &str) -> Option<RateLimitInfo> {
    matching_provider(message)?;

    let capture = |re: &Regex| {
        re.captures(message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    let retry_after = capture(&RETRY_RE)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs(secs.round() as u64));

    Some(RateLimitInfo {
        code: Some(429),
        message: capture(&MESSAGE_RE),
        retry_after,
        quota_metric: capture(&METRIC_RE),
        limit: capture(&LIMIT_RE).and_then(|s| s.parse().ok()),
        model: capture(&MODEL_RE),
        raw: message.to_string(),
    })
}

/// Render a retry delay as `Xm Ys`, or `Ys` under a minute.
pub fn format_retry_delay(delay: Duration) -> String {
    let total = delay.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Human-readable explanation of a rate-limit failure.
pub fn rate_limit_notice(info: &RateLimitInfo) -> String {
    let provider = matching_provider(&info.raw);
    let title = match provider {
        Some(kind) => format!("{} API rate limit exceeded", kind.display_name()),
        None => "API rate limit exceeded".to_string(),
    };

    let mut lines = vec![title, String::new()];
    if let Some(model) = &info.model {
        lines.push(format!("Model:       {model}"));
    }
    if let Some(limit) = info.limit {
        lines.push(format!("Limit:       {limit} requests"));
    }
    if let Some(metric) = &info.quota_metric {
        lines.push(format!("Quota:       {metric}"));
    }
    if let Some(after) = info.retry_after {
        lines.push(format!("Retry after: {}", format_retry_delay(after)));
    }

    let help: &[&str] = match provider {
        Some(ProviderKind::Gemini) => &[
            "Check or create an API key: https://aistudio.google.com/api-keys",
            "Current usage and limits: https://ai.dev/rate-limit",
            "Quota documentation: https://ai.google.dev/gemini-api/docs/rate-limits",
        ],
        Some(ProviderKind::OpenAi) => &[
            "Usage and limits: https://platform.openai.com/settings/organization/limits",
        ],
        Some(ProviderKind::Anthropic) => &[
            "Usage and limits: https://console.anthropic.com/settings/limits",
        ],
        None => &[],
    };
    if !help.is_empty() {
        lines.push(String::new());
        lines.extend(help.iter().map(|h| h.to_string()));
    }

    lines.join("\n")
}
