//! Bot and attack-traffic classification.
//!
//! # Responsibilities
//! - Classify a request as bot/attack traffic before any other gate runs
//! - Report which rule fired, for audit logs and tests
//!
//! # Design Decisions
//! - Rules are evaluated strictly in order; first match wins
//! - The matched rule's identity is carried in the decision reason
//! - Substring/prefix heuristics only, no regex in the hot path
//! - Pure function: no I/O, no shared state

/// Outcome of classifying one request.
///
/// `reason` is empty exactly when `is_bot` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotDecision {
    pub is_bot: bool,
    pub reason: String,
}

impl BotDecision {
    fn bot(reason: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            reason: reason.into(),
        }
    }

    fn human() -> Self {
        Self {
            is_bot: false,
            reason: String::new(),
        }
    }
}

/// Known bad-bot and tooling user-agent signatures, most common first.
///
/// Order is load-bearing: the first matching signature names the reason.
const BAD_BOT_SIGNATURES: &[&str] = &[
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "go-http-client",
    "java/",
    "libwww",
    "scrapy",
    "httpclient",
    "okhttp",
    "nikto",
    "sqlmap",
    "masscan",
    "nmap",
    "zgrab",
    "semrush",
    "ahrefs",
    "mj12bot",
    "dotbot",
    "petalbot",
];

/// Path prefixes the application never serves; probing them is a bot signal.
const HONEYPOT_PATHS: &[&str] = &[
    "/wp-admin",
    "/wp-login",
    "/wp-content",
    "/xmlrpc.php",
    "/.env",
    "/.git",
    "/phpmyadmin",
    "/admin.php",
    "/config.php",
    "/vendor/phpunit",
    "/cgi-bin",
    "/actuator",
    "/.aws",
    "/server-status",
    "/debug",
];

/// SQL-injection markers checked against the lowercased full URL.
const SQLI_PATTERNS: &[&str] = &[
    "union select",
    "union all select",
    "' or '",
    "\" or \"",
    "or 1=1",
    "'; drop",
    "drop table",
    "insert into",
    "delete from",
    "select * from",
    "information_schema",
    "xp_cmdshell",
    "-- -",
];

/// XSS markers: script tags, protocol handlers, inline event handlers.
const XSS_PATTERNS: &[&str] = &[
    "<script",
    "%3cscript",
    "javascript:",
    "onerror=",
    "onload=",
    "onclick=",
    "onmouseover=",
    "<iframe",
    "<svg",
    "<img",
];

/// Path-traversal sequences, including percent-encoded variants.
const TRAVERSAL_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    "..%2f",
    "..%5c",
    "%2e%2e%2f",
    "%2e%2e/",
    "%2e%2e%5c",
];

/// Classify a request from its user-agent, path, and full URL.
///
/// The rule chain runs in a fixed order; the first rule that fires
/// determines both the verdict and the reported reason.
pub fn classify(user_agent: Option<&str>, path: &str, url: &str) -> BotDecision {
    // 1. Missing user-agent.
    let ua = match user_agent {
        Some(ua) if !ua.trim().is_empty() => ua,
        _ => return BotDecision::bot("missing-user-agent"),
    };

    // 2. Implausibly short user-agent.
    if ua.len() < 10 {
        return BotDecision::bot("suspicious-short-ua");
    }

    // 3. Known bad-bot signatures.
    let ua_lower = ua.to_lowercase();
    for sig in BAD_BOT_SIGNATURES {
        if ua_lower.contains(sig) {
            return BotDecision::bot(format!("bad-bot-ua:{sig}"));
        }
    }

    // 4. Honeypot path prefixes.
    let path_lower = path.to_lowercase();
    for hp in HONEYPOT_PATHS {
        if path_lower.starts_with(hp) {
            return BotDecision::bot(format!("honeypot:{hp}"));
        }
    }

    // 5. SQL injection markers in the URL.
    let url_lower = url.to_lowercase();
    for pat in SQLI_PATTERNS {
        if url_lower.contains(pat) {
            return BotDecision::bot("sql-injection-attempt");
        }
    }

    // 6. XSS markers in the URL.
    for pat in XSS_PATTERNS {
        if url_lower.contains(pat) {
            return BotDecision::bot("xss-attempt");
        }
    }

    // 7. Path traversal in path or URL.
    for pat in TRAVERSAL_PATTERNS {
        if path_lower.contains(pat) || url_lower.contains(pat) {
            return BotDecision::bot("path-traversal-attempt");
        }
    }

    BotDecision::human()
}
