//! Built-in trigger sets. Config can append terms but not remove them.

use bastion_core::constants::{
    CATEGORY_ANALYSIS, CATEGORY_GENERAL, CATEGORY_INTELLIGENCE, CATEGORY_PENETRATION_TESTING,
    CATEGORY_RECONNAISSANCE, CTX_COLLECTION, CTX_FILE_PATH, CTX_QUERY, CTX_TARGET,
};
use bastion_core::models::TriggerSet;

pub fn pentest_triggers() -> TriggerSet {
    TriggerSet::new([
        "scan",
        "exploit",
        "exploits",
        "exploitation",
        "vulnerability",
        "vulnerabilities",
        "vuln",
        "pentest",
        "penetration test",
        "hack",
        "attack",
        "payload",
        "privilege escalation",
        "how to",
    ])
    .with_categories([CATEGORY_PENETRATION_TESTING, "pentest", "exploitation"])
}

pub fn tool_triggers() -> TriggerSet {
    TriggerSet::new([
        "scan",
        "nmap",
        "enumerate",
        "enumeration",
        "discover",
        "recon",
        "reconnaissance",
        "ports",
        "port scan",
        "subdomains",
        "fingerprint",
        "whois",
        "gobuster",
    ])
    .with_categories([CATEGORY_RECONNAISSANCE, "tool_execution"])
    .with_context_keys([CTX_TARGET])
}

pub fn knowledge_triggers() -> TriggerSet {
    TriggerSet::new([
        "rss",
        "news",
        "feed",
        "feeds",
        "cve",
        "threat",
        "intelligence",
        "osint",
        "search",
        "find",
        "look for",
        "show me",
        "analyze",
        "document",
        "report",
        "parse",
        "extract",
        "knowledge",
    ])
    .with_categories([CATEGORY_INTELLIGENCE, CATEGORY_ANALYSIS])
    .with_context_keys([CTX_QUERY, CTX_FILE_PATH, CTX_COLLECTION])
}

pub fn general_triggers() -> TriggerSet {
    TriggerSet::new(["explain", "advice", "recommend", "help"])
        .with_categories([CATEGORY_GENERAL])
}
