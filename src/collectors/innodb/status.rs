use std::collections::BTreeMap;
use tracing::debug;

/// Values parsed from `SHOW ENGINE INNODB STATUS` text, keyed like status variables.
///
/// Lines that do not match are ignored, so an empty or truncated report
/// yields an empty (or partial) map.
#[must_use]
pub fn parse(status: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut lsn_current: Option<u64> = None;
    let mut lsn_checkpoint: Option<u64> = None;
    let mut active_trx: u64 = 0;
    let mut os_waits: Option<u64> = None;
    let mut saw_transactions = false;

    for line in status.lines() {
        let line = line.trim();

        // Example: "Log sequence number          123456789"
        if line.starts_with("Log sequence number")
            && let Some(lsn) = last_number(line)
        {
            lsn_current = Some(lsn);
            out.insert("Innodb_lsn_current".to_string(), lsn.to_string());
            debug!(lsn_current = lsn, "parsed LSN current");
        }
        // Example: "Log flushed up to           123456000"
        else if line.starts_with("Log flushed up to")
            && let Some(lsn) = last_number(line)
        {
            out.insert("Innodb_lsn_flushed".to_string(), lsn.to_string());
            debug!(lsn_flushed = lsn, "parsed LSN flushed");
        }
        // Example: "Last checkpoint at          123455000"
        else if line.starts_with("Last checkpoint at")
            && let Some(lsn) = last_number(line)
        {
            lsn_checkpoint = Some(lsn);
            out.insert("Innodb_lsn_last_checkpoint".to_string(), lsn.to_string());
            debug!(lsn_checkpoint = lsn, "parsed LSN checkpoint");
        }
        // Example: "---TRANSACTION 123456, ACTIVE 5 sec"
        else if line.starts_with("---TRANSACTION") {
            saw_transactions = true;
            if line.contains("ACTIVE") {
                active_trx += 1;
            }
        } else if line.starts_with("TRANSACTIONS") {
            saw_transactions = true;
        }
        // Example: "Mutex spin waits 12345, rounds 67890, OS waits 123"
        else if line.contains("OS waits")
            && let Some(waits_str) = line.split("OS waits").nth(1)
            && let Some(num_str) = waits_str.split_whitespace().next()
            && let Ok(waits) = num_str.trim_end_matches(',').parse::<u64>()
        {
            *os_waits.get_or_insert(0) += waits;
            debug!(semaphore_waits = waits, "parsed semaphore waits");
        }
        // Example: "123456.00 hash searches/s, 12345.00 non-hash searches/s"
        else if line.contains("hash searches/s") {
            let parts: Vec<&str> = line.split(',').collect();
            if let Some(value) = parts.first().and_then(|p| first_float(p)) {
                out.insert("Innodb_hash_searches_per_second".to_string(), value.to_string());
            }
            if let Some(value) = parts.get(1).and_then(|p| first_float(p)) {
                out.insert("Innodb_non_hash_searches_per_second".to_string(), value.to_string());
            }
        }
    }

    if let (Some(current), Some(checkpoint)) = (lsn_current, lsn_checkpoint) {
        let age = current.saturating_sub(checkpoint);
        out.insert("Innodb_checkpoint_age".to_string(), age.to_string());
        debug!(checkpoint_age = age, "calculated checkpoint age");
    }

    if let Some(waits) = os_waits {
        out.insert("Innodb_semaphore_os_waits".to_string(), waits.to_string());
    }

    if saw_transactions {
        out.insert("Innodb_active_transactions".to_string(), active_trx.to_string());
        debug!(active_transactions = active_trx, "counted active transactions");
    }

    out
}

fn last_number(line: &str) -> Option<u64> {
    line.split_whitespace().last()?.parse().ok()
}

fn first_float(part: &str) -> Option<f64> {
    part.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
        map.get(key).map(String::as_str)
    }

    #[test]
    fn test_parse_lsn_metrics() {
        let status = "
=====================================
2024-12-02 06:30:00 0x7f8b8c000700 INNODB MONITOR OUTPUT
=====================================
Log sequence number          123456789
Log flushed up to            123456000
Pages flushed up to          123455000
Last checkpoint at           123450000
        ";

        let parsed = parse(status);

        assert_eq!(get(&parsed, "Innodb_lsn_current"), Some("123456789"));
        assert_eq!(get(&parsed, "Innodb_lsn_flushed"), Some("123456000"));
        assert_eq!(get(&parsed, "Innodb_lsn_last_checkpoint"), Some("123450000"));
        assert_eq!(get(&parsed, "Innodb_checkpoint_age"), Some("6789"));
    }

    #[test]
    fn test_parse_active_transactions() {
        let status = "
------------
TRANSACTIONS
------------
---TRANSACTION 421234567890, ACTIVE 5 sec starting index read
---TRANSACTION 421234567891, ACTIVE 10 sec
---TRANSACTION 421234567892, ACTIVE 2 sec inserting
---TRANSACTION 421234567893, not started
        ";

        let parsed = parse(status);

        assert_eq!(get(&parsed, "Innodb_active_transactions"), Some("3"));
    }

    #[test]
    fn test_parse_semaphore_waits_are_summed() {
        let status = "
Mutex spin waits 12345, rounds 67890, OS waits 123
RW-shared spins 54321, rounds 98765, OS waits 456
        ";

        let parsed = parse(status);

        assert_eq!(get(&parsed, "Innodb_semaphore_os_waits"), Some("579"));
    }

    #[test]
    fn test_parse_adaptive_hash() {
        let status = "
123456.50 hash searches/s, 12345.00 non-hash searches/s
        ";

        let parsed = parse(status);

        assert_eq!(get(&parsed, "Innodb_hash_searches_per_second"), Some("123456.5"));
        assert_eq!(get(&parsed, "Innodb_non_hash_searches_per_second"), Some("12345"));
    }

    #[test]
    fn test_parse_empty_status() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_without_checkpoint_has_no_age() {
        let parsed = parse("Log sequence number 100");
        assert_eq!(get(&parsed, "Innodb_lsn_current"), Some("100"));
        assert!(!parsed.contains_key("Innodb_checkpoint_age"));
    }
}
