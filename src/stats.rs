use std::collections::HashMap;

use crate::classify::LogRecord;

/// Counts keys while remembering the order they were first seen in.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    counts: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.counts[i].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` highest counts. Equal counts keep first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.counts.clone();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub total_mounts: u64,
    pub unique_files: usize,
    pub unique_clients: usize,
    pub top_files: Vec<(String, u64)>,
    pub top_clients: Vec<(String, u64)>,
}

/// Computes the run's counters and leaderboards from mount events only.
pub fn aggregate(records: &[LogRecord], top_files: usize, top_clients: usize) -> AggregateSnapshot {
    let mut files = Counter::new();
    let mut clients = Counter::new();
    let mut total_mounts = 0;

    for record in records.iter().filter(|r| r.is_mount()) {
        total_mounts += 1;
        files.add(&record.filename);
        clients.add(&record.client_address);
    }

    AggregateSnapshot {
        total_mounts,
        unique_files: files.len(),
        unique_clients: clients.len(),
        top_files: files.most_common(top_files),
        top_clients: clients.most_common(top_clients),
    }
}

/// The last `k` records, newest first.
pub fn recent_activity(records: &[LogRecord], k: usize) -> Vec<&LogRecord> {
    records.iter().rev().take(k).collect()
}

/// Every distinct client address in the log, in first-seen order.
pub fn distinct_clients(records: &[LogRecord]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .map(|r| r.client_address.as_str())
        .filter(|addr| seen.insert(*addr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str, addr: &str, message: &str) -> LogRecord {
        LogRecord::new(ts, addr, message)
    }

    #[test]
    fn phantom_mount_is_not_counted() {
        let records = vec![
            record("2024-01-01 12:00:00", "8.8.8.8", "[OPEN] game1.atr"),
            record("2024-01-01 12:01:00", "8.8.8.8", "[OPEN] phantom.atr"),
        ];
        let snapshot = aggregate(&records, 20, 10);
        assert_eq!(snapshot.total_mounts, 1);
        assert_eq!(snapshot.unique_files, 1);
        assert_eq!(snapshot.top_files, vec![("game1.atr".to_string(), 1)]);
        assert!(snapshot
            .top_files
            .iter()
            .all(|(f, _)| !f.to_lowercase().contains("phantom")));
    }

    #[test]
    fn total_mounts_matches_mount_records() {
        let records = vec![
            record("t1", "1.1.1.1", "[OPEN] a.atr"),
            record("t2", "1.1.1.1", "0x29 b.atr"),
            record("t3", "2.2.2.2", "[CLOSE] a.atr"),
            record("t4", "2.2.2.2", "[OPEN]"),
            record("t5", "3.3.3.3", "[OPEN] a.atr"),
            record("t6", "4.4.4.4", "0x29 Phantom"),
        ];
        let expected = records.iter().filter(|r| r.is_mount()).count() as u64;
        let snapshot = aggregate(&records, 20, 10);
        assert_eq!(snapshot.total_mounts, expected);
        assert_eq!(snapshot.total_mounts, 3);
        assert_eq!(snapshot.unique_files, 2);
        assert_eq!(snapshot.unique_clients, 2);
        assert_eq!(snapshot.top_files[0], ("a.atr".to_string(), 2));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = vec![
            record("t1", "C", "[OPEN] x"),
            record("t2", "A", "[OPEN] x"),
            record("t3", "B", "[OPEN] x"),
            record("t4", "B", "[OPEN] x"),
            record("t5", "A", "[OPEN] x"),
            record("t6", "C", "[OPEN] x"),
        ];
        let snapshot = aggregate(&records, 20, 10);
        let order: Vec<&str> = snapshot.top_clients.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        assert!(snapshot.top_clients.iter().all(|(_, n)| *n == 2));
    }

    #[test]
    fn most_common_truncates() {
        let mut counter = Counter::new();
        for key in ["a", "b", "b", "c", "c", "c"] {
            counter.add(key);
        }
        assert_eq!(counter.get("c"), 3);
        assert_eq!(counter.get("zzz"), 0);
        assert_eq!(
            counter.most_common(2),
            vec![("c".to_string(), 3), ("b".to_string(), 2)]
        );
        assert_eq!(counter.most_common(10).len(), 3);
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let records: Vec<LogRecord> = (0..30)
            .map(|i| record(&format!("t{:02}", i), "1.1.1.1", "[OPEN] a"))
            .collect();
        let recent = recent_activity(&records, 20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].timestamp, "t29");
        assert_eq!(recent[19].timestamp, "t10");
    }

    #[test]
    fn distinct_clients_in_first_seen_order() {
        let records = vec![
            record("t1", "9.9.9.9", "[CLOSE] a"),
            record("t2", "1.1.1.1", "[OPEN] a"),
            record("t3", "9.9.9.9", "[OPEN] a"),
        ];
        assert_eq!(distinct_clients(&records), vec!["9.9.9.9", "1.1.1.1"]);
    }
}
