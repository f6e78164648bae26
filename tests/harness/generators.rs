// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client addresses for testing.
pub fn generate_clients(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// Generate unrelated questions that should never collide with each other.
pub fn generate_distinct_questions(count: usize) -> Vec<String> {
    const TOPICS: &[&str] = &[
        "container networking",
        "garbage collection pauses",
        "database replication lag",
        "TLS certificate rotation",
        "message queue ordering",
        "cache invalidation",
        "leader election",
        "schema migrations",
        "feature flags",
        "distributed tracing",
    ];
    const ASKS: &[&str] = &[
        "How would you explain",
        "What are common pitfalls of",
        "Walk me through debugging",
        "Which metrics matter for",
        "Design a test plan for",
    ];

    (0..count)
        .map(|i| format!("{} {}?", ASKS[(i / TOPICS.len()) % ASKS.len()], TOPICS[i % TOPICS.len()]))
        .collect()
}

/// Cosmetic variants of `question` a spammer might resubmit.
///
/// Each variant is either a case/whitespace change or a single-character
/// edit, so all of them must be caught as duplicates of the original.
pub fn generate_near_duplicates(question: &str) -> Vec<String> {
    let mut variants = vec![
        question.to_uppercase(),
        question.to_lowercase(),
        format!("   {question}   "),
        format!("\t{question}\n"),
        format!("{question}?"),
    ];

    // Drop one character from the middle.
    let chars: Vec<char> = question.chars().collect();
    let mid = chars.len() / 2;
    variants.push(
        chars
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != mid)
            .map(|(_, c)| *c)
            .collect(),
    );

    // Swap two neighbouring characters near the start.
    if chars.len() > 3 {
        let mut swapped = chars.clone();
        swapped.swap(1, 2);
        variants.push(swapped.into_iter().collect());
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_generate_distinct_questions_are_unique() {
        let questions = generate_distinct_questions(50);
        let unique: std::collections::HashSet<_> = questions.iter().collect();
        assert_eq!(unique.len(), 50);
    }
}
