// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Output sanitization — strips known credential patterns from device
//! output before it reaches storage or an API response.
//!
//! Requires `std` (the `regex` crate's compiled automaton is not
//! `no_std`-friendly), so this module is gated behind the `std` feature
//! like the rest of this crate's default build.

#![cfg(feature = "std")]

use regex::Regex;
use std::sync::OnceLock;

const REDACTED: &str = "***REDACTED***";

/// Lazily-compiled, in declared order, `(pattern, capture-group-to-keep)`.
/// Every pattern captures the leading keyword(s) in group 1 and replaces
/// everything after it with [`REDACTED`] — ordering matters: specific
/// patterns (Cisco type 7/5/8/9, SNMP community, PSK, NTP auth key, enable
/// secret, username password) run before the generic catch-all "password
/// <value>" rule so a more specific match isn't pre-empted by the general
/// one.
fn patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(password\s+7\s+)\S+",
            r"(?i)(secret\s+5\s+)\S+",
            r"(?i)(secret\s+[89]\s+)\S+",
            r"(?i)(snmp-server\s+community\s+)\S+",
            r"(?i)(pre-shared-key\s+)\S+",
            r"(?i)(key-string\s+)\S+",
            r"(?i)(server-private\s+\S+\s+key\s+)\S+",
            r"(?i)(key\s+7\s+)\S+",
            r"(?i)(ntp\s+authentication-key\s+\d+\s+md5\s+)\S+",
            r"(?im)(password\s+)\S+$",
            r"(?i)(enable\s+secret\s+\d+\s+)\S+",
            r"(?i)(username\s+\S+\s+(?:password|secret)\s+\d+\s+)\S+",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static sanitizer pattern must compile"))
        .collect()
    })
}

/// Strip known password and credential patterns from `output`, replacing
/// the sensitive portion of each match with `***REDACTED***`.
///
/// Idempotent: running this twice over already-sanitized text is a no-op,
/// since `***REDACTED***` does not itself match any pattern's value
/// portion (`\S+`, but already consumed by the first pass).
pub fn sanitize_output(output: &str) -> String {
    let mut result = output.to_string();
    for pattern in patterns() {
        result = pattern.replace_all(&result, format!("${{1}}{REDACTED}")).into_owned();
    }
    result
}
