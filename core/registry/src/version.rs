// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Feature gates derived from the framework version a server declares.

use std::cmp::Ordering;

/// First version that speaks the cross-language (thrift) protocol.
pub const THRIFT_SUPPORTED_VERSION: &str = "2.10.0";
/// First version that accepts proto and fst payloads.
pub const PROTO_FST_SUPPORTED_VERSION: &str = "2.9.0";
/// First version that accepts compact requests.
pub const COMPACT_SUPPORTED_VERSION: &str = "2.8.0";

fn numeric_parts(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().unwrap_or(0)
        })
        .collect()
}

/// Compare dotted versions numerically. Missing components count as zero
/// and non-numeric suffixes (`-SNAPSHOT`) are ignored.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = numeric_parts(a);
    let b = numeric_parts(b);
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn at_least(version: &str, minimum: &str) -> bool {
    if version.trim().is_empty() {
        return false;
    }
    compare(version, minimum) != Ordering::Less
}

pub fn is_thrift_supported(version: &str) -> bool {
    at_least(version, THRIFT_SUPPORTED_VERSION)
}

pub fn is_proto_fst_supported(version: &str) -> bool {
    at_least(version, PROTO_FST_SUPPORTED_VERSION)
}

pub fn is_compact_supported(version: &str) -> bool {
    at_least(version, COMPACT_SUPPORTED_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        assert_eq!(compare("2.10.0", "2.9.9"), Ordering::Greater);
        assert_eq!(compare("2.9", "2.9.0"), Ordering::Equal);
        assert_eq!(compare("2.9.1-SNAPSHOT", "2.9.1"), Ordering::Equal);
        assert_eq!(compare("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_feature_gates() {
        assert!(is_thrift_supported("2.10.0"));
        assert!(is_thrift_supported("3.0.0-SNAPSHOT"));
        assert!(!is_thrift_supported("2.9.8"));
        assert!(!is_thrift_supported(""));

        assert!(is_proto_fst_supported("2.9.0"));
        assert!(!is_proto_fst_supported("2.8.5"));

        assert!(is_compact_supported("2.8.0"));
        assert!(!is_compact_supported("2.7.9"));
        assert!(!is_compact_supported("   "));
    }
}
