//! Phonetic fuzzy matcher: metaphone encoding + levenshtein cost.
//!
//! A query and every candidate base name are reduced to metaphone codes;
//! the match cost is the edit distance between the codes. Candidates
//! qualify only when the codes are identical after truncating the
//! candidate code to the query code's length, which makes this an
//! exact-after-encoding filter rather than a graded ranker.

use crate::{FileEntry, SearchMatch, base_name};

// ─── Metaphone ───────────────────────────────────────────────────────

fn is_vowel(c: u8) -> bool {
    matches!(c, b'A' | b'E' | b'I' | b'O' | b'U')
}

/// Letters that soften a following C or G.
fn makes_soft(c: u8) -> bool {
    matches!(c, b'E' | b'I' | b'Y')
}

/// Letters after which H is silent (the CH/GH/PH/SH/TH digraphs own it).
fn affects_h(c: u8) -> bool {
    matches!(c, b'C' | b'G' | b'P' | b'S' | b'T')
}

/// Letters three back that keep GH from turning into F ("dough", "hugh").
fn no_gh_to_f(c: u8) -> bool {
    matches!(c, b'B' | b'D' | b'H')
}

/// Lawrence Philips' metaphone, ported with the classic digraph quirks
/// intact (GH → F in "laugh"-like positions, TH → '0').
///
/// Non-alphabetic characters are skipped but still occupy positions for
/// the context lookarounds, so `hello.txt` encodes like `hello` followed
/// by `txt`. `max_phonemes` truncates the code; 0 means no limit.
#[must_use]
pub fn metaphone(word: &str, max_phonemes: usize) -> String {
    let chars: Vec<u8> = word.bytes().map(|b| b.to_ascii_uppercase()).collect();
    let n = chars.len();
    let at = |i: isize| -> u8 {
        if i < 0 || i as usize >= n { 0 } else { chars[i as usize] }
    };

    let mut out = String::new();
    let mut idx: usize = 0;

    while idx < n && !chars[idx].is_ascii_alphabetic() {
        idx += 1;
    }
    if idx >= n {
        return out;
    }

    // Initial-letter exceptions. Anything not consumed here falls through
    // to the main loop, where vowels are no longer emitted.
    let next = at(idx as isize + 1);
    match chars[idx] {
        b'A' => {
            if next == b'E' {
                out.push('E');
                idx += 2;
            } else {
                out.push('A');
                idx += 1;
            }
        }
        b'G' | b'K' | b'P' => {
            if next == b'N' {
                out.push('N');
                idx += 2;
            }
        }
        b'W' => {
            if next == b'R' {
                out.push('R');
                idx += 2;
            } else if next == b'H' {
                out.push('W');
                idx += 2;
            } else if is_vowel(next) {
                out.push('W');
                idx += 1;
            }
        }
        b'X' => {
            out.push('S');
            idx += 1;
        }
        b'E' | b'I' | b'O' | b'U' => {
            out.push(chars[idx] as char);
            idx += 1;
        }
        _ => {}
    }

    while idx < n {
        if max_phonemes > 0 && out.len() >= max_phonemes {
            break;
        }
        let c = chars[idx];
        if !c.is_ascii_alphabetic() {
            idx += 1;
            continue;
        }
        let prev = at(idx as isize - 1);
        // Adjacent duplicates collapse, except C (as in "accept").
        if c == prev && c != b'C' {
            idx += 1;
            continue;
        }
        if is_vowel(c) {
            idx += 1;
            continue;
        }
        let next = at(idx as isize + 1);
        let after = at(idx as isize + 2);
        let mut skip_one = false;

        match c {
            b'B' => {
                // Silent when terminal after M ("comb").
                if !(prev == b'M' && idx + 1 == n) {
                    out.push('B');
                }
            }
            b'C' => {
                if makes_soft(next) {
                    if next == b'I' && after == b'A' {
                        out.push('X'); // CIA
                    } else if prev == b'S' {
                        // SCE/SCI/SCY: silent
                    } else {
                        out.push('S');
                    }
                } else if next == b'H' {
                    out.push('X');
                    skip_one = true;
                } else {
                    out.push('K');
                }
            }
            b'D' => {
                if next == b'G' && makes_soft(after) {
                    out.push('J'); // DGE/DGI/DGY
                    skip_one = true;
                } else {
                    out.push('T');
                }
            }
            b'G' => {
                if next == b'H' {
                    if no_gh_to_f(at(idx as isize - 3)) || at(idx as isize - 4) == b'H' {
                        // silent; the H is handled next with prev == G
                    } else {
                        out.push('F');
                        skip_one = true;
                    }
                } else if next == b'N' {
                    let gn_terminal = !after.is_ascii_alphabetic();
                    let gned = after == b'E' && at(idx as isize + 3) == b'D';
                    if !(gn_terminal || gned) {
                        out.push('K');
                    }
                } else if makes_soft(next) && prev != b'G' {
                    out.push('J');
                } else {
                    out.push('K');
                }
            }
            b'H' => {
                if is_vowel(next) && !affects_h(prev) {
                    out.push('H');
                }
            }
            b'J' => out.push('J'),
            b'K' => {
                if prev != b'C' {
                    out.push('K');
                }
            }
            b'L' => out.push('L'),
            b'M' => out.push('M'),
            b'N' => out.push('N'),
            b'P' => {
                if next == b'H' {
                    out.push('F');
                    skip_one = true;
                } else {
                    out.push('P');
                }
            }
            b'Q' => out.push('K'),
            b'R' => out.push('R'),
            b'S' => {
                if next == b'I' && (after == b'O' || after == b'A') {
                    out.push('X'); // SIO/SIA
                } else if next == b'H' {
                    out.push('X');
                    skip_one = true;
                } else {
                    out.push('S');
                }
            }
            b'T' => {
                if next == b'I' && (after == b'O' || after == b'A') {
                    out.push('X'); // TIO/TIA
                } else if next == b'H' {
                    out.push('0');
                    skip_one = true;
                } else if !(next == b'C' && after == b'H') {
                    out.push('T'); // silent in TCH
                }
            }
            b'V' => out.push('F'),
            b'W' => {
                if is_vowel(next) {
                    out.push('W');
                }
            }
            b'X' => {
                out.push('K');
                out.push('S');
            }
            b'Y' => {
                if is_vowel(next) {
                    out.push('Y');
                }
            }
            b'Z' => out.push('S'),
            _ => {}
        }

        idx += if skip_one { 2 } else { 1 };
    }

    if max_phonemes > 0 {
        out.truncate(max_phonemes);
    }
    out
}

// ─── Levenshtein ─────────────────────────────────────────────────────

/// Classic edit distance: insertions, deletions, substitutions, unit cost.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    let mut row: Vec<u32> = (0..=b.len() as u32).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i as u32 + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let val = (diag + cost).min(row[j] + 1).min(row[j + 1] + 1);
            diag = row[j + 1];
            row[j + 1] = val;
        }
    }
    row[b.len()]
}

// ─── Search ──────────────────────────────────────────────────────────

/// Rank manifest entries against a query.
///
/// The candidate's code is truncated to the query code's length, so a
/// query matches files whose base name merely *starts* like it sounds.
/// Only cost 0 qualifies: the codes must be phonetically identical.
#[must_use]
pub fn search(query: &str, entries: &[FileEntry]) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }

    let code = metaphone(query, 0);
    let mut matches: Vec<SearchMatch> = Vec::new();
    for entry in entries {
        let candidate = metaphone(base_name(&entry.relative_path), code.len());
        let cost = levenshtein(&code, &candidate);
        if cost < 1 {
            matches.push(SearchMatch { path: entry.relative_path.clone(), cost });
        }
    }
    // Stable: ties keep manifest order.
    matches.sort_by_key(|m| m.cost);
    matches
}


#[cfg(test)]
mod fuzzy_property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Codes only ever contain the metaphone alphabet.
        #[test]
        fn metaphone_alphabet(word in "\\PC{0,60}") {
            let code = metaphone(&word, 0);
            for c in code.chars() {
                prop_assert!(c.is_ascii_uppercase() || c == '0',
                    "unexpected phoneme '{}' in '{}'", c, code);
            }
        }

        /// The phoneme limit is honored.
        #[test]
        fn metaphone_respects_limit(word in "[a-zA-Z]{0,60}", limit in 1usize..8) {
            prop_assert!(metaphone(&word, limit).len() <= limit);
        }

        /// A limited code is a prefix of the unlimited code.
        #[test]
        fn metaphone_limit_is_prefix(word in "[a-zA-Z]{0,60}", limit in 1usize..8) {
            let full = metaphone(&word, 0);
            let cut = metaphone(&word, limit);
            prop_assert!(full.starts_with(&cut));
        }

        /// Encoding is deterministic.
        #[test]
        fn metaphone_deterministic(word in "\\PC{0,60}") {
            prop_assert_eq!(metaphone(&word, 0), metaphone(&word, 0));
        }

        /// Levenshtein is a metric: symmetry and identity.
        #[test]
        fn levenshtein_symmetric(a in "[A-Z0]{0,12}", b in "[A-Z0]{0,12}") {
            prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
            prop_assert_eq!(levenshtein(&a, &a), 0);
        }

        /// Distance is bounded by the longer string's length.
        #[test]
        fn levenshtein_bounded(a in "[A-Z0]{0,12}", b in "[A-Z0]{0,12}") {
            let d = levenshtein(&a, &b) as usize;
            prop_assert!(d <= a.chars().count().max(b.chars().count()));
        }

        /// Every reported match has cost 0 (exact-after-encoding contract).
        #[test]
        fn search_matches_are_exact(query in "[a-z]{1,12}", names in proptest::collection::vec("[a-z]{1,12}", 0..20)) {
            let entries: Vec<FileEntry> = names.iter().map(|n| FileEntry {
                relative_path: format!("{n}.txt"),
                size: 0,
                modified: 0,
                extension: "txt".to_string(),
            }).collect();
            for m in search(&query, &entries) {
                prop_assert_eq!(m.cost, 0);
            }
        }
    }
}
