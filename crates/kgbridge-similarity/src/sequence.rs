//! Ratcliff/Obershelp sequence alignment
//!
//! Finds the longest contiguous matching block, then recurses on the
//! unmatched pieces to its left and right. The ratio is `2 * M / T` where `M`
//! is the total size of all matching blocks and `T` the combined length.
//!
//! Mirrors the matching rules of the classic `difflib` matcher without a junk
//! predicate: when the second sequence has 200 or more elements, elements that
//! occur in more than 1% of its positions are treated as "popular" and cannot
//! seed a match (they can still extend one).

use std::collections::HashMap;

/// Sequences at least this long get the popular-element heuristic
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[i..i + size] == b[j..j + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub i: usize,
    pub j: usize,
    pub size: usize,
}

/// Matcher over two character sequences
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Positions of each element of `b`, popular elements removed
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    /// Create a matcher comparing `a` against `b`
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among equally long blocks the one starting earliest in `a` wins, and
    /// among those the one starting earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);

        // j2len[j] = length of the longest match ending at a[i - 1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular elements never seed a match, but may extend one
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        Match { i: besti, j: bestj, size: bestsize }
    }

    /// All non-overlapping matching blocks in increasing order, adjacent
    /// blocks collapsed. Does not include a terminating zero-size block.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.i && blo < m.j {
                queue.push((alo, m.i, blo, m.j));
            }
            if m.i + m.size < ahi && m.j + m.size < bhi {
                queue.push((m.i + m.size, ahi, m.j + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort_by_key(|m| (m.i, m.j));

        let mut collapsed: Vec<Match> = Vec::with_capacity(blocks.len());
        for m in blocks {
            match collapsed.last_mut() {
                Some(last) if last.i + last.size == m.i && last.j + last.size == m.j => {
                    last.size += m.size;
                }
                _ => collapsed.push(m),
            }
        }
        collapsed
    }

    /// `2 * M / T`, or 1.0 when both sequences are empty
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Sequence-alignment ratio of two strings, compared character by character
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}
