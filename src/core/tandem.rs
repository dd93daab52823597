//! Short tandem repeat detection.
//!
//! Used in two places: short-link pruning keeps bubbles that sit inside an
//! STR (small bubbles are normal there), and emitted transcripts carry an
//! STR annotation so downstream filters can treat repeat-context indels
//! with more suspicion.

use serde::{Deserialize, Serialize};

/// Thresholds describing what counts as a reportable tandem repeat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TandemRepeatParams {
    /// Longest repeat unit considered, in bases.
    pub max_unit_len: usize,
    /// Minimum number of consecutive unit copies.
    pub min_units: usize,
    /// Minimum total span of the repeat, in bases.
    pub min_len: usize,
    /// Maximum distance between the query position and the repeat start.
    pub max_dist: usize,
}

/// Outcome of a tandem-repeat query around one sequence position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TandemRepeatResult {
    pub found: bool,
    pub unit: String,
    pub num_units: usize,
}

/// Look for a tandem repeat near `pos` in `seq`.
///
/// Every unit length up to `max_unit_len` is tried at every start within
/// `max_dist` of `pos`; the longest qualifying run wins, shorter units
/// breaking ties so a homopolymer is reported as such rather than as a
/// two-base unit.
pub fn find_tandem_repeat(seq: &str, pos: usize, params: &TandemRepeatParams) -> TandemRepeatResult {
    let bytes = seq.as_bytes();
    if bytes.is_empty() {
        return TandemRepeatResult::default();
    }

    let scan_start = pos.saturating_sub(params.max_dist);
    let scan_end = (pos + params.max_dist).min(bytes.len());

    let mut best = TandemRepeatResult::default();
    let mut best_span = 0usize;

    for unit_len in 1..=params.max_unit_len {
        for start in scan_start..scan_end {
            if start + unit_len > bytes.len() {
                break;
            }

            let unit = &bytes[start..start + unit_len];
            let mut units = 1;
            let mut end = start + unit_len;
            while end + unit_len <= bytes.len() && &bytes[end..end + unit_len] == unit {
                units += 1;
                end += unit_len;
            }

            let span = units * unit_len;
            if units < params.min_units || span < params.min_len {
                continue;
            }

            // the repeat must still be within reach of the query position
            if start > pos + params.max_dist || end + params.max_dist < pos {
                continue;
            }

            if span > best_span {
                best_span = span;
                best = TandemRepeatResult {
                    found: true,
                    unit: String::from_utf8_lossy(unit).into_owned(),
                    num_units: units,
                };
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TandemRepeatParams {
        TandemRepeatParams { max_unit_len: 4, min_units: 3, min_len: 7, max_dist: 100 }
    }

    #[test]
    fn detects_homopolymer_run() {
        let result = find_tandem_repeat("GGTAAAAAAAAAACGT", 8, &params());
        assert!(result.found);
        assert_eq!(result.unit, "A");
        assert_eq!(result.num_units, 10);
    }

    #[test]
    fn detects_dinucleotide_repeat() {
        let result = find_tandem_repeat("TTACACACACACGGA", 6, &params());
        assert!(result.found);
        assert_eq!(result.unit, "AC");
        assert!(result.num_units >= 4);
    }

    #[test]
    fn short_runs_are_ignored() {
        // only two copies of the unit and a short total span
        let result = find_tandem_repeat("GATCGATC", 2, &params());
        assert!(!result.found);
    }

    #[test]
    fn distant_repeats_are_out_of_reach() {
        let tight = TandemRepeatParams { max_dist: 2, ..params() };
        let seq = "CGTACGTTTTTTTTTT";
        assert!(!find_tandem_repeat(seq, 0, &tight).found);
        assert!(find_tandem_repeat(seq, 8, &tight).found);
    }
}
