//! Directed, strand-annotated edges of the colored k-mer graph.

use std::fmt;

use crate::core::Strand;

/// Source and destination strands of an edge, packed as one of four kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    FF,
    FR,
    RF,
    RR,
}

impl EdgeKind {
    pub fn new(src: Strand, dst: Strand) -> EdgeKind {
        match (src, dst) {
            (Strand::Fwd, Strand::Fwd) => EdgeKind::FF,
            (Strand::Fwd, Strand::Rev) => EdgeKind::FR,
            (Strand::Rev, Strand::Fwd) => EdgeKind::RF,
            (Strand::Rev, Strand::Rev) => EdgeKind::RR,
        }
    }

    #[inline]
    pub fn src_strand(self) -> Strand {
        match self {
            EdgeKind::FF | EdgeKind::FR => Strand::Fwd,
            EdgeKind::RF | EdgeKind::RR => Strand::Rev,
        }
    }

    #[inline]
    pub fn dst_strand(self) -> Strand {
        match self {
            EdgeKind::FF | EdgeKind::RF => Strand::Fwd,
            EdgeKind::FR | EdgeKind::RR => Strand::Rev,
        }
    }

    /// Kind of the symmetric reciprocal edge: (a, b) becomes (b̄, ā).
    pub fn reversed(self) -> EdgeKind {
        EdgeKind::new(self.dst_strand().reversed(), self.src_strand().reversed())
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            EdgeKind::FF => "FF",
            EdgeKind::FR => "FR",
            EdgeKind::RF => "RF",
            EdgeKind::RR => "RR",
        };
        f.write_str(tag)
    }
}

/// Outgoing relation to a destination node. Stored in an ordered set per
/// node so edge iteration order is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub dst_id: u64,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(dst_id: u64, kind: EdgeKind) -> Edge {
        Edge { dst_id, kind }
    }
}

/// A fully-qualified edge occurrence, used to mark traversed edges during
/// path enumeration and to highlight them in graph dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeHandle {
    pub src_id: u64,
    pub dst_id: u64,
    pub kind: EdgeKind,
}

impl EdgeHandle {
    pub fn new(src_id: u64, edge: Edge) -> EdgeHandle {
        EdgeHandle { src_id, dst_id: edge.dst_id, kind: edge.kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_strands() {
        for src in [Strand::Fwd, Strand::Rev] {
            for dst in [Strand::Fwd, Strand::Rev] {
                let kind = EdgeKind::new(src, dst);
                assert_eq!(kind.src_strand(), src);
                assert_eq!(kind.dst_strand(), dst);
            }
        }
    }

    #[test]
    fn reversal_is_involutive() {
        assert_eq!(EdgeKind::FF.reversed(), EdgeKind::RR);
        assert_eq!(EdgeKind::RR.reversed(), EdgeKind::FF);
        assert_eq!(EdgeKind::FR.reversed(), EdgeKind::FR);
        assert_eq!(EdgeKind::RF.reversed(), EdgeKind::RF);

        for kind in [EdgeKind::FF, EdgeKind::FR, EdgeKind::RF, EdgeKind::RR] {
            assert_eq!(kind.reversed().reversed(), kind);
        }
    }
}
