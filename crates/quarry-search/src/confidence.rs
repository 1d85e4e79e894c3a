/// How certain a match is, ordered from refuted to confirmed.
///
/// Merging two gradings for the same candidate keeps the maximum; a candidate
/// left at `Impossible` is never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    /// Refuted: resolved information contradicts the pattern.
    Impossible,
    /// The pattern needs resolved information that was unavailable or
    /// inconsistent.
    Inaccurate,
    /// Syntactically plausible; semantic confirmation still pending.
    Possible,
    /// Confirmed.
    Accurate,
}

impl Confidence {
    /// Lattice join: the better of the two gradings wins.
    #[must_use]
    pub fn merge(self, other: Confidence) -> Confidence {
        self.max(other)
    }

    /// Lattice meet, used when two patterns must both hold on one node.
    #[must_use]
    pub fn both(self, other: Confidence) -> Confidence {
        self.min(other)
    }

    #[must_use]
    pub fn is_reportable(self) -> bool {
        self > Confidence::Impossible
    }
}
