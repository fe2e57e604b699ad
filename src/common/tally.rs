use std::{collections::BTreeMap, fmt};

/// Why a stage dropped or coerced an element. None of these are fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Skip {
    /// Geometry is unrepairable, non-polygonal, or collapsed to zero area.
    InvalidGeometry,
    /// A node or edge lacks a required coordinate, category or endpoint.
    MissingAttribute,
    /// No layers, no features, or an empty graph.
    EmptyInput,
    /// A weight that cannot be read as a number, coerced to `+inf`.
    NonNumericWeight,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Skip::InvalidGeometry => "invalid geometry",
            Skip::MissingAttribute => "missing attribute",
            Skip::EmptyInput => "empty input",
            Skip::NonNumericWeight => "non-numeric weight",
        })
    }
}

/// Per-stage counts of skipped elements, flushed to the log by `report`.
#[derive(Debug, Clone)]
pub(crate) struct Tally {
    stage: &'static str,
    counts: BTreeMap<Skip, usize>,
}

impl Tally {
    pub(crate) fn new(stage: &'static str) -> Self {
        Self { stage, counts: BTreeMap::new() }
    }

    #[inline] pub(crate) fn add(&mut self, skip: Skip) { self.add_n(skip, 1) }

    #[inline]
    pub(crate) fn add_n(&mut self, skip: Skip, n: usize) {
        if n > 0 { *self.counts.entry(skip).or_default() += n }
    }

    #[inline] pub(crate) fn get(&self, skip: Skip) -> usize { self.counts.get(&skip).copied().unwrap_or(0) }

    #[inline] pub(crate) fn total(&self) -> usize { self.counts.values().sum() }

    /// Log one line per non-zero reason.
    pub(crate) fn report(&self) {
        if self.total() == 0 { return }
        for (skip, count) in &self.counts {
            log::info!("[{}] skipped {count} element(s): {skip}", self.stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_reason() {
        let mut tally = Tally::new("test");
        tally.add(Skip::InvalidGeometry);
        tally.add(Skip::InvalidGeometry);
        tally.add_n(Skip::NonNumericWeight, 3);
        tally.add_n(Skip::EmptyInput, 0);

        assert_eq!(tally.get(Skip::InvalidGeometry), 2);
        assert_eq!(tally.get(Skip::NonNumericWeight), 3);
        assert_eq!(tally.get(Skip::EmptyInput), 0);
        assert_eq!(tally.get(Skip::MissingAttribute), 0);
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Skip::MissingAttribute.to_string(), "missing attribute");
    }
}
