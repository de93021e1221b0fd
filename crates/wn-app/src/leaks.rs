//! Leak history queries.

use std::collections::BTreeMap;

use wn_records::{LeakRecord, LeakSet};

/// Earliest and latest leak year, if any leaks were recorded.
pub fn leak_year_range(leaks: &LeakSet) -> Option<(i32, i32)> {
    let years = leaks.leaks.iter().map(|l| l.year);
    let min = years.clone().min()?;
    let max = years.max()?;
    Some((min, max))
}

pub fn leaks_in_year(leaks: &LeakSet, year: i32) -> Vec<&LeakRecord> {
    leaks.leaks.iter().filter(|l| l.year == year).collect()
}

pub fn leak_counts_by_year(leaks: &LeakSet) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for leak in &leaks.leaks {
        *counts.entry(leak.year).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use wn_core::Coord;

    fn set(years: &[i32]) -> LeakSet {
        LeakSet {
            leaks: years
                .iter()
                .map(|&year| LeakRecord {
                    id: None,
                    position: Coord::new(0.0, 0.0),
                    year,
                })
                .collect(),
            dropped: 0,
        }
    }

    #[test]
    fn empty_set_has_no_range() {
        assert_eq!(leak_year_range(&LeakSet::default()), None);
    }

    #[test]
    fn range_and_filter() {
        let leaks = set(&[2019, 2021, 2019, 2015]);
        assert_eq!(leak_year_range(&leaks), Some((2015, 2021)));
        assert_eq!(leaks_in_year(&leaks, 2019).len(), 2);
        assert!(leaks_in_year(&leaks, 2020).is_empty());
        assert_eq!(leak_counts_by_year(&leaks).get(&2019), Some(&2));
    }
}
