//! Combining per-worker accumulators into the final ordered result

use std::cmp::Ordering;

use crate::aggregator::NationRevenueMap;
use crate::tables::NationRevenue;

/// Sum all partial accumulators into one map keyed by nation name.
pub fn merge_partials<I>(partials: I) -> NationRevenueMap
where
    I: IntoIterator<Item = NationRevenueMap>,
{
    let mut merged = NationRevenueMap::new();
    for partial in partials {
        for (nation, revenue) in partial {
            *merged.entry(nation).or_insert(0.0) += revenue;
        }
    }
    merged
}

/// Revenue descending; equal revenues keep ascending nation order.
fn by_revenue_desc(a: &NationRevenue, b: &NationRevenue) -> Ordering {
    b.revenue
        .total_cmp(&a.revenue)
        .then_with(|| a.nation.cmp(&b.nation))
}

/// Turn the merged map into result rows ordered by revenue descending.
pub fn into_sorted_results(merged: NationRevenueMap) -> Vec<NationRevenue> {
    let mut results: Vec<NationRevenue> = merged
        .into_iter()
        .map(|(nation, revenue)| NationRevenue { nation, revenue })
        .collect();
    results.sort_by(by_revenue_desc);
    results
}

pub fn merge_and_sort<I>(partials: I) -> Vec<NationRevenue>
where
    I: IntoIterator<Item = NationRevenueMap>,
{
    into_sorted_results(merge_partials(partials))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(entries: &[(&str, f64)]) -> NationRevenueMap {
        entries
            .iter()
            .map(|(nation, revenue)| (nation.to_string(), *revenue))
            .collect()
    }

    fn nations(results: &[NationRevenue]) -> Vec<&str> {
        results.iter().map(|r| r.nation.as_str()).collect()
    }

    #[test]
    fn test_merge_sums_per_nation() {
        let merged = merge_partials(vec![
            partial(&[("CHINA", 10.0), ("INDIA", 5.0)]),
            partial(&[]),
            partial(&[("CHINA", 2.5), ("JAPAN", 1.0)]),
        ]);
        assert_eq!(merged, partial(&[("CHINA", 12.5), ("INDIA", 5.0), ("JAPAN", 1.0)]));
    }

    #[test]
    fn test_sorted_by_revenue_desc() {
        let results = merge_and_sort(vec![
            partial(&[("INDIA", 5.0), ("VIETNAM", 40.0)]),
            partial(&[("CHINA", 12.5), ("JAPAN", 100.0)]),
        ]);
        assert_eq!(nations(&results), vec!["JAPAN", "VIETNAM", "CHINA", "INDIA"]);
        assert!(results.windows(2).all(|w| w[0].revenue >= w[1].revenue));
    }

    #[test]
    fn test_ties_ordered_by_name() {
        let results = merge_and_sort(vec![
            partial(&[("VIETNAM", 7.0), ("CHINA", 7.0)]),
            partial(&[("INDONESIA", 7.0), ("JAPAN", 9.0)]),
        ]);
        assert_eq!(nations(&results), vec!["JAPAN", "CHINA", "INDONESIA", "VIETNAM"]);
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let a = partial(&[("CHINA", 1.5), ("INDIA", 2.0)]);
        let b = partial(&[("INDIA", 4.0)]);
        let c = partial(&[("CHINA", 0.5), ("JAPAN", 3.0)]);

        let forward = merge_and_sort(vec![a.clone(), b.clone(), c.clone()]);
        let backward = merge_and_sort(vec![c, b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_and_sort(Vec::<NationRevenueMap>::new()).is_empty());
    }
}
