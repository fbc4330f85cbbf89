use shared::{CategoryCount, ImpactSummary, ScanStats, WasteCategory};
use std::collections::BTreeMap;

use crate::catalog::CategoryCatalog;
use crate::records::ScanRecord;

/// Aggregates a user's scan history. Counts follow the detected category;
/// ties in the breakdown keep label order.
pub fn scan_stats(records: &[ScanRecord], catalog: &CategoryCatalog) -> ScanStats {
    let breakdown = category_breakdown(records);
    let impact = impact_summary(&breakdown, catalog);

    ScanStats {
        total_scans: records.len() as u64,
        category_breakdown: breakdown,
        accuracy_percentage: feedback_accuracy(records),
        impact,
    }
}

pub fn category_breakdown(records: &[ScanRecord]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<WasteCategory, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.detected_category).or_default() += 1;
    }

    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));
    breakdown
}

/// Share of answered scans the user confirmed, in percent to one decimal.
pub fn feedback_accuracy(records: &[ScanRecord]) -> f64 {
    let answered: Vec<bool> = records.iter().filter_map(|r| r.user_confirmed).collect();
    if answered.is_empty() {
        return 0.0;
    }
    let confirmed = answered.iter().filter(|c| **c).count();
    round_to(confirmed as f64 / answered.len() as f64 * 100.0, 1)
}

pub fn impact_summary(breakdown: &[CategoryCount], catalog: &CategoryCatalog) -> ImpactSummary {
    let mut co2 = 0.0;
    let mut water = 0.0;
    let mut trees = 0.0;
    let mut plastic_items = 0;

    for CategoryCount { category, count } in breakdown {
        let factors = catalog.impact_factors(*category);
        let items = *count as f64;
        co2 += items * factors.co2_kg;
        water += items * factors.water_liters;
        trees += items * factors.trees;
        if *category == WasteCategory::Plastic {
            plastic_items += *count;
        }
    }

    ImpactSummary {
        plastic_items_recycled: plastic_items,
        trees_saved: round_to(trees, 2),
        water_saved_liters: round_to(water, 1),
        co2_reduced_kg: round_to(co2, 1),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
