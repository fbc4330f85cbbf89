use shared::{CategoryInfo, CategoryListing, IntoEnumIterator, WasteCategory};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog has no entry for the fallback category 'other'")]
    MissingFallback,
}

/// Per-item savings credited when an item of a category is sorted correctly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactFactors {
    pub co2_kg: f64,
    pub water_liters: f64,
    pub trees: f64,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub info: CategoryInfo,
    pub impact: ImpactFactors,
}

/// Immutable registry of disposal guidance. Built once and shared behind an
/// `Arc`; lookups never fail and resolve unknown names to `other`.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    entries: HashMap<WasteCategory, CatalogEntry>,
    fallback: CatalogEntry,
}

impl CategoryCatalog {
    pub fn builtin() -> Self {
        let entries: HashMap<WasteCategory, CatalogEntry> = WasteCategory::iter()
            .map(|category| (category, builtin_entry(category)))
            .collect();
        let fallback = builtin_entry(WasteCategory::Other);
        Self { entries, fallback }
    }

    pub fn from_entries(
        entries: HashMap<WasteCategory, CatalogEntry>,
    ) -> Result<Self, CatalogError> {
        let fallback = entries
            .get(&WasteCategory::Other)
            .cloned()
            .ok_or(CatalogError::MissingFallback)?;
        Ok(Self { entries, fallback })
    }

    pub fn lookup(&self, name: &str) -> &CategoryInfo {
        match WasteCategory::from_str(name.trim()) {
            Ok(category) => self.get(category),
            Err(_) => {
                log::warn!("Unknown category '{}', falling back to 'other'", name);
                &self.fallback.info
            }
        }
    }

    pub fn get(&self, category: WasteCategory) -> &CategoryInfo {
        &self.entry(category).info
    }

    pub fn impact_factors(&self, category: WasteCategory) -> ImpactFactors {
        self.entry(category).impact
    }

    pub fn listing(&self, labels: &[WasteCategory]) -> Vec<CategoryListing> {
        labels
            .iter()
            .map(|category| CategoryListing {
                name: *category,
                display_name: category.display_name().to_string(),
                info: self.get(*category).clone(),
            })
            .collect()
    }

    fn entry(&self, category: WasteCategory) -> &CatalogEntry {
        self.entries.get(&category).unwrap_or(&self.fallback)
    }
}

fn make_entry(
    is_recyclable: bool,
    disposal_method: &str,
    environmental_impact: &str,
    recycling_tips: &str,
    color_code: &str,
    preparation_steps: [&str; 4],
    (co2_kg, water_liters, trees): (f64, f64, f64),
) -> CatalogEntry {
    CatalogEntry {
        info: CategoryInfo {
            is_recyclable,
            disposal_method: disposal_method.to_string(),
            environmental_impact: environmental_impact.to_string(),
            recycling_tips: recycling_tips.to_string(),
            color_code: color_code.to_string(),
            preparation_steps: preparation_steps.iter().map(|s| s.to_string()).collect(),
        },
        impact: ImpactFactors {
            co2_kg,
            water_liters,
            trees,
        },
    }
}

fn builtin_entry(category: WasteCategory) -> CatalogEntry {
    match category {
        WasteCategory::Plastic => make_entry(
            true,
            "Recycling bin (clean containers only)",
            "Takes 450+ years to decompose. Causes marine pollution.",
            "Clean containers, remove labels, separate by type",
            "#FF6B6B",
            [
                "Rinse containers thoroughly",
                "Remove all labels and caps",
                "Check recycling number",
                "Separate by plastic type",
            ],
            (0.5, 2.0, 0.001),
        ),
        WasteCategory::Paper => make_entry(
            true,
            "Paper recycling bin",
            "Decomposes in 2-6 weeks. Saves trees when recycled.",
            "Keep dry, remove staples, no wax coating",
            "#4ECDC4",
            [
                "Remove any plastic coating",
                "Take out staples and clips",
                "Keep paper dry",
                "Separate by paper type",
            ],
            (0.3, 1.5, 0.01),
        ),
        WasteCategory::Glass => make_entry(
            true,
            "Glass recycling bin",
            "Takes 1 million years to decompose. 100% recyclable.",
            "Separate by color, remove caps and lids",
            "#45B7D1",
            [
                "Remove all caps and lids",
                "Rinse containers",
                "Separate by color",
                "Remove any metal parts",
            ],
            (0.2, 0.5, 0.0),
        ),
        WasteCategory::Metal => make_entry(
            true,
            "Metal recycling bin",
            "Takes 50-200 years to decompose. Highly valuable for recycling.",
            "Clean cans, separate aluminum from steel",
            "#96CEB4",
            [
                "Clean all food residue",
                "Remove labels if possible",
                "Separate aluminum from steel",
                "Flatten cans to save space",
            ],
            (0.8, 3.0, 0.002),
        ),
        WasteCategory::Organic => make_entry(
            false,
            "Compost bin or organic waste",
            "Decomposes in 2-5 months. Creates methane in landfills.",
            "Compost at home or use organic waste collection",
            "#FECA57",
            [
                "Remove any packaging",
                "Cut into smaller pieces",
                "Mix with brown materials",
                "Keep compost moist",
            ],
            (0.1, 0.2, 0.0),
        ),
        WasteCategory::Electronic => make_entry(
            true,
            "E-waste collection center",
            "Contains toxic materials. Valuable metals can be recovered.",
            "Take to certified e-waste recycler, remove batteries",
            "#FF9FF3",
            [
                "Remove all batteries",
                "Delete personal data",
                "Keep original packaging if possible",
                "Take to certified recycler",
            ],
            (2.0, 5.0, 0.005),
        ),
        WasteCategory::Hazardous => make_entry(
            false,
            "Hazardous waste facility",
            "Extremely harmful to environment and health.",
            "Never put in regular trash. Use special collection events.",
            "#FF6B6B",
            [
                "Keep in original container",
                "Do not mix with other materials",
                "Label clearly",
                "Take to hazardous waste facility",
            ],
            (1.0, 2.0, 0.001),
        ),
        WasteCategory::Textile => make_entry(
            true,
            "Textile recycling or donation",
            "Takes 200+ years to decompose. Fast fashion increases waste.",
            "Donate if usable, recycle if damaged",
            "#A8E6CF",
            [
                "Clean and dry items",
                "Separate by condition",
                "Remove non-textile parts",
                "Donate or recycle appropriately",
            ],
            (0.4, 1.0, 0.002),
        ),
        WasteCategory::Other => make_entry(
            false,
            "General waste bin",
            "Varies by material type.",
            "Check local guidelines for specific items",
            "#95A5A6",
            [
                "Check local recycling guidelines",
                "Consider if item can be reused",
                "Separate any recyclable components",
                "Dispose according to local rules",
            ],
            (0.2, 0.5, 0.001),
        ),
    }
}
