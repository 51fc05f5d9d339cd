use crate::{
    error::Result,
    models::{AnalyticsSummary, BrandCount, CategoryCount, Product},
    services::dataset::Dataset,
};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

pub const TOP_BRANDS_LIMIT: usize = 10;
/// Categories need strictly more products than this to be reported.
pub const POPULAR_CATEGORY_MIN_COUNT: usize = 5;
pub const UNCATEGORIZED: &str = "Uncategorized";

pub struct AnalyticsService {
    dataset: Arc<Dataset>,
}

impl AnalyticsService {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn summarize(&self) -> Result<AnalyticsSummary> {
        let catalog = self.dataset.catalog()?;
        let products = catalog.all_rows();
        debug!("Summarizing {} products", products.len());

        Ok(AnalyticsSummary {
            top_brands: top_brands(products),
            popular_categories: popular_categories(products),
        })
    }
}

/// Most frequent brands, at most [`TOP_BRANDS_LIMIT`]. Products without a brand are not counted.
pub fn top_brands(products: &[Product]) -> Vec<BrandCount> {
    let brands = products.iter().filter_map(|p| p.brand.as_deref());

    count_descending(brands)
        .into_iter()
        .take(TOP_BRANDS_LIMIT)
        .map(|(brand, count)| BrandCount { brand, count })
        .collect()
}

pub fn popular_categories(products: &[Product]) -> Vec<CategoryCount> {
    let categories = products
        .iter()
        .map(|p| main_category(p.categories.as_deref()));

    count_descending(categories)
        .into_iter()
        .filter(|(_, count)| *count > POPULAR_CATEGORY_MIN_COUNT)
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

/// First category of a list literal such as `['Electronics', 'Audio']`.
pub fn main_category(raw: Option<&str>) -> &str {
    let Some(raw) = raw else {
        return UNCATEGORIZED;
    };

    let first = raw
        .trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '\'')
        .split("', '")
        .next()
        .unwrap_or("")
        .trim();

    if first.is_empty() {
        UNCATEGORIZED
    } else {
        first
    }
}

/// Count occurrences and sort by count, descending. Ties keep first-appearance order.
fn count_descending<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for value in values {
        match positions.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
