use serde::Serialize;
use serde_json::{Map, Value};

pub const TITLE_COLUMN: &str = "title";
pub const BRAND_COLUMN: &str = "brand";
pub const CATEGORIES_COLUMN: &str = "categories";

/// Cell values read as missing, the same set pandas' `read_csv` treats as NA by default.
const NULL_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_cell(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell)
}

/// One catalog row.
///
/// The columns the service reads are lifted into typed, explicitly nullable
/// fields; every column (including those) is kept in `fields` in the order the
/// cells were given so the record serializes flat. Empty cells and the usual NA
/// markers (`NA`, `N/A`, `NaN`, `null`, `None`, ...) are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub title: Option<String>,
    #[serde(skip)]
    pub brand: Option<String>,
    #[serde(skip)]
    pub categories: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Product {
    /// Build a product from `(column, cell)` pairs. Missing cells become `None` / `null`.
    pub fn from_cells<'a, I>(id: String, cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields = Map::new();
        for (column, cell) in cells {
            let value = if is_null_cell(cell) {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(column.to_string(), value);
        }

        let text = |column: &str| fields.get(column).and_then(Value::as_str).map(str::to_string);
        let title = text(TITLE_COLUMN);
        let brand = text(BRAND_COLUMN);
        let categories = text(CATEGORIES_COLUMN);

        Self {
            id,
            title,
            brand,
            categories,
            fields,
        }
    }

    pub fn field(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// A catalog product enriched for the recommendation response.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub genai_description: String,
}
