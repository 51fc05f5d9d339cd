use crate::{
    error::{ApiError, Result},
    models::{is_null_cell, DatasetHealth, Product},
};
use csv::ReaderBuilder;
use std::{collections::HashMap, fs::File, io, path::Path};
use tracing::{error, info, warn};

/// In-memory product catalog indexed by its identifier column.
#[derive(Debug)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_reader<R: io::Read>(reader: R, id_column: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ApiError::DatasetUnavailable(format!("Unreadable header row: {}", e)))?
            .clone();

        let id_pos = headers.iter().position(|h| h == id_column).ok_or_else(|| {
            ApiError::DatasetUnavailable(format!("Missing identifier column '{}'", id_column))
        })?;

        let mut products = Vec::new();
        let mut index = HashMap::new();

        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| {
                ApiError::DatasetUnavailable(format!("Malformed row {}: {}", row + 1, e))
            })?;

            let id = record.get(id_pos).unwrap_or("").trim().to_string();
            if is_null_cell(&id) {
                return Err(ApiError::DatasetUnavailable(format!(
                    "Row {} has no '{}' value",
                    row + 1,
                    id_column
                )));
            }
            if index.contains_key(&id) {
                return Err(ApiError::DatasetUnavailable(format!(
                    "Duplicate product id '{}' at row {}",
                    id,
                    row + 1
                )));
            }

            // The id column leads, carrying the same trimmed value the index is keyed by.
            // Short rows are padded so every product carries every column.
            let cells = std::iter::once((id_column, id.as_str())).chain(
                headers
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != id_pos)
                    .map(|(i, column)| (column, record.get(i).unwrap_or(""))),
            );

            let product = Product::from_cells(id.clone(), cells);
            index.insert(id, products.len());
            products.push(product);
        }

        Ok(Self { products, index })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&i| &self.products[i])
    }

    /// Look up products in the order the ids are given.
    ///
    /// All-or-nothing: any id absent from the catalog fails the whole lookup
    /// with `NotFound` naming every missing id.
    pub fn lookup_many(&self, ids: &[String]) -> Result<Vec<&Product>> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.get(id) {
                Some(product) => found.push(product),
                None => missing.push(id.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(ApiError::NotFound(format!(
                "Products returned by the vector index are missing from the catalog: {}",
                missing.join(", ")
            )));
        }

        Ok(found)
    }

    pub fn all_rows(&self) -> &[Product] {
        &self.products
    }
}

/// The catalog as loaded at startup. Never reloaded.
#[derive(Debug)]
pub enum Dataset {
    Ready(Catalog),
    Unavailable(String),
}

impl Dataset {
    /// Load the catalog file. Failure is logged and recorded, not raised.
    pub fn load(path: &Path, id_column: &str) -> Self {
        info!("Loading product dataset from {}...", path.display());

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("Product dataset not found at {}", path.display());
                return Dataset::Unavailable(format!(
                    "dataset file {} not found",
                    path.display()
                ));
            }
            Err(e) => {
                error!("Failed to open product dataset {}: {}", path.display(), e);
                return Dataset::Unavailable(format!(
                    "dataset file {} unreadable: {}",
                    path.display(),
                    e
                ));
            }
        };

        match Catalog::from_reader(file, id_column) {
            Ok(catalog) => {
                if catalog.is_empty() {
                    warn!("Product dataset {} has no rows", path.display());
                }
                info!("Product dataset loaded: {} products", catalog.len());
                Dataset::Ready(catalog)
            }
            Err(e) => {
                error!("Failed to parse product dataset {}: {}", path.display(), e);
                Dataset::Unavailable(e.to_string())
            }
        }
    }

    pub fn catalog(&self) -> Result<&Catalog> {
        match self {
            Dataset::Ready(catalog) => Ok(catalog),
            Dataset::Unavailable(reason) => Err(ApiError::DatasetUnavailable(reason.clone())),
        }
    }

    pub fn health(&self) -> DatasetHealth {
        match self {
            Dataset::Ready(catalog) => DatasetHealth {
                loaded: true,
                products: catalog.len(),
                error: None,
            },
            Dataset::Unavailable(reason) => DatasetHealth {
                loaded: false,
                products: 0,
                error: Some(reason.clone()),
            },
        }
    }
}
