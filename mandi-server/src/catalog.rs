//! In-memory product catalog.
//!
//! The [`CatalogStore`] is a read-only repository built once at startup,
//! either from the compiled-in demo data or from a TOML catalog file.
//! The chat subsystem only ever reads it by product id; the REST API adds
//! keyword search and per-product supplier listings on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mandi_proto::catalog::{Product, SupplierListing};

/// Errors that can occur when loading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read catalog file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML catalog.
    #[error("failed to parse catalog file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The catalog file parsed but contained no products.
    #[error("catalog file contains no products")]
    Empty,
}

/// TOML catalog file structure. Field names follow the wire shapes
/// (camelCase), so the same keys appear in the file and in API responses.
#[derive(Debug, serde::Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    listings: HashMap<String, Vec<SupplierListing>>,
}

/// Read-only product catalog with per-product supplier listings.
pub struct CatalogStore {
    products: Vec<Product>,
    listings: HashMap<String, Vec<SupplierListing>>,
}

impl CatalogStore {
    /// Creates a catalog from explicit product and listing data.
    #[must_use]
    pub const fn new(
        products: Vec<Product>,
        listings: HashMap<String, Vec<SupplierListing>>,
    ) -> Self {
        Self { products, listings }
    }

    /// Creates a catalog seeded with the built-in demo data.
    #[must_use]
    pub fn with_demo_data() -> Self {
        Self::new(demo_products(), demo_listings())
    }

    /// Loads a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or parsed, or
    /// if it contains no products.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a catalog from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseToml`] on malformed TOML, or
    /// [`CatalogError::Empty`] if no products are defined.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        if file.products.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self::new(file.products, file.listings))
    }

    /// Looks up a product by id.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Case-insensitive substring search on product name or supplier.
    /// An empty query returns the full catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        let query = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p.supplier.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Returns the supplier listings for a product, if any are known.
    #[must_use]
    pub fn listings(&self, product_id: &str) -> Option<&[SupplierListing]> {
        self.listings.get(product_id).map(Vec::as_slice)
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// True if the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::with_demo_data()
    }
}

fn product(id: &str, name: &str, category: &str, supplier: &str, mrp: u32, unit: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        supplier: supplier.to_string(),
        mrp,
        unit: unit.to_string(),
        image_url: format!("images/{id}.png"),
    }
}

/// The built-in demo catalog (prototype data, not a real inventory).
fn demo_products() -> Vec<Product> {
    vec![
        product("p1", "Fresh Onions", "Vegetables", "A-Grade Veggies", 25, "kg"),
        product("p2", "Premium Tomatoes", "Vegetables", "Green Farms", 40, "kg"),
        product("p3", "Paneer Blocks", "Dairy", "Dairy Delights", 250, "kg"),
        product("p4", "Chaat Masala", "Spices", "Spice Mart", 80, "pack"),
        product("p5", "Potatoes (New Crop)", "Vegetables", "Farm Fresh Co.", 20, "kg"),
        product("p6", "Coriander Leaves", "Vegetables", "Local Greens", 15, "bunch"),
        product("p7", "Carrots", "Vegetables", "Veggie Hub", 28, "kg"),
        product("p8", "Capsicum", "Vegetables", "Fresh Farm", 34, "kg"),
        product("p9", "Black Pepper", "Spices", "Spice Hub", 88, "pack"),
        product("p10", "Cumin Powder", "Spices", "Masala Mart", 92, "pack"),
        product("p11", "Cheese Cubes", "Dairy", "Dairy World", 310, "kg"),
        product("p12", "Milk (Full Cream)", "Dairy", "Dairy Fresh", 58, "liter"),
        product("p13", "Wheat Flour", "Grains", "Grain Basket", 46, "kg"),
        product("p14", "Rice (Basmati)", "Grains", "Grain House", 72, "kg"),
    ]
}

fn listing(
    supplier_id: &str,
    supplier_name: &str,
    price: u32,
    unit: &str,
    distance: f64,
    rating: f64,
) -> SupplierListing {
    SupplierListing {
        supplier_id: supplier_id.to_string(),
        supplier_name: supplier_name.to_string(),
        price,
        unit: unit.to_string(),
        distance,
        rating,
    }
}

/// Per-product supplier listings for the demo catalog.
fn demo_listings() -> HashMap<String, Vec<SupplierListing>> {
    let mut map = HashMap::new();
    map.insert(
        "p1".to_string(),
        vec![
            listing("s1", "A-Grade Veggies", 24, "kg", 3.0, 4.5),
            listing("s2", "Fresh Fields", 25, "kg", 5.0, 4.1),
        ],
    );
    map.insert(
        "p2".to_string(),
        vec![
            listing("s3", "Green Farms", 38, "kg", 2.0, 4.7),
            listing("s4", "Veggie Point", 40, "kg", 4.0, 4.2),
        ],
    );
    map.insert(
        "p3".to_string(),
        vec![listing("s5", "Dairy Delights", 245, "kg", 6.0, 4.6)],
    );
    map.insert(
        "p4".to_string(),
        vec![listing("s6", "Spice Mart", 75, "pack", 1.0, 4.3)],
    );
    map.insert(
        "p5".to_string(),
        vec![listing("s7", "Farm Fresh Co.", 19, "kg", 2.5, 4.0)],
    );
    map.insert(
        "p6".to_string(),
        vec![listing("s8", "Local Greens", 14, "bunch", 1.2, 4.4)],
    );
    map.insert(
        "p7".to_string(),
        vec![listing("s9", "Veggie Hub", 28, "kg", 3.0, 4.2)],
    );
    map.insert(
        "p8".to_string(),
        vec![listing("s10", "Fresh Farm", 34, "kg", 2.8, 4.4)],
    );
    map.insert(
        "p9".to_string(),
        vec![listing("s11", "Spice Hub", 88, "pack", 4.0, 4.5)],
    );
    map.insert(
        "p10".to_string(),
        vec![listing("s12", "Masala Mart", 92, "pack", 3.5, 4.6)],
    );
    map.insert(
        "p11".to_string(),
        vec![listing("s13", "Dairy World", 310, "kg", 5.0, 4.3)],
    );
    map.insert(
        "p12".to_string(),
        vec![listing("s14", "Dairy Fresh", 58, "liter", 3.7, 4.2)],
    );
    map.insert(
        "p13".to_string(),
        vec![listing("s15", "Grain Basket", 46, "kg", 4.5, 4.1)],
    );
    map.insert(
        "p14".to_string(),
        vec![listing("s16", "Grain House", 72, "kg", 6.0, 4.4)],
    );
    map
}
