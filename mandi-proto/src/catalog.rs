//! Catalog data types shared by the REST API and the chat subsystem.
//!
//! Field names serialize in camelCase to match the JSON shapes the HTTP
//! endpoints expose (`/api/products/search`, `/api/product-suppliers/:id`).

use serde::{Deserialize, Serialize};

/// A product listing in the marketplace catalog.
///
/// Immutable for the lifetime of a chat; the negotiation subsystem only
/// reads it by `id`. The `mrp` (maximum retail price) is the reference
/// price that accept/reject thresholds are computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog identifier (also the chat room identifier).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category label (e.g. "Vegetables", "Spices").
    pub category: String,
    /// Name of the supplier selling this product.
    pub supplier: String,
    /// Reference price in whole rupees.
    pub mrp: u32,
    /// Sale unit ("kg", "pack", "liter", ...).
    pub unit: String,
    /// Relative path or URL to the product image.
    pub image_url: String,
}

/// A per-supplier offer listing for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierListing {
    /// Supplier identifier.
    pub supplier_id: String,
    /// Supplier display name.
    pub supplier_name: String,
    /// Asking price in whole rupees.
    pub price: u32,
    /// Sale unit.
    pub unit: String,
    /// Distance from the buyer in kilometers.
    pub distance: f64,
    /// Supplier rating out of 5.
    pub rating: f64,
}
