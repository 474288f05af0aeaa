//! Product catalog parsing and lookup.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::base::{prompts, types::ProductRecord};

/// Accepted catalog shapes: a bare array, or an object with a `products` array.
///
/// Records stay untyped here so one malformed entry doesn't sink the rest.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Records(Vec<Value>),
    Wrapped { products: Vec<Value> },
}

/// Parse the catalog document.
///
/// A leading UTF-8 byte order mark is ignored. Records missing a string
/// `name` or `description` are skipped; anything else unparseable yields an
/// empty catalog.
pub fn parse_catalog(bytes: &[u8]) -> Vec<ProductRecord> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    let records = match serde_json::from_slice::<CatalogDocument>(bytes) {
        Ok(CatalogDocument::Records(records)) | Ok(CatalogDocument::Wrapped { products: records }) => records,
        Err(err) => {
            warn!("Product catalog could not be parsed, using an empty catalog: {err}");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<ProductRecord>(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping catalog record {index}: {err}");
                None
            }
        })
        .collect()
}

/// Exact, case-sensitive lookup of `name` in catalog order.
///
/// Returns the first match's description, or the not-found message built from
/// `not_found_template`.
pub fn find_product(name: &str, catalog: &[ProductRecord], not_found_template: &str) -> String {
    catalog
        .iter()
        .find(|record| record.name == name)
        .map(|record| record.description.clone())
        .unwrap_or_else(|| prompts::not_found_message(not_found_template, name))
}

// Tests.
