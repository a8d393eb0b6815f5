pub mod barcode;
pub mod receipt;

pub use barcode::{
    lookup_product, normalize_product, parse_product_quantity, ProductLookup, ProductRecord,
};
pub use receipt::{
    extract_candidates, extract_items, normalize_line_items, scan_receipt, LineItem,
    ReceiptCandidate, ReceiptScanner, DEFAULT_MAX_ITEMS,
};
