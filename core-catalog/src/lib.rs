//! # Catalog Module
//!
//! Reads back what has been uploaded: the product list, single products and
//! their image URLs, plus client-side paging of a loaded list.

pub mod client;
pub mod error;
pub mod models;
pub mod pagination;

pub use client::{image_url, CatalogClient};
pub use error::{CatalogError, Result};
pub use models::{ProductList, ProductRecord};
pub use pagination::{paginate, Page, PageRequest};
