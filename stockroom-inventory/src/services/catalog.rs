use std::collections::BTreeMap;

use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use stockroom::collection::{Document, RecordId};
use stockroom::doc;
use stockroom::errors::StockroomResult;
use stockroom::model::{to_document, Repository};
use stockroom::stockroom::Stockroom;

use super::{paginate, require_text, validation_error, Page, PageRequest};
use crate::entities::{InventoryRecord, Pricing, Product, SupplierTerms};
use crate::timestamp;

const UNIQUE_FIELDS: &[&str] = &["sku", "barcode"];

/// Fields to change on a product; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub pricing: Option<Pricing>,
    pub supplier: Option<SupplierTerms>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Words matched case-insensitively against name, description and
    /// category; a product matches when any word does.
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: PageRequest,
}

/// The product catalog.
#[derive(Clone)]
pub struct CatalogService {
    products: Repository<Product>,
    inventories: Repository<InventoryRecord>,
}

impl CatalogService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(CatalogService {
            products: db.repository()?,
            inventories: db.repository()?,
        })
    }

    pub fn create_product(
        &self,
        mut product: Product,
        created_by: Option<&RecordId>,
    ) -> StockroomResult<Product> {
        require_text("name", &product.name)?;
        require_text("sku", &product.sku)?;
        require_text("category", &product.category)?;

        let now = timestamp::now();
        product.id = None;
        product.created_by = created_by.cloned();
        product.created_at = Some(now);
        product.updated_at = Some(now);

        let created = self.products.create_unique(&product, UNIQUE_FIELDS)?;
        log::debug!("Created product {} ({})", created.name, created.sku);
        Ok(created)
    }

    pub fn update_product(
        &self,
        id: &RecordId,
        update: ProductUpdate,
    ) -> StockroomResult<Option<Product>> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        if let Some(category) = &update.category {
            require_text("category", category)?;
        }

        self.products.find_by_id_and_modify_unique(id, UNIQUE_FIELDS, |product| {
            let ProductUpdate {
                name,
                description,
                category,
                sku,
                barcode,
                pricing,
                supplier,
                specifications,
                is_active,
            } = update;

            if let Some(name) = name {
                product.name = name;
            }
            if let Some(description) = description {
                product.description = description;
            }
            if let Some(category) = category {
                product.category = category;
            }
            if let Some(sku) = sku {
                product.sku = sku;
            }
            if barcode.is_some() {
                product.barcode = barcode;
            }
            if let Some(pricing) = pricing {
                product.pricing = pricing;
            }
            if supplier.is_some() {
                product.supplier = supplier;
            }
            if let Some(specifications) = specifications {
                product.specifications = specifications;
            }
            if let Some(is_active) = is_active {
                product.is_active = is_active;
            }
            product.updated_at = Some(timestamp::now());
            Ok(())
        })
    }

    /// Soft delete: the product stays stored but leaves listings.
    pub fn deactivate_product(&self, id: &RecordId) -> StockroomResult<bool> {
        let patch = doc! { isActive: false, updatedAt: (timestamp::now()) };
        Ok(self.products.find_by_id_and_update(id, &patch)?.is_some())
    }

    pub fn get_product(&self, id: &RecordId) -> StockroomResult<Option<Product>> {
        self.products.find_by_id(id)
    }

    /// Stock records of a product across locations.
    pub fn product_inventory(&self, id: &RecordId) -> StockroomResult<Vec<InventoryRecord>> {
        self.inventories.find(&doc! { productId: id })
    }

    /// Active products, newest first.
    pub fn list_products(&self, query: &ProductQuery) -> StockroomResult<Page<Product>> {
        let mut filter = doc! { isActive: true };
        if let Some(category) = &query.category {
            filter.put("category", category.as_str())?;
        }
        let mut products = self.products.find(&filter)?;

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = search_pattern(search)?;
            products.retain(|product| {
                pattern.is_match(&product.name)
                    || pattern.is_match(&product.description)
                    || pattern.is_match(&product.category)
            });
        }

        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(products, query.page))
    }

    /// Distinct categories of all products, sorted.
    pub fn categories(&self) -> StockroomResult<Vec<String>> {
        Ok(self
            .products
            .find(&doc! {})?
            .into_iter()
            .map(|product| product.category)
            .sorted()
            .dedup()
            .collect())
    }

    /// Stock records below their reorder point, with `productId` and
    /// `locationId` resolved to the referenced records.
    pub fn low_stock(&self) -> StockroomResult<Vec<Document>> {
        let records = self
            .inventories
            .find(&doc! {})?
            .into_iter()
            .filter(InventoryRecord::is_below_reorder_point)
            .map(|record| to_document(&record))
            .collect::<StockroomResult<Vec<_>>>()?;

        let model = self.inventories.model();
        let records = model.populate_all(records, "products.productId")?;
        model.populate_all(records, "locations.locationId")
    }
}

fn search_pattern(search: &str) -> StockroomResult<Regex> {
    let alternatives = search.split_whitespace().map(regex::escape).join("|");
    RegexBuilder::new(&alternatives)
        .case_insensitive(true)
        .build()
        .map_err(|e| validation_error(&format!("Invalid search {}: {}", search, e)))
}
