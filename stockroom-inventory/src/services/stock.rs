use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use stockroom::collection::{Document, RecordId};
use stockroom::doc;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::{not_found, paginate, validation_error, AlertService, Page, PageRequest};
use crate::entities::{
    Alert, AlertType, InventoryRecord, Location, Movement, MovementType, Product, Severity,
};
use crate::timestamp;

/// A signed stock correction at one location.
#[derive(Debug, Clone)]
pub struct Adjustment {
    pub product_id: RecordId,
    pub location_id: RecordId,
    /// Positive adds stock, negative removes it.
    pub quantity: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub unit_cost: Option<f64>,
    pub performed_by: Option<RecordId>,
}

impl Adjustment {
    pub fn new(product_id: RecordId, location_id: RecordId, quantity: i64) -> Self {
        Adjustment {
            product_id,
            location_id,
            quantity,
            reason: None,
            reference: None,
            unit_cost: None,
            performed_by: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn performed_by(mut self, user: RecordId) -> Self {
        self.performed_by = Some(user);
        self
    }
}

/// Moves stock of one product between two locations.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub product_id: RecordId,
    pub from_location_id: RecordId,
    pub to_location_id: RecordId,
    pub quantity: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub performed_by: Option<RecordId>,
}

impl Transfer {
    pub fn new(product_id: RecordId, from: RecordId, to: RecordId, quantity: i64) -> Self {
        Transfer {
            product_id,
            from_location_id: from,
            to_location_id: to,
            quantity,
            reason: None,
            reference: None,
            performed_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub from: InventoryRecord,
    pub to: InventoryRecord,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryQuery {
    pub product_id: Option<RecordId>,
    pub location_id: Option<RecordId>,
    /// Only records below their reorder point.
    pub low_stock: bool,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub product_id: Option<RecordId>,
    pub location_id: Option<RecordId>,
    pub movement_type: Option<MovementType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementEntry {
    pub product_id: RecordId,
    pub location_id: RecordId,
    pub movement: Movement,
}

/// Stock on hand priced at cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub total_value: f64,
    pub by_location: BTreeMap<String, f64>,
    pub by_product: BTreeMap<String, f64>,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRecommendation {
    pub product_id: RecordId,
    pub product_name: String,
    pub sku: String,
    pub location: String,
    pub supplier: String,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub recommended_quantity: i64,
    pub estimated_cost: f64,
}

/// Stock levels and the movement ledger.
///
/// Find-or-create of inventory records is serialized by a lock shared by
/// clones of the service. Each record write runs under the collection lock,
/// so concurrent movements on one record are never lost.
#[derive(Clone)]
pub struct StockService {
    products: Repository<Product>,
    locations: Repository<Location>,
    inventories: Repository<InventoryRecord>,
    alerts: AlertService,
    ledger: Arc<Mutex<()>>,
}

impl StockService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(StockService {
            products: db.repository()?,
            locations: db.repository()?,
            inventories: db.repository()?,
            alerts: AlertService::new(db)?,
            ledger: Arc::new(Mutex::new(())),
        })
    }

    /// Applies a stock correction, creating the inventory record when the
    /// product has none at the location yet. Raises a high severity low
    /// stock alert when the result is below the reorder point.
    pub fn adjust(&self, request: Adjustment) -> StockroomResult<InventoryRecord> {
        if request.quantity == 0 {
            return Err(validation_error("Adjustment quantity cannot be zero"));
        }
        let product = self.require_product(&request.product_id)?;
        self.require_location(&request.location_id)?;

        let now = timestamp::now();
        let quantity = request
            .quantity
            .checked_abs()
            .ok_or_else(|| validation_error("Adjustment quantity is out of range"))?;
        let movement = Movement {
            movement_id: format!("ADJ-{}", now.timestamp_millis()),
            movement_type: MovementType::Adjustment,
            quantity,
            reason: request.reason,
            reference: request.reference,
            from_location: None,
            to_location: None,
            unit_cost: request.unit_cost,
            total_value: Some(quantity as f64 * request.unit_cost.unwrap_or(0.0)),
            performed_by: request.performed_by,
            timestamp: now,
        };

        let record = {
            let _guard = self.ledger.lock();
            self.change_stock(
                &request.product_id,
                &request.location_id,
                request.quantity,
                movement,
                now,
            )?
        };
        log::debug!(
            "Adjusted {} at {} by {} to {}",
            product.sku,
            record.location_id,
            request.quantity,
            record.current_stock
        );

        if record.is_below_reorder_point() {
            self.raise_low_stock(&product, &record)?;
        }
        Ok(record)
    }

    /// Moves stock between locations. Fails with `InsufficientStock` when the
    /// source holds less than the quantity. The source is written first.
    pub fn transfer(&self, request: Transfer) -> StockroomResult<TransferOutcome> {
        if request.quantity <= 0 {
            return Err(validation_error("Transfer quantity must be positive"));
        }
        if request.from_location_id == request.to_location_id {
            return Err(validation_error("Cannot transfer to the same location"));
        }
        self.require_product(&request.product_id)?;
        self.require_location(&request.from_location_id)?;
        self.require_location(&request.to_location_id)?;

        let now = timestamp::now();
        let transfer_id = format!("TRF-{}", now.timestamp_millis());
        let reason = request
            .reason
            .clone()
            .unwrap_or_else(|| "Stock transfer".to_string());
        let movement = |suffix: &str, movement_type: MovementType| Movement {
            movement_id: format!("{}-{}", transfer_id, suffix),
            movement_type,
            quantity: request.quantity,
            reason: Some(reason.clone()),
            reference: request.reference.clone(),
            from_location: Some(request.from_location_id.clone()),
            to_location: Some(request.to_location_id.clone()),
            unit_cost: None,
            total_value: None,
            performed_by: request.performed_by.clone(),
            timestamp: now,
        };

        let _guard = self.ledger.lock();
        let source = self
            .find_record(&request.product_id, &request.from_location_id)?
            .and_then(|record| record.id);
        let Some(source_id) = source else {
            return Err(insufficient_stock(&request.product_id, &request.from_location_id));
        };
        let target = self.find_record(&request.product_id, &request.to_location_id)?;
        let overflows = |record: InventoryRecord| {
            record.current_stock.checked_add(request.quantity).is_none()
        };
        if target.is_some_and(overflows) {
            return Err(validation_error(
                "Transfer quantity is out of range for the target stock",
            ));
        }

        let out = movement("OUT", MovementType::Out);
        let from = self
            .inventories
            .find_by_id_and_modify(&source_id, |record| {
                if record.current_stock < request.quantity {
                    return Err(insufficient_stock(&record.product_id, &record.location_id));
                }
                record.apply(-request.quantity, out, now)?;
                record.touch(now);
                Ok(())
            })?
            .ok_or_else(|| not_found("Inventory record", &source_id))?;

        let to = self.change_stock(
            &request.product_id,
            &request.to_location_id,
            request.quantity,
            movement("IN", MovementType::In),
            now,
        )?;

        log::debug!(
            "Transferred {} of {} from {} to {}",
            request.quantity,
            request.product_id,
            request.from_location_id,
            request.to_location_id
        );
        Ok(TransferOutcome { from, to })
    }

    /// Sets the reorder point and maximum stock of a product at a location.
    pub fn set_levels(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
        reorder_point: i64,
        max_stock: i64,
    ) -> StockroomResult<InventoryRecord> {
        if reorder_point < 0 || max_stock < 0 {
            return Err(validation_error("Stock levels cannot be negative"));
        }
        self.require_product(product_id)?;
        self.require_location(location_id)?;

        let _guard = self.ledger.lock();
        self.upsert(product_id, location_id, |record| {
            record.reorder_point = reorder_point;
            record.max_stock = max_stock;
            Ok(())
        })
    }

    /// Holds back stock from the available quantity.
    pub fn reserve(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
        quantity: i64,
    ) -> StockroomResult<InventoryRecord> {
        if quantity <= 0 {
            return Err(validation_error("Reserved quantity must be positive"));
        }
        let _guard = self.ledger.lock();
        let Some(id) = self.find_record(product_id, location_id)?.and_then(|r| r.id) else {
            return Err(insufficient_stock(product_id, location_id));
        };
        self.inventories
            .find_by_id_and_modify(&id, |record| {
                if record.current_stock.saturating_sub(record.reserved_stock) < quantity {
                    return Err(insufficient_stock(product_id, location_id));
                }
                record.reserved_stock += quantity;
                record.touch(timestamp::now());
                Ok(())
            })?
            .ok_or_else(|| not_found("Inventory record", &id))
    }

    /// Returns reserved stock to the available quantity, at most what is reserved.
    pub fn release(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
        quantity: i64,
    ) -> StockroomResult<Option<InventoryRecord>> {
        if quantity <= 0 {
            return Err(validation_error("Released quantity must be positive"));
        }
        let _guard = self.ledger.lock();
        let Some(id) = self.find_record(product_id, location_id)?.and_then(|r| r.id) else {
            return Ok(None);
        };
        self.inventories.find_by_id_and_modify(&id, |record| {
            record.reserved_stock = (record.reserved_stock - quantity).max(0);
            record.touch(timestamp::now());
            Ok(())
        })
    }

    pub fn get(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
    ) -> StockroomResult<Option<InventoryRecord>> {
        self.find_record(product_id, location_id)
    }

    /// Inventory records, newest first.
    pub fn inventory(&self, query: &InventoryQuery) -> StockroomResult<Page<InventoryRecord>> {
        let filter = reference_filter(query.product_id.as_ref(), query.location_id.as_ref())?;
        let mut records = self.inventories.find(&filter)?;
        if query.low_stock {
            records.retain(InventoryRecord::is_below_reorder_point);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(records, query.page))
    }

    /// Movement ledger across inventory records, newest first.
    pub fn movements(&self, query: &MovementQuery) -> StockroomResult<Vec<MovementEntry>> {
        let filter = reference_filter(query.product_id.as_ref(), query.location_id.as_ref())?;
        let records = self.inventories.find(&filter)?;

        let mut entries: Vec<MovementEntry> = records
            .into_iter()
            .flat_map(|record| {
                let InventoryRecord {
                    product_id,
                    location_id,
                    movements,
                    ..
                } = record;
                movements.into_iter().map(move |movement| MovementEntry {
                    product_id: product_id.clone(),
                    location_id: location_id.clone(),
                    movement,
                })
            })
            .filter(|entry| {
                query
                    .movement_type
                    .map_or(true, |t| entry.movement.movement_type == t)
            })
            .collect();
        entries.sort_by(|a, b| b.movement.timestamp.cmp(&a.movement.timestamp));
        Ok(entries)
    }

    /// Current stock priced at each product's cost, in total and by location
    /// and product name.
    pub fn valuation(&self) -> StockroomResult<Valuation> {
        let products = self.products_by_id()?;
        let locations = self.locations_by_id()?;
        let records = self.inventories.find(&doc! {})?;

        let mut valuation = Valuation {
            items: records.len(),
            ..Default::default()
        };
        for record in &records {
            let product = products.get(&record.product_id);
            let cost_price = product.map(Product::cost_price).unwrap_or(0.0);
            let value = record.current_stock as f64 * cost_price;
            valuation.total_value += value;

            let location_name = locations
                .get(&record.location_id)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| record.location_id.to_string());
            *valuation.by_location.entry(location_name).or_default() += value;

            let product_name = product
                .map(|p| p.name.clone())
                .unwrap_or_else(|| record.product_id.to_string());
            *valuation.by_product.entry(product_name).or_default() += value;
        }
        Ok(valuation)
    }

    /// What to order for every record at or below its reorder point: enough to
    /// get back to the reorder point plus one minimum order, and never less
    /// than the minimum order quantity.
    pub fn reorder_recommendations(&self) -> StockroomResult<Vec<ReorderRecommendation>> {
        let products = self.products_by_id()?;
        let locations = self.locations_by_id()?;

        let recommendations = self
            .inventories
            .find(&doc! {})?
            .into_iter()
            .filter(InventoryRecord::is_at_or_below_reorder_point)
            .filter_map(|record| {
                let product = products.get(&record.product_id)?;
                let moq = product.minimum_order_quantity();
                let quantity = record
                    .reorder_point
                    .saturating_sub(record.current_stock)
                    .saturating_add(moq)
                    .max(moq);
                Some(ReorderRecommendation {
                    product_id: record.product_id.clone(),
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    location: locations
                        .get(&record.location_id)
                        .map(|l| l.name.clone())
                        .unwrap_or_default(),
                    supplier: product.supplier_name().to_string(),
                    current_stock: record.current_stock,
                    reorder_point: record.reorder_point,
                    recommended_quantity: quantity,
                    estimated_cost: quantity as f64 * product.cost_price(),
                })
            })
            .collect();
        Ok(recommendations)
    }

    fn find_record(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
    ) -> StockroomResult<Option<InventoryRecord>> {
        self.inventories
            .find_one(&doc! { productId: product_id, locationId: location_id })
    }

    /// Applies `delta` with its movement to the record of the pair, creating
    /// the record when missing. Callers hold the ledger lock.
    fn change_stock(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
        delta: i64,
        movement: Movement,
        now: DateTime<Utc>,
    ) -> StockroomResult<InventoryRecord> {
        self.upsert(product_id, location_id, |record| record.apply(delta, movement, now))
    }

    fn upsert<F>(
        &self,
        product_id: &RecordId,
        location_id: &RecordId,
        change: F,
    ) -> StockroomResult<InventoryRecord>
    where
        F: FnOnce(&mut InventoryRecord) -> StockroomResult<()>,
    {
        let now = timestamp::now();
        match self.find_record(product_id, location_id)?.and_then(|r| r.id) {
            Some(id) => self
                .inventories
                .find_by_id_and_modify(&id, |record| {
                    change(record)?;
                    record.touch(now);
                    Ok(())
                })?
                .ok_or_else(|| not_found("Inventory record", &id)),
            None => {
                let mut record = InventoryRecord::new(product_id.clone(), location_id.clone());
                change(&mut record)?;
                record.touch(now);
                self.inventories.create(&record)
            }
        }
    }

    fn raise_low_stock(
        &self,
        product: &Product,
        record: &InventoryRecord,
    ) -> StockroomResult<Alert> {
        let mut alert = Alert::new(
            AlertType::LowStock,
            &format!("Low Stock Alert: {}", product.name),
            &format!(
                "Current stock ({}) is below reorder point ({})",
                record.current_stock, record.reorder_point
            ),
        )
        .with_severity(Severity::High)
        .for_stock(record.product_id.clone(), record.location_id.clone());
        alert.action_required = true;
        alert.recommended_action = Some("Reorder product".to_string());
        self.alerts.create(alert)
    }

    fn require_product(&self, id: &RecordId) -> StockroomResult<Product> {
        self.products
            .find_by_id(id)?
            .ok_or_else(|| not_found("Product", id))
    }

    fn require_location(&self, id: &RecordId) -> StockroomResult<Location> {
        self.locations
            .find_by_id(id)?
            .ok_or_else(|| not_found("Location", id))
    }

    fn products_by_id(&self) -> StockroomResult<HashMap<RecordId, Product>> {
        Ok(self
            .products
            .find(&doc! {})?
            .into_iter()
            .filter_map(|p| p.id.clone().map(|id| (id, p)))
            .collect())
    }

    fn locations_by_id(&self) -> StockroomResult<HashMap<RecordId, Location>> {
        Ok(self
            .locations
            .find(&doc! {})?
            .into_iter()
            .filter_map(|l| l.id.clone().map(|id| (id, l)))
            .collect())
    }
}

fn reference_filter(
    product_id: Option<&RecordId>,
    location_id: Option<&RecordId>,
) -> StockroomResult<Document> {
    let mut filter = doc! {};
    if let Some(product_id) = product_id {
        filter.put("productId", product_id)?;
    }
    if let Some(location_id) = location_id {
        filter.put("locationId", location_id)?;
    }
    Ok(filter)
}

fn insufficient_stock(product_id: &RecordId, location_id: &RecordId) -> StockroomError {
    log::error!("Insufficient stock of {} at {}", product_id, location_id);
    StockroomError::new(
        &format!("Insufficient stock of {} at {}", product_id, location_id),
        ErrorKind::InsufficientStock,
    )
}
