use stockroom::errors::StockroomResult;
use stockroom::stockroom::Stockroom;

use crate::services::{
    AlertService, AnalyticsService, CatalogService, LocationService, StockService,
    SupplierService, UserService,
};

/// Every inventory service over one database.
///
/// Cloning is cheap; clones share the database and the stock ledger lock.
#[derive(Clone)]
pub struct Warehouse {
    db: Stockroom,
    catalog: CatalogService,
    locations: LocationService,
    stock: StockService,
    alerts: AlertService,
    analytics: AnalyticsService,
    suppliers: SupplierService,
    users: UserService,
}

impl Warehouse {
    pub fn open(db: &Stockroom) -> StockroomResult<Self> {
        let warehouse = Warehouse {
            db: db.clone(),
            catalog: CatalogService::new(db)?,
            locations: LocationService::new(db)?,
            stock: StockService::new(db)?,
            alerts: AlertService::new(db)?,
            analytics: AnalyticsService::new(db)?,
            suppliers: SupplierService::new(db)?,
            users: UserService::new(db)?,
        };
        log::debug!("Opened warehouse services");
        Ok(warehouse)
    }

    pub fn database(&self) -> &Stockroom {
        &self.db
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn locations(&self) -> &LocationService {
        &self.locations
    }

    pub fn stock(&self) -> &StockService {
        &self.stock
    }

    pub fn alerts(&self) -> &AlertService {
        &self.alerts
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    pub fn suppliers(&self) -> &SupplierService {
        &self.suppliers
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }
}
