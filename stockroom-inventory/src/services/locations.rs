use stockroom::collection::RecordId;
use stockroom::doc;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::require_text;
use crate::entities::{Address, Location, LocationType};
use crate::timestamp;

#[derive(Debug, Clone, Default)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub location_type: Option<LocationType>,
    pub address: Option<Address>,
    pub manager_id: Option<RecordId>,
}

#[derive(Clone)]
pub struct LocationService {
    locations: Repository<Location>,
}

impl LocationService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(LocationService {
            locations: db.repository()?,
        })
    }

    /// Stores a location; its code must not be in use.
    pub fn create(&self, mut location: Location) -> StockroomResult<Location> {
        require_text("name", &location.name)?;
        require_text("code", &location.code)?;
        if self.find_by_code(&location.code)?.is_some() {
            log::error!("Location code {} is already in use", location.code);
            return Err(StockroomError::new(
                &format!("Location code {} is already in use", location.code),
                ErrorKind::UniqueConstraintViolation,
            ));
        }

        let now = timestamp::now();
        location.id = None;
        location.created_at = Some(now);
        location.updated_at = Some(now);
        self.locations.create(&location)
    }

    pub fn get(&self, id: &RecordId) -> StockroomResult<Option<Location>> {
        self.locations.find_by_id(id)
    }

    pub fn find_by_code(&self, code: &str) -> StockroomResult<Option<Location>> {
        self.locations.find_one(&doc! { code: code })
    }

    /// Active locations by name.
    pub fn list_active(&self) -> StockroomResult<Vec<Location>> {
        let mut locations = self.locations.find(&doc! { isActive: true })?;
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    pub fn update(
        &self,
        id: &RecordId,
        update: LocationUpdate,
    ) -> StockroomResult<Option<Location>> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        self.locations.find_by_id_and_modify(id, |location| {
            if let Some(name) = update.name {
                location.name = name;
            }
            if let Some(location_type) = update.location_type {
                location.location_type = location_type;
            }
            if update.address.is_some() {
                location.address = update.address;
            }
            if update.manager_id.is_some() {
                location.manager_id = update.manager_id;
            }
            location.updated_at = Some(timestamp::now());
            Ok(())
        })
    }

    pub fn deactivate(&self, id: &RecordId) -> StockroomResult<bool> {
        let patch = doc! { isActive: false, updatedAt: (timestamp::now()) };
        Ok(self.locations.find_by_id_and_update(id, &patch)?.is_some())
    }
}
