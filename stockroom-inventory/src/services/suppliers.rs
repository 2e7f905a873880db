use std::sync::LazyLock;

use regex::Regex;
use stockroom::collection::RecordId;
use stockroom::doc;
use stockroom::errors::StockroomResult;
use stockroom::filter::field;
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::{require_text, validation_error};
use crate::entities::{Address, Product, Supplier};
use crate::timestamp;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

#[derive(Debug, Clone, Default)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub payment_terms: Option<String>,
    pub lead_time_days: Option<i64>,
    pub rating: Option<f64>,
}

#[derive(Clone)]
pub struct SupplierService {
    suppliers: Repository<Supplier>,
    products: Repository<Product>,
}

impl SupplierService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(SupplierService {
            suppliers: db.repository()?,
            products: db.repository()?,
        })
    }

    pub fn create(&self, mut supplier: Supplier) -> StockroomResult<Supplier> {
        require_text("name", &supplier.name)?;
        validate_contact(supplier.email.as_deref(), supplier.rating, supplier.lead_time_days)?;

        let now = timestamp::now();
        supplier.id = None;
        supplier.created_at = Some(now);
        supplier.updated_at = Some(now);
        self.suppliers.create(&supplier)
    }

    pub fn get(&self, id: &RecordId) -> StockroomResult<Option<Supplier>> {
        self.suppliers.find_by_id(id)
    }

    /// Suppliers by name, optionally only the active ones.
    pub fn list(&self, active_only: bool) -> StockroomResult<Vec<Supplier>> {
        let filter = if active_only {
            doc! { isActive: true }
        } else {
            doc! {}
        };
        let mut suppliers = self.suppliers.find(&filter)?;
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    pub fn update(
        &self,
        id: &RecordId,
        update: SupplierUpdate,
    ) -> StockroomResult<Option<Supplier>> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        validate_contact(
            update.email.as_deref(),
            update.rating,
            update.lead_time_days.unwrap_or(0),
        )?;

        self.suppliers.find_by_id_and_modify(id, |supplier| {
            let SupplierUpdate {
                name,
                contact_person,
                email,
                phone,
                address,
                payment_terms,
                lead_time_days,
                rating,
            } = update;

            if let Some(name) = name {
                supplier.name = name;
            }
            if contact_person.is_some() {
                supplier.contact_person = contact_person;
            }
            if email.is_some() {
                supplier.email = email;
            }
            if phone.is_some() {
                supplier.phone = phone;
            }
            if address.is_some() {
                supplier.address = address;
            }
            if payment_terms.is_some() {
                supplier.payment_terms = payment_terms;
            }
            if let Some(days) = lead_time_days {
                supplier.lead_time_days = days;
            }
            if rating.is_some() {
                supplier.rating = rating;
            }
            supplier.updated_at = Some(timestamp::now());
            Ok(())
        })
    }

    pub fn deactivate(&self, id: &RecordId) -> StockroomResult<bool> {
        let patch = doc! { isActive: false, updatedAt: (timestamp::now()) };
        Ok(self.suppliers.find_by_id_and_update(id, &patch)?.is_some())
    }

    /// Products whose supply terms name this supplier.
    pub fn products(&self, id: &RecordId) -> StockroomResult<Vec<Product>> {
        self.products.find_by(&field("supplier.supplierId").eq(id))
    }
}

fn validate_contact(
    email: Option<&str>,
    rating: Option<f64>,
    lead_time_days: i64,
) -> StockroomResult<()> {
    if let Some(email) = email {
        if !is_valid_email(email) {
            return Err(validation_error(&format!("Invalid email {}", email)));
        }
    }
    if let Some(rating) = rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(validation_error(&format!(
                "Rating {} is outside 0 to 5",
                rating
            )));
        }
    }
    if lead_time_days < 0 {
        return Err(validation_error("Lead time cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SupplierTerms;
    use stockroom::errors::ErrorKind;

    fn set_up() -> (Stockroom, SupplierService) {
        let db = Stockroom::builder().open().unwrap();
        let suppliers = SupplierService::new(&db).unwrap();
        (db, suppliers)
    }

    #[test]
    fn email_check() {
        assert!(is_valid_email("orders@acme.example"));
        assert!(!is_valid_email("orders@acme"));
        assert!(!is_valid_email("two words@acme.example"));
    }

    #[test]
    fn create_validates() {
        let (_db, suppliers) = set_up();
        let mut bad_rating = Supplier::new("Acme");
        bad_rating.rating = Some(7.0);
        assert_eq!(
            suppliers.create(bad_rating).unwrap_err().kind(),
            &ErrorKind::ValidationError
        );

        let mut bad_email = Supplier::new("Acme");
        bad_email.email = Some("nope".into());
        assert_eq!(
            suppliers.create(bad_email).unwrap_err().kind(),
            &ErrorKind::ValidationError
        );

        let mut good = Supplier::new("Acme");
        good.rating = Some(4.5);
        good.email = Some("orders@acme.example".into());
        let stored = suppliers.create(good).unwrap();
        assert!(stored.id.is_some());
        assert_eq!(suppliers.get(stored.id.as_ref().unwrap()).unwrap(), Some(stored));
    }

    #[test]
    fn list_and_deactivate() {
        let (_db, suppliers) = set_up();
        let zed = suppliers.create(Supplier::new("Zed")).unwrap();
        suppliers.create(Supplier::new("Acme")).unwrap();
        suppliers.deactivate(zed.id.as_ref().unwrap()).unwrap();

        assert_eq!(suppliers.list(true).unwrap().len(), 1);
        let all: Vec<_> = suppliers.list(false).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(all, vec!["Acme", "Zed"]);
    }

    #[test]
    fn update_and_products() {
        let (db, suppliers) = set_up();
        let acme = suppliers.create(Supplier::new("Acme")).unwrap();
        let id = acme.id.clone().unwrap();

        let update = SupplierUpdate {
            lead_time_days: Some(4),
            payment_terms: Some("net 30".into()),
            ..Default::default()
        };
        let updated = suppliers.update(&id, update).unwrap().unwrap();
        assert_eq!(updated.lead_time_days, 4);
        assert_eq!(updated.payment_terms.as_deref(), Some("net 30"));

        let products = db.repository::<Product>().unwrap();
        let terms = SupplierTerms {
            supplier_id: Some(id.clone()),
            supplier_name: "Acme".into(),
            lead_time_days: 4,
            minimum_order_quantity: 10,
        };
        products
            .create(&Product::new("Bolt", "B-1", "hardware").with_supplier(terms))
            .unwrap();
        products
            .create(&Product::new("Nut", "N-1", "hardware"))
            .unwrap();

        let supplied = suppliers.products(&id).unwrap();
        assert_eq!(supplied.len(), 1);
        assert_eq!(supplied[0].sku, "B-1");
    }
}
