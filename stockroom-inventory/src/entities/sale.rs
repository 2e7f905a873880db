use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

use crate::timestamp;

/// One sale of a product. The calendar fields are derived from `sale_date`
/// so sales can be grouped without date arithmetic.
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "sales")]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub product_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<RecordId>,
    pub quantity_sold: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    #[serde(with = "timestamp")]
    pub sale_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_channel: Option<String>,
    pub year: i32,
    /// 1 to 12.
    pub month: u32,
    pub day: u32,
    /// 0 is Sunday.
    pub day_of_week: u32,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sale {
    pub fn new(
        product_id: RecordId,
        quantity_sold: i64,
        unit_price: f64,
        sale_date: DateTime<Utc>,
    ) -> Self {
        let mut sale = Sale {
            id: None,
            product_id,
            location_id: None,
            quantity_sold,
            unit_price,
            total_amount: quantity_sold as f64 * unit_price,
            sale_date,
            customer_id: None,
            sales_channel: None,
            year: 0,
            month: 0,
            day: 0,
            day_of_week: 0,
            created_at: None,
        };
        sale.derive_calendar();
        sale
    }

    pub fn at_location(mut self, location_id: RecordId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub(crate) fn derive_calendar(&mut self) {
        self.year = self.sale_date.year();
        self.month = self.sale_date.month();
        self.day = self.sale_date.day();
        self.day_of_week = self.sale_date.weekday().num_days_from_sunday();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn calendar_fields_follow_sale_date() {
        // a Sunday
        let date = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let sale = Sale::new(RecordId::new(), 3, 2.5, date);
        assert_eq!(sale.total_amount, 7.5);
        assert_eq!((sale.year, sale.month, sale.day), (2024, 3, 10));
        assert_eq!(sale.day_of_week, 0);
    }
}
