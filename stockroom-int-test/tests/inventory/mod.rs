mod analytics_test;
mod stock_flow_test;

use stockroom::collection::RecordId;
use stockroom::errors::StockroomResult;
use stockroom_inventory::entities::{Location, LocationType, Product, SupplierTerms};
use stockroom_inventory::Warehouse;

pub struct Seeded {
    pub warehouse: Warehouse,
    pub bolt: RecordId,
    pub main: RecordId,
    pub shop: RecordId,
}

pub fn seed(warehouse: Warehouse) -> StockroomResult<Seeded> {
    let bolt = warehouse.catalog().create_product(
        Product::new("Bolt", "B-1", "hardware")
            .with_pricing(2.0, 5.0)
            .with_supplier(SupplierTerms {
                supplier_id: None,
                supplier_name: "Acme".into(),
                lead_time_days: 3,
                minimum_order_quantity: 10,
            }),
        None,
    )?;
    let main = warehouse
        .locations()
        .create(Location::new("Main", "WH1", LocationType::Warehouse))?;
    let shop = warehouse
        .locations()
        .create(Location::new("Shop", "ST1", LocationType::Store))?;

    Ok(Seeded {
        bolt: bolt.id.unwrap(),
        main: main.id.unwrap(),
        shop: shop.id.unwrap(),
        warehouse,
    })
}
