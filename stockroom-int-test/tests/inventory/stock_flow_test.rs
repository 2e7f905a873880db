use super::seed;
use stockroom::common::Value;
use stockroom::errors::ErrorKind;
use stockroom::stockroom::Stockroom;
use stockroom_fjall_adapter::FjallModule;
use stockroom_int_test::test_util::{cleanup, create_test_context, random_path, run_test};
use stockroom_inventory::entities::{AlertType, MovementType, Severity};
use stockroom_inventory::services::{Adjustment, AlertQuery, MovementQuery, Transfer};
use stockroom_inventory::Warehouse;
use std::thread;

#[test]
fn test_receive_transfer_and_value_stock() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let stock = s.warehouse.stock();

            stock.adjust(
                Adjustment::new(s.bolt.clone(), s.main.clone(), 100)
                    .with_reason("Initial count")
                    .with_unit_cost(2.0),
            )?;
            let outcome = stock.transfer(Transfer::new(
                s.bolt.clone(),
                s.main.clone(),
                s.shop.clone(),
                30,
            ))?;
            assert_eq!(outcome.from.current_stock, 70);
            assert_eq!(outcome.to.current_stock, 30);

            let movements = stock.movements(&MovementQuery::default())?;
            assert_eq!(movements.len(), 3);
            let transfers: Vec<_> = movements
                .iter()
                .filter(|entry| entry.movement.movement_id.starts_with("TRF-"))
                .collect();
            assert_eq!(transfers.len(), 2);

            let outgoing = stock.movements(&MovementQuery {
                movement_type: Some(MovementType::Out),
                ..Default::default()
            })?;
            assert_eq!(outgoing.len(), 1);
            assert!(outgoing[0].movement.movement_id.ends_with("-OUT"));
            let incoming = stock.movements(&MovementQuery {
                movement_type: Some(MovementType::In),
                location_id: Some(s.shop.clone()),
                ..Default::default()
            })?;
            assert_eq!(incoming.len(), 1);
            assert!(incoming[0].movement.movement_id.ends_with("-IN"));

            let valuation = stock.valuation()?;
            assert_eq!(valuation.total_value, 200.0);
            assert_eq!(valuation.items, 2);
            assert_eq!(valuation.by_location.get("Shop"), Some(&60.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insufficient_stock_leaves_records_untouched() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let stock = s.warehouse.stock();
            stock.adjust(Adjustment::new(s.bolt.clone(), s.main.clone(), 5))?;

            let err = stock
                .transfer(Transfer::new(s.bolt.clone(), s.main.clone(), s.shop.clone(), 6))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InsufficientStock);
            assert_eq!(stock.get(&s.bolt, &s.main)?.map(|r| r.current_stock), Some(5));
            assert!(stock.get(&s.bolt, &s.shop)?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_low_stock_alert_and_reorder() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let stock = s.warehouse.stock();
            stock.set_levels(&s.bolt, &s.main, 20, 200)?;
            stock.adjust(Adjustment::new(s.bolt.clone(), s.main.clone(), 8))?;

            let alerts = s.warehouse.alerts().list(&AlertQuery::default())?;
            assert_eq!(alerts.total, 1);
            let alert = &alerts.items[0];
            assert_eq!(alert.alert_type, AlertType::LowStock);
            assert_eq!(alert.severity, Severity::High);
            assert_eq!(alert.title, "Low Stock Alert: Bolt");

            let low = s.warehouse.catalog().low_stock()?;
            assert_eq!(low.len(), 1);
            assert_eq!(low[0].get("locationId.code"), Some(&Value::from("WH1")));

            let recommendations = stock.reorder_recommendations()?;
            assert_eq!(recommendations.len(), 1);
            assert_eq!(recommendations[0].recommended_quantity, 22);
            assert_eq!(recommendations[0].estimated_cost, 44.0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_adjustments_are_not_lost() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let stock = s.warehouse.stock().clone();
                    let (bolt, main) = (s.bolt.clone(), s.main.clone());
                    thread::spawn(move || {
                        for _ in 0..10 {
                            stock
                                .adjust(Adjustment::new(bolt.clone(), main.clone(), 1))
                                .unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let record = s.warehouse.stock().get(&s.bolt, &s.main)?.unwrap();
            assert_eq!(record.current_stock, 40);
            assert_eq!(record.movements.len(), 40);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_stock_survives_reopen() {
    let path = random_path();
    let open = || {
        Stockroom::builder()
            .load_module(FjallModule::with_config().db_path(&path).build())
            .open()
            .unwrap()
    };

    let db = open();
    let s = seed(Warehouse::open(&db).unwrap()).unwrap();
    s.warehouse
        .stock()
        .adjust(Adjustment::new(s.bolt.clone(), s.main.clone(), 12))
        .unwrap();
    let (bolt, main) = (s.bolt.clone(), s.main.clone());
    db.close().unwrap();
    drop(s);
    drop(db);

    let db = open();
    let warehouse = Warehouse::open(&db).unwrap();
    let record = warehouse.stock().get(&bolt, &main).unwrap().unwrap();
    assert_eq!(record.current_stock, 12);
    assert_eq!(
        warehouse.locations().find_by_code("WH1").unwrap().and_then(|l| l.id),
        Some(main)
    );
    db.close().unwrap();
    let _ = std::fs::remove_dir_all(&path);
}
