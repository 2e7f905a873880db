use super::{Shipment, Vendor};
use stockroom::common::Value;
use stockroom::doc;
use stockroom::errors::ErrorKind;
use stockroom::filter::field;
use stockroom::model::{from_document, to_document, Entity, Repository};
use stockroom_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_derived_entity_metadata() {
    assert_eq!(Vendor::COLLECTION, "suppliers");
    assert_eq!(Shipment::COLLECTION, "shipments");

    let mut vendor = Vendor::new("Acme", 3);
    assert!(vendor.entity_id().is_none());
    let id = stockroom::collection::RecordId::new();
    vendor.set_entity_id(id.clone());
    assert_eq!(vendor.id, Some(id));
}

#[test]
fn test_entity_document_mapping() {
    let vendor = Vendor::new("Acme", 3);
    let document = to_document(&vendor).unwrap();
    assert_eq!(document.get("leadTimeDays"), Some(&Value::from(3)));
    assert!(document.get("_id").is_none());

    let back: Vendor = from_document(document).unwrap();
    assert_eq!(back, vendor);

    let err = from_document::<Vendor>(doc! { name: 5 }).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
}

#[test]
fn test_repository_crud() {
    run_test(
        create_test_context,
        |ctx| {
            let vendors: Repository<Vendor> = ctx.db().repository()?;
            let acme = vendors.create(&Vendor::new("Acme", 3))?;
            let globex = vendors.create(&Vendor::new("Globex", 10))?;
            let acme_id = acme.id.clone().unwrap();

            assert_eq!(vendors.find_by_id(&acme_id)?, Some(acme.clone()));
            assert_eq!(vendors.find_by(&field("leadTimeDays").gt(5))?, vec![globex]);
            assert_eq!(vendors.count_documents(&doc! {})?, 2);

            let rated = vendors
                .find_by_id_and_modify(&acme_id, |vendor| {
                    vendor.rating = Some(4.5);
                    Ok(())
                })?
                .unwrap();
            assert_eq!(rated.rating, Some(4.5));

            let renamed = vendors
                .find_by_id_and_update(&acme_id, &doc! { name: "Acme Corp" })?
                .unwrap();
            assert_eq!(renamed.name, "Acme Corp");
            assert_eq!(renamed.rating, Some(4.5));

            assert!(vendors.find_by_id_and_delete(&acme_id)?);
            assert!(vendors.find_by_id(&acme_id)?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_replaces_whole_entity() {
    run_test(
        create_test_context,
        |ctx| {
            let vendors: Repository<Vendor> = ctx.db().repository()?;
            let mut acme = vendors.create(&Vendor::new("Acme", 3))?;
            acme.lead_time_days = 7;
            acme.rating = Some(3.0);
            let saved = vendors.save(&acme)?;
            assert_eq!(saved, acme);
            assert_eq!(vendors.find(&doc! {})?, vec![acme]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_id_field_and_populate() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let vendors: Repository<Vendor> = db.repository()?;
            let shipments: Repository<Shipment> = db.repository()?;

            let acme = vendors.create(&Vendor::new("Acme", 3))?;
            let shipment = shipments.create(&Shipment {
                shipment_id: None,
                vendor: acme.id.clone().unwrap(),
                units: 12,
            })?;
            assert!(shipment.shipment_id.is_some());

            let populated = shipments.populate(&shipment, "suppliers.vendor")?;
            assert_eq!(populated.get("vendor.name"), Some(&Value::from("Acme")));
            assert_eq!(populated.get("units"), Some(&Value::from(12)));
            Ok(())
        },
        cleanup,
    )
}
