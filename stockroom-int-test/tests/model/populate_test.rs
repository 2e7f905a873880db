use stockroom::common::Value;
use stockroom::doc;
use stockroom::errors::ErrorKind;
use stockroom_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_populate_resolves_reference() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let products = db.model("products")?;
            let inventories = db.model("inventories")?;

            let bolt = products.create(doc! { sku: "B-1", name: "Bolt" })?;
            let bolt_id = bolt.id().unwrap();
            let record =
                inventories.create(doc! { productId: (bolt_id.as_str()), currentStock: 5 })?;

            let populated = inventories.populate(record, "products.productId")?;
            assert_eq!(populated.get("productId.sku"), Some(&Value::from("B-1")));
            assert_eq!(populated.get("currentStock"), Some(&Value::from(5)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_populate_leaves_dangling_reference() {
    run_test(
        create_test_context,
        |ctx| {
            let inventories = ctx.db().model("inventories")?;
            inventories.create(doc! { productId: "missing", currentStock: 1 })?;
            inventories.create(doc! { currentStock: 2 })?;

            let populated =
                inventories.populate_all(inventories.find(&doc! {})?, "products.productId")?;
            assert_eq!(populated[0].get("productId"), Some(&Value::from("missing")));
            assert!(populated[1].get("productId").is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_populate_rejects_malformed_path() {
    run_test(
        create_test_context,
        |ctx| {
            let inventories = ctx.db().model("inventories")?;
            let err = inventories
                .populate_all(Vec::new(), "productId")
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
            Ok(())
        },
        cleanup,
    )
}
