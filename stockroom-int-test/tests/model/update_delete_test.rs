use stockroom::collection::RecordId;
use stockroom::common::Value;
use stockroom::doc;
use stockroom_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_find_by_id_and_update_patches_shallowly() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            let stored = products.create(doc! { sku: "A-1", pricing: { cost: 1, sell: 2 } })?;
            let id = stored.id().unwrap();

            let updated = products
                .find_by_id_and_update(&id, &doc! { pricing: { cost: 3 } })?
                .unwrap();
            assert_eq!(updated.get("pricing.cost"), Some(&Value::from(3)));
            assert!(updated.get("pricing.sell").is_none());
            assert_eq!(updated.get("sku"), Some(&Value::from("A-1")));
            assert_eq!(updated.id(), Some(id.clone()));

            assert!(products
                .find_by_id_and_update(&RecordId::new(), &doc! { sku: "x" })?
                .is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_by_id_and_modify() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            let id = products.create(doc! { sku: "A-1", stock: 5 })?.id().unwrap();

            let updated = products
                .find_by_id_and_modify(&id, |record| {
                    let stock = record.get("stock").and_then(Value::as_i64).unwrap_or(0);
                    record.put("stock", stock + 10)
                })?
                .unwrap();
            assert_eq!(updated.get("stock"), Some(&Value::from(15)));
            assert_eq!(products.find_by_id(&id)?, Some(updated));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many_and_one() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_test_docs() {
                products.create(record)?;
            }

            let result = products.update_many(&doc! { category: "tools" }, &doc! { onSale: true })?;
            assert_eq!(result.count(), 2);
            assert_eq!(products.count_documents(&doc! { onSale: true })?, 2);

            let first = products
                .update_one(&doc! { onSale: true }, &doc! { featured: true })?
                .unwrap();
            assert_eq!(first.get("sku"), Some(&Value::from("A-1")));
            assert_eq!(products.count_documents(&doc! { featured: true })?, 1);

            let none = products.update_many(&doc! { category: "garden" }, &doc! { onSale: true })?;
            assert!(none.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_deletes() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            let mut ids = Vec::new();
            for record in create_test_docs() {
                ids.push(products.create(record)?.id().unwrap());
            }

            assert!(products.find_by_id_and_delete(&ids[2])?);
            assert!(!products.find_by_id_and_delete(&ids[2])?);

            assert!(products.delete_one(&doc! { category: "tools" })?);
            assert!(products.find_by_id(&ids[0])?.is_none());

            let result = products.delete_many(&doc! {})?;
            assert_eq!(result.affected_record_ids(), &[ids[1].clone()]);
            assert_eq!(products.count_documents(&doc! {})?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_keeps_given_id() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            let stored = products.insert(doc! { _id: "sku-a1", sku: "A-1" })?;
            assert_eq!(stored.id(), Some(RecordId::parse("sku-a1")?));

            let err = products.insert(doc! { _id: "sku-a1", sku: "dup" }).unwrap_err();
            assert_eq!(
                err.kind(),
                &stockroom::errors::ErrorKind::UniqueConstraintViolation
            );
            Ok(())
        },
        cleanup,
    )
}
