use stockroom::common::Value;
use stockroom::doc;
use stockroom::errors::ErrorKind;
use stockroom::filter::{field, QueryPolicy};
use stockroom::stockroom::Stockroom;
use stockroom_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_create_assigns_ids_and_keeps_order() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_test_docs() {
                let stored = products.create(record)?;
                assert!(stored.id().is_some());
            }

            let all = products.find(&doc! {})?;
            let skus: Vec<_> = all
                .iter()
                .filter_map(|r| r.get("sku").and_then(Value::as_str))
                .collect();
            assert_eq!(skus, vec!["A-1", "A-2", "B-1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_test_docs() {
                products.create(record)?;
            }

            assert_eq!(products.find(&doc! { category: "tools" })?.len(), 2);
            assert_eq!(products.find(&doc! { price: { "$gte": 10 } })?.len(), 2);
            assert_eq!(products.find(&doc! { price: { "$lt": 10 } })?.len(), 1);
            assert_eq!(
                products
                    .find(&doc! { category: "tools", stock: { "$gt": 0 } })?
                    .len(),
                1
            );
            assert_eq!(products.find(&doc! { supplier: { "$exists": true } })?.len(), 1);
            assert_eq!(products.find(&doc! { "supplier.name": "Acme" })?.len(), 1);
            assert_eq!(products.find(&doc! { category: "garden" })?.len(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_fluent_filters_match_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_test_docs() {
                products.create(record)?;
            }

            let fluent =
                products.find_by(&field("category").eq("tools").and(field("stock").lte(0)))?;
            let written = products.find(&doc! { category: "tools", stock: { "$lte": 0 } })?;
            assert_eq!(fluent, written);
            assert_eq!(fluent.len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_count() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_test_docs() {
                products.create(record)?;
            }

            let first = products.find_one(&doc! { category: "tools" })?.unwrap();
            assert_eq!(first.get("sku"), Some(&Value::from("A-1")));
            assert!(products.find_one(&doc! { category: "garden" })?.is_none());

            let id = first.id().unwrap();
            assert_eq!(products.find_by_id(&id)?, Some(first));
            assert_eq!(products.count_documents(&doc! {})?, 3);
            assert_eq!(products.count_documents(&doc! { category: "paint" })?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_missing_collection_reads_empty() {
    run_test(
        create_test_context,
        |ctx| {
            let ghosts = ctx.db().model("ghosts")?;
            assert!(ghosts.find(&doc! {})?.is_empty());
            assert_eq!(ghosts.count_documents(&doc! {})?, 0);
            assert!(!ctx.db().has_collection("ghosts")?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_collection_name() {
    run_test(
        create_test_context,
        |ctx| {
            let err = ctx.db().model("../etc").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unknown_operator_depends_on_policy() {
    let lenient = Stockroom::builder().open().unwrap();
    let products = lenient.model("products").unwrap();
    for record in create_test_docs() {
        products.create(record).unwrap();
    }
    let found = products.find(&doc! { price: { "$regex": "x" } }).unwrap();
    assert_eq!(found.len(), 3);

    let strict = Stockroom::builder()
        .query_policy(QueryPolicy::Strict)
        .open()
        .unwrap();
    let err = strict
        .model("products")
        .unwrap()
        .find(&doc! { price: { "$regex": "x" } })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::FilterError);
}
