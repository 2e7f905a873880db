use stockroom::aggregate::{Accumulator, GroupStage, Pipeline, SortStage, SumOperand};
use stockroom::common::{SortOrder, Value};
use stockroom::doc;
use stockroom::errors::ErrorKind;
use stockroom::filter::{field, QueryPolicy};
use stockroom::model::Model;
use stockroom::stockroom::Stockroom;
use stockroom_int_test::test_util::{
    cleanup, create_fake_products, create_test_context, run_test,
};

fn seed_sales(sales: &Model) -> stockroom::errors::StockroomResult<()> {
    for (product, year, month, total, quantity) in [
        ("P1", 2024, 1, 100.0, 1),
        ("P2", 2024, 1, 50.0, 2),
        ("P1", 2024, 2, 200.0, 3),
        ("P3", 2023, 12, 25.5, 1),
    ] {
        sales.create(doc! {
            productId: product,
            year: year,
            month: month,
            totalAmount: total,
            quantitySold: quantity,
        })?;
    }
    Ok(())
}

#[test]
fn test_group_sum_and_sort() {
    run_test(
        create_test_context,
        |ctx| {
            let sales = ctx.db().model("sales")?;
            seed_sales(&sales)?;

            let result = sales.aggregate(&[
                doc! { "$group": { _id: "productId", totalSales: { "$sum": "totalAmount" }, orders: { "$sum": 1 } } },
                doc! { "$sort": { totalSales: (-1) } },
            ])?;
            assert_eq!(result.len(), 3);
            assert_eq!(result[0].get("_id"), Some(&Value::from("P1")));
            assert_eq!(result[0].get("totalSales"), Some(&Value::from(300)));
            assert_eq!(result[0].get("orders"), Some(&Value::from(2)));
            assert_eq!(result[2].get("totalSales"), Some(&Value::from(25.5)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_match_then_composite_group() {
    run_test(
        create_test_context,
        |ctx| {
            let sales = ctx.db().model("sales")?;
            seed_sales(&sales)?;

            let result = sales.aggregate(&[
                doc! { "$match": { year: 2024 } },
                doc! { "$group": { _id: { year: "$year", month: "$month" }, revenue: { "$sum": "totalAmount" } } },
                doc! { "$sort": { revenue: 1 } },
            ])?;
            assert_eq!(result.len(), 2);
            assert_eq!(result[0].get("_id"), Some(&Value::from("year:2024_month:1")));
            assert_eq!(result[0].get("revenue"), Some(&Value::from(150)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_avg_and_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let sales = ctx.db().model("sales")?;
            seed_sales(&sales)?;

            let result = sales.aggregate(&[
                doc! { "$group": { _id: (), avgQuantity: { "$avg": "quantitySold" }, n: { "$count": {} } } },
            ])?;
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].get("avgQuantity"), Some(&Value::from(1.75)));
            assert_eq!(result[0].get("n"), Some(&Value::from(4)));

            let limited = sales.aggregate(&[doc! { "$limit": 2 }])?;
            assert_eq!(limited.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_built_pipeline_matches_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let sales = ctx.db().model("sales")?;
            seed_sales(&sales)?;

            let pipeline = Pipeline::new()
                .match_filter(field("year").eq(2024))
                .group(
                    GroupStage::by_field("productId").accumulate(
                        "revenue",
                        Accumulator::Sum(SumOperand::Field("totalAmount".into())),
                    ),
                )
                .sort(SortStage::new().by("revenue", SortOrder::Descending))
                .limit(1);
            let built = sales.aggregate_with(&pipeline)?;
            let written = sales.aggregate(&[
                doc! { "$match": { year: 2024 } },
                doc! { "$group": { _id: "productId", revenue: { "$sum": "totalAmount" } } },
                doc! { "$sort": { revenue: (-1) } },
                doc! { "$limit": 1 },
            ])?;
            assert_eq!(built, written);
            assert_eq!(built[0].get("_id"), Some(&Value::from("P1")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_is_stable_over_fake_data() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.db().model("products")?;
            for record in create_fake_products(50) {
                products.create(record)?;
            }

            let sorted = products.aggregate(&[doc! { "$sort": { stock: 1 } }])?;
            assert_eq!(sorted.len(), 50);
            for pair in sorted.windows(2) {
                let a = pair[0].get("stock").and_then(Value::as_i64).unwrap_or_default();
                let b = pair[1].get("stock").and_then(Value::as_i64).unwrap_or_default();
                assert!(a <= b);
                if a == b {
                    // equal keys keep insertion order
                    let sku_a = pair[0].get("sku").and_then(Value::as_str).unwrap_or_default();
                    let sku_b = pair[1].get("sku").and_then(Value::as_str).unwrap_or_default();
                    assert!(sku_a < sku_b);
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unknown_stage_depends_on_policy() {
    let lenient = Stockroom::builder().open().unwrap();
    let sales = lenient.model("sales").unwrap();
    seed_sales(&sales).unwrap();
    let passed = sales.aggregate(&[doc! { "$lookup": { from: "products" } }]).unwrap();
    assert_eq!(passed.len(), 4);

    let strict = Stockroom::builder()
        .query_policy(QueryPolicy::Strict)
        .open()
        .unwrap();
    let err = strict
        .model("sales")
        .unwrap()
        .aggregate(&[doc! { "$lookup": { from: "products" } }])
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::PipelineError);
}
