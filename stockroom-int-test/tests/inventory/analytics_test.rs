use super::seed;
use chrono::{TimeZone, Utc};
use stockroom_int_test::test_util::{cleanup, create_test_context, run_test};
use stockroom_inventory::entities::{Role, Sale};
use stockroom_inventory::services::{AbcClass, Adjustment, FixedRates, RateCache, ReportKind};
use stockroom_inventory::Warehouse;

#[test]
fn test_sales_analytics_over_store() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let analytics = s.warehouse.analytics();
            s.warehouse
                .stock()
                .adjust(Adjustment::new(s.bolt.clone(), s.main.clone(), 50))?;

            let day = |d: u32| Utc.with_ymd_and_hms(2024, 5, d, 9, 30, 0).unwrap();
            for (d, quantity) in [(1, 4), (2, 6), (20, 5)] {
                analytics.record_sale(
                    Sale::new(s.bolt.clone(), quantity, 5.0, day(d)).at_location(s.shop.clone()),
                )?;
            }
            let as_of = day(25);

            let dashboard = analytics.dashboard(as_of)?;
            assert_eq!(dashboard.total_products, 1);
            assert_eq!(dashboard.total_inventory_value, 100.0);
            assert_eq!(dashboard.recent_sales.count, 3);
            assert_eq!(dashboard.recent_sales.total_value, 75.0);

            let forecast = analytics.forecast(&s.bolt, 10, as_of)?.unwrap();
            assert_eq!(forecast.average_daily_sales, 5.0);
            assert_eq!(forecast.points.len(), 7);

            let trends = analytics.trends(as_of)?;
            assert_eq!(trends.sales.len(), 1);
            assert_eq!((trends.sales[0].year, trends.sales[0].month), (2024, 5));
            assert_eq!(trends.sales[0].total_quantity, 15);

            let abc = analytics.abc_analysis()?;
            assert_eq!(abc.len(), 1);
            assert_eq!(abc[0].class, AbcClass::C);
            assert_eq!(abc[0].cumulative_percentage, 100.0);

            let report = analytics.custom_report(ReportKind::Sales, day(1), day(2))?;
            assert_eq!(report.data.len(), 2);

            let patterns = analytics.seasonal_patterns()?;
            assert_eq!(patterns.by_month.get(&5).map(|p| p.count), Some(3));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_users_over_store() {
    run_test(
        create_test_context,
        |ctx| {
            let warehouse = Warehouse::open(&ctx.db())?;
            let users = warehouse.users();
            users.register("ana", "ana@example.com", "s3cret-pass", Role::Admin)?;

            let user = users.authenticate("ana", "s3cret-pass")?;
            assert_eq!(user.role, Role::Admin);
            assert!(user.last_login.is_some());
            assert!(users.authenticate("ana", "nope-nope").is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_prices_convert_through_rate_cache() {
    run_test(
        create_test_context,
        |ctx| {
            let s = seed(Warehouse::open(&ctx.db())?)?;
            let product = s.warehouse.catalog().get_product(&s.bolt)?.unwrap();
            let rates = RateCache::new(FixedRates::new().with_rate("USD", "EUR", 0.9));

            let price = product.pricing.selling_price;
            let euros = rates.convert(price, &product.pricing.currency, "EUR")?;
            assert!((euros - 4.5).abs() < 1e-9);
            assert!(rates.rate("EUR", "USD")?.cached);
            Ok(())
        },
        cleanup,
    )
}
