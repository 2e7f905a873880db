use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use stockroom::aggregate::{Accumulator, GroupKey, GroupStage, Pipeline, SortStage, SumOperand};
use stockroom::collection::{Document, RecordId};
use stockroom::common::{SortOrder, Value, DOC_ID};
use stockroom::doc;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::filter::field;
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::{not_found, validation_error};
use crate::entities::{InventoryRecord, Product, Sale};
use crate::timestamp;

const RECENT_SALES_DAYS: i64 = 30;
const FORECAST_DAYS: i64 = 7;
const FORECAST_CONFIDENCE: f64 = 0.85;
const TREND_MONTHS: u32 = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub count: usize,
    pub total_value: f64,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_products: usize,
    pub total_inventory_value: f64,
    pub low_stock_items: usize,
    pub recent_sales: SalesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    pub predicted_quantity: i64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub product_id: RecordId,
    /// Mean quantity per recorded sale within the lookback window.
    pub average_daily_sales: f64,
    pub points: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub total_sales: f64,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub category: String,
    pub total_stock: i64,
    pub average_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub sales: Vec<MonthlyTrend>,
    pub inventory: Vec<CategoryStock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcEntry {
    pub product_id: RecordId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub total_sales_value: f64,
    pub total_sales_quantity: i64,
    pub cumulative_percentage: f64,
    pub class: AbcClass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternTotals {
    pub total_sales: f64,
    pub total_quantity: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalPatterns {
    /// Keyed by month, 1 to 12.
    pub by_month: BTreeMap<u32, PatternTotals>,
    /// Keyed by weekday, 0 (Sunday) to 6.
    pub by_day_of_week: BTreeMap<u32, PatternTotals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Inventory,
}

impl FromStr for ReportKind {
    type Err = StockroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(ReportKind::Sales),
            "inventory" => Ok(ReportKind::Inventory),
            other => Err(validation_error(&format!("Invalid report type {}", other))),
        }
    }
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Sales => write!(f, "sales"),
            ReportKind::Inventory => write!(f, "inventory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomReport {
    pub kind: ReportKind,
    #[serde(with = "timestamp")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end: DateTime<Utc>,
    pub data: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimisationSuggestion {
    pub product_id: RecordId,
    pub product_name: String,
    pub sku: String,
    pub category: String,
    pub location_id: RecordId,
    pub supplier: String,
    pub current_stock: i64,
    pub current_reorder_point: i64,
    pub current_max_stock: i64,
    pub suggested_reorder_point: f64,
    pub suggested_max_stock: i64,
}

/// Sales recording and reporting over sales and stock.
#[derive(Clone)]
pub struct AnalyticsService {
    products: Repository<Product>,
    inventories: Repository<InventoryRecord>,
    sales: Repository<Sale>,
}

impl AnalyticsService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(AnalyticsService {
            products: db.repository()?,
            inventories: db.repository()?,
            sales: db.repository()?,
        })
    }

    /// Stores a sale of a known product, deriving its calendar fields.
    pub fn record_sale(&self, mut sale: Sale) -> StockroomResult<Sale> {
        if sale.quantity_sold <= 0 {
            return Err(validation_error("Quantity sold must be positive"));
        }
        if sale.unit_price < 0.0 || sale.total_amount < 0.0 {
            return Err(validation_error("Sale amounts cannot be negative"));
        }
        if self.products.find_by_id(&sale.product_id)?.is_none() {
            return Err(not_found("Product", &sale.product_id));
        }

        sale.id = None;
        sale.derive_calendar();
        sale.created_at = Some(timestamp::now());
        self.sales.create(&sale)
    }

    pub fn dashboard(&self, as_of: DateTime<Utc>) -> StockroomResult<DashboardMetrics> {
        let products = self.products.find(&doc! {})?;
        let costs: HashMap<RecordId, f64> = products
            .iter()
            .filter_map(|p| p.id.clone().map(|id| (id, p.cost_price())))
            .collect();
        let total_products = products.iter().filter(|p| p.is_active).count();

        let records = self.inventories.find(&doc! {})?;
        let total_inventory_value = records
            .iter()
            .map(|r| r.current_stock as f64 * costs.get(&r.product_id).copied().unwrap_or(0.0))
            .sum();
        let low_stock_items = records.iter().filter(|r| r.is_below_reorder_point()).count();

        let since = as_of - Duration::days(RECENT_SALES_DAYS);
        let recent = self.sales.find_by(&field("saleDate").gte(since))?;
        let recent_sales = SalesSummary {
            count: recent.len(),
            total_value: recent.iter().map(|s| s.total_amount).sum(),
            total_quantity: recent.iter().map(|s| s.quantity_sold).sum(),
        };

        Ok(DashboardMetrics {
            total_products,
            total_inventory_value,
            low_stock_items,
            recent_sales,
        })
    }

    /// Projects the mean sold quantity over the next days. `None` when the
    /// product has no sales within the lookback window.
    pub fn forecast(
        &self,
        product_id: &RecordId,
        lookback_days: i64,
        as_of: DateTime<Utc>,
    ) -> StockroomResult<Option<Forecast>> {
        if lookback_days <= 0 {
            return Err(validation_error("Lookback must be at least one day"));
        }
        let since = as_of - Duration::days(lookback_days);
        let history = self.sales.find_by(
            &field("productId")
                .eq(product_id)
                .and(field("saleDate").gte(since)),
        )?;
        if history.is_empty() {
            return Ok(None);
        }

        let total: i64 = history.iter().map(|s| s.quantity_sold).sum();
        let average = total as f64 / history.len() as f64;
        let points = (1..=FORECAST_DAYS)
            .map(|day| ForecastPoint {
                date: as_of + Duration::days(day),
                predicted_quantity: average.round() as i64,
                confidence: FORECAST_CONFIDENCE,
            })
            .collect();

        Ok(Some(Forecast {
            product_id: product_id.clone(),
            average_daily_sales: average,
            points,
        }))
    }

    /// Monthly sales of the last twelve months in calendar order, and stock
    /// per product category, largest first.
    pub fn trends(&self, as_of: DateTime<Utc>) -> StockroomResult<Trends> {
        let since = as_of
            .checked_sub_months(Months::new(TREND_MONTHS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let monthly = Pipeline::new()
            .match_filter(field("saleDate").gte(since))
            .group(
                GroupStage::new(GroupKey::Composite(vec![
                    ("year".into(), "year".into()),
                    ("month".into(), "month".into()),
                ]))
                // every record of a group shares these, so the mean is the value
                .accumulate("year", Accumulator::Avg("year".into()))
                .accumulate("month", Accumulator::Avg("month".into()))
                .accumulate("totalSales", sum_of("totalAmount"))
                .accumulate("totalQuantity", sum_of("quantitySold")),
            )
            .sort(
                SortStage::new()
                    .by("year", SortOrder::Ascending)
                    .by("month", SortOrder::Ascending),
            );
        let sales = self
            .sales
            .model()
            .aggregate_with(&monthly)?
            .iter()
            .map(|group| MonthlyTrend {
                year: number(group, "year") as i32,
                month: number(group, "month") as u32,
                total_sales: number(group, "totalSales"),
                total_quantity: number(group, "totalQuantity") as i64,
            })
            .collect();

        Ok(Trends {
            sales,
            inventory: self.category_stock()?,
        })
    }

    fn category_stock(&self) -> StockroomResult<Vec<CategoryStock>> {
        let categories: HashMap<RecordId, String> = self
            .products
            .find(&doc! {})?
            .into_iter()
            .filter_map(|p| p.id.map(|id| (id, p.category)))
            .collect();

        let mut rows = Vec::new();
        for record in self.inventories.find(&doc! {})? {
            if let Some(category) = categories.get(&record.product_id) {
                rows.push(doc! {
                    category: (category.as_str()),
                    currentStock: (record.current_stock),
                });
            }
        }

        let by_category = Pipeline::new()
            .group(
                GroupStage::by_field("category")
                    .accumulate("totalStock", sum_of("currentStock"))
                    .accumulate("averageStock", Accumulator::Avg("currentStock".into())),
            )
            .sort(SortStage::new().by("totalStock", SortOrder::Descending));

        Ok(by_category
            .execute(rows)?
            .iter()
            .map(|group| CategoryStock {
                category: group
                    .get(DOC_ID)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                total_stock: number(group, "totalStock") as i64,
                average_stock: number(group, "averageStock"),
            })
            .collect())
    }

    /// Ranks products by sales value. Products making up the first 80% of
    /// cumulative value are class A, up to 95% class B, the rest class C.
    pub fn abc_analysis(&self) -> StockroomResult<Vec<AbcEntry>> {
        let per_product = Pipeline::new().group(
            GroupStage::by_field("productId")
                .accumulate("totalSalesValue", sum_of("totalAmount"))
                .accumulate("totalSalesQuantity", sum_of("quantitySold")),
        );
        let totals: HashMap<String, (f64, i64)> = self
            .sales
            .model()
            .aggregate_with(&per_product)?
            .iter()
            .filter_map(|group| {
                let id = group.get(DOC_ID)?.as_str()?.to_string();
                Some((
                    id,
                    (
                        number(group, "totalSalesValue"),
                        number(group, "totalSalesQuantity") as i64,
                    ),
                ))
            })
            .collect();

        let mut entries: Vec<AbcEntry> = self
            .products
            .find(&doc! {})?
            .into_iter()
            .filter_map(|product| {
                let id = product.id?;
                let (value, quantity) = totals.get(id.as_str()).copied().unwrap_or_default();
                Some(AbcEntry {
                    product_id: id,
                    name: product.name,
                    sku: product.sku,
                    category: product.category,
                    total_sales_value: value,
                    total_sales_quantity: quantity,
                    cumulative_percentage: 0.0,
                    class: AbcClass::C,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.total_sales_value.total_cmp(&a.total_sales_value));

        let grand_total: f64 = entries.iter().map(|e| e.total_sales_value).sum();
        if grand_total <= 0.0 {
            return Ok(entries);
        }
        let mut cumulative = 0.0;
        for entry in entries.iter_mut() {
            cumulative += entry.total_sales_value;
            entry.cumulative_percentage = cumulative / grand_total * 100.0;
            entry.class = if entry.cumulative_percentage <= 80.0 {
                AbcClass::A
            } else if entry.cumulative_percentage <= 95.0 {
                AbcClass::B
            } else {
                AbcClass::C
            };
        }
        Ok(entries)
    }

    /// Sales totals by month and by weekday.
    pub fn seasonal_patterns(&self) -> StockroomResult<SeasonalPatterns> {
        let model = self.sales.model();
        let records = model.find(&doc! {})?;

        let totals = |key: &str| -> StockroomResult<BTreeMap<u32, PatternTotals>> {
            let pipeline = Pipeline::new().group(
                GroupStage::by_field(key)
                    .accumulate("totalSales", sum_of("totalAmount"))
                    .accumulate("totalQuantity", sum_of("quantitySold"))
                    .accumulate("count", Accumulator::Count),
            );
            Ok(pipeline
                .execute(records.clone())?
                .iter()
                .filter_map(|group| {
                    let bucket = group.get(DOC_ID)?.as_i64()?;
                    Some((
                        u32::try_from(bucket).ok()?,
                        PatternTotals {
                            total_sales: number(group, "totalSales"),
                            total_quantity: number(group, "totalQuantity") as i64,
                            count: number(group, "count") as u64,
                        },
                    ))
                })
                .collect())
        };

        Ok(SeasonalPatterns {
            by_month: totals("month")?,
            by_day_of_week: totals("dayOfWeek")?,
        })
    }

    /// Sales made, or stock records changed, within `[start, end]`, with
    /// their references resolved.
    pub fn custom_report(
        &self,
        kind: ReportKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StockroomResult<CustomReport> {
        if start > end {
            return Err(validation_error("Report start is after its end"));
        }

        let data = match kind {
            ReportKind::Sales => {
                let model = self.sales.model();
                let filter = field("saleDate").gte(start).and(field("saleDate").lte(end));
                model.populate_all(model.find_by(&filter)?, "products.productId")?
            }
            ReportKind::Inventory => {
                let model = self.inventories.model();
                let filter = field("lastUpdated")
                    .gte(start)
                    .and(field("lastUpdated").lte(end));
                let records = model.populate_all(model.find_by(&filter)?, "products.productId")?;
                model.populate_all(records, "locations.locationId")?
            }
        };

        Ok(CustomReport {
            kind,
            start,
            end,
            data,
        })
    }

    /// Suggested stock levels per inventory record: a reorder point of a
    /// fifth of current stock but at least one minimum order, and a maximum
    /// of three times the current reorder point.
    pub fn stock_optimisation(&self) -> StockroomResult<Vec<OptimisationSuggestion>> {
        let products: HashMap<RecordId, Product> = self
            .products
            .find(&doc! {})?
            .into_iter()
            .filter_map(|p| p.id.clone().map(|id| (id, p)))
            .collect();

        self.inventories
            .find(&doc! {})?
            .into_iter()
            .map(|record| {
                let product = products
                    .get(&record.product_id)
                    .ok_or_else(|| dangling_reference(&record))?;
                let moq = product.minimum_order_quantity() as f64;
                Ok(OptimisationSuggestion {
                    product_id: record.product_id.clone(),
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    category: product.category.clone(),
                    location_id: record.location_id.clone(),
                    supplier: product.supplier_name().to_string(),
                    current_stock: record.current_stock,
                    current_reorder_point: record.reorder_point,
                    current_max_stock: record.max_stock,
                    suggested_reorder_point: (record.current_stock as f64 * 0.2).max(moq),
                    suggested_max_stock: record.reorder_point * 3,
                })
            })
            .collect()
    }
}

fn sum_of(field: &str) -> Accumulator {
    Accumulator::Sum(SumOperand::Field(field.to_string()))
}

fn number(document: &Document, field: &str) -> f64 {
    document
        .get(field)
        .and_then(Value::as_number)
        .unwrap_or(0.0)
}

fn dangling_reference(record: &InventoryRecord) -> StockroomError {
    log::error!(
        "Inventory record {:?} references missing product {}",
        record.id,
        record.product_id
    );
    StockroomError::new(
        &format!("Inventory record references missing product {}", record.product_id),
        ErrorKind::NotFound,
    )
}
