use fake::faker::company::en::{Buzzword, CompanyName};
use fake::Fake;
use stockroom::collection::Document;
use stockroom::doc;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::stockroom::Stockroom;
use stockroom::store::json::JsonStoreModule;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use std::{env, fs, thread};

/// Runs `test` against the context made by `before`, then always runs
/// `after`, even when the test returned an error or panicked.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StockroomResult<()>,
    B: Fn() -> StockroomResult<TestContext>,
    A: Fn(TestContext) -> StockroomResult<()>,
{
    let start_time = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(())) => {
            if let Err(e) = after_result {
                panic!("After run failed: {:?}", e);
            }
        }
        Ok(Err(e)) => {
            eprintln!("\n==================== TEST FAILED ====================");
            eprintln!("Took {:?}", elapsed);
            panic!("Test failed: {:?}", e);
        }
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            eprintln!("\n==================== TEST PANICKED ====================");
            eprintln!("Took {:?}", elapsed);
            panic!("Panic: {}", message);
        }
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: Stockroom,
}

impl TestContext {
    pub fn new(path: String, db: Stockroom) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> Stockroom {
        self.db.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(id.to_string()).to_string_lossy().to_string()
}

#[cfg(not(feature = "memory"))]
pub fn create_test_context() -> StockroomResult<TestContext> {
    use stockroom_fjall_adapter::FjallModule;

    let path = random_path();
    let storage_module = FjallModule::with_config()
        .db_path(&path)
        .cache_size(4 * 1024 * 1024)
        .build();

    match Stockroom::builder().load_module(storage_module).open() {
        Ok(db) => Ok(TestContext::new(path, db)),
        Err(e) => {
            let _ = fs::remove_dir_all(&path);
            Err(StockroomError::new_with_cause(
                "Failed to create test context",
                ErrorKind::InternalError,
                e,
            ))
        }
    }
}

#[cfg(feature = "memory")]
pub fn create_test_context() -> StockroomResult<TestContext> {
    let db = Stockroom::builder().open()?;
    Ok(TestContext::new(random_path(), db))
}

/// A database persisted as one JSON file per collection.
pub fn create_json_test_context() -> StockroomResult<TestContext> {
    let path = random_path();
    let storage_module = JsonStoreModule::with_config()
        .data_dir(&path)
        .pretty(true)
        .build();
    let db = Stockroom::builder().load_module(storage_module).open()?;
    Ok(TestContext::new(path, db))
}

/// Closes the database and removes its directory, retrying while the
/// store still holds file handles.
pub fn cleanup(ctx: TestContext) -> StockroomResult<()> {
    if let Err(e) = ctx.db().close() {
        eprintln!("Warning: Failed to close database: {:?}", e);
    }

    let path = ctx.path().to_string();
    let max_retries = 10;
    let mut delay_ms = 25u64;

    for retry in 0..max_retries {
        if !std::path::Path::new(&path).exists() {
            return Ok(());
        }
        match fs::remove_dir_all(&path) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(_) if retry < max_retries - 1 => {
                thread::sleep(Duration::from_millis(delay_ms));
                delay_ms = std::cmp::min(delay_ms * 2, 500);
            }
            Err(e) => {
                // the OS reclaims temp files eventually
                eprintln!("Warning: Failed to remove test directory {}: {:?}", path, e);
                return Ok(());
            }
        }
    }
    Ok(())
}

pub fn create_test_docs() -> Vec<Document> {
    vec![
        doc! { sku: "A-1", category: "tools", price: 10, stock: 5, tags: ["steel"] },
        doc! { sku: "A-2", category: "tools", price: 25.5, stock: 0 },
        doc! { sku: "B-1", category: "paint", price: 7, stock: 40, supplier: { name: "Acme" } },
    ]
}

/// Random product records with distinct SKUs.
pub fn create_fake_products(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let name: String = CompanyName().fake();
            let category: String = Buzzword().fake();
            doc! {
                name: name,
                sku: (format!("SKU-{:05}", i)),
                category: category,
                stock: ((0..500i64).fake::<i64>()),
            }
        })
        .collect()
}
