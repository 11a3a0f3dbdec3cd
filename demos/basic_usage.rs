//! Basic usage example of tag-cache.
//!
//! Run with: cargo run --example basic_usage

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tag_cache::{
    backend::InMemoryBackend, error::Result, observability::HitMissCounter, CacheService, Ttl,
};

/// Example entity: Employment
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Employment {
    id: String,
    loanapp_id: String,
    employer_name: String,
    salary: f64,
}

/// Mock repository that simulates database access
#[derive(Default)]
struct EmploymentRepository {
    queries: AtomicUsize,
}

impl EmploymentRepository {
    async fn find(&self, id: &str) -> Result<Option<Employment>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        println!("  [DB] Fetching employment: {}", id);

        let employment = match id {
            "emp_001" => Some(Employment {
                id: id.to_string(),
                loanapp_id: "loan_123".to_string(),
                employer_name: "Acme Corp".to_string(),
                salary: 75000.0,
            }),
            "emp_002" => Some(Employment {
                id: id.to_string(),
                loanapp_id: "loan_456".to_string(),
                employer_name: "Tech Inc".to_string(),
                salary: 95000.0,
            }),
            _ => None,
        };

        Ok(employment)
    }
}

async fn load(
    cache: &CacheService<InMemoryBackend>,
    repo: &EmploymentRepository,
    id: &str,
) -> Result<Option<Employment>> {
    let key = format!("employment:{}", id);
    cache
        .cache(&key, Ttl::from_secs(300), &["employments", "loan_apps"], || {
            repo.find(id)
        })
        .await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== tag-cache - Basic Example ===\n");

    // 1. Initialize cache backend
    println!("1. Initializing in-memory cache backend...");
    let counter = HitMissCounter::new();
    let cache = CacheService::with_metrics(InMemoryBackend::new(), Box::new(counter.clone()));
    let repo = EmploymentRepository::default();
    println!("   ✓ Cache backend ready\n");

    // 2. First request - cache miss, fetch from database
    println!("2. First request for employment (emp_001):");
    if let Some(emp) = load(&cache, &repo, "emp_001").await? {
        println!(
            "   ✓ Employment loaded: {} from {} (${:.2})\n",
            emp.employer_name, emp.id, emp.salary
        );
    }

    // 3. Second request - cache hit
    println!("3. Second request for same employment (emp_001):");
    if let Some(emp) = load(&cache, &repo, "emp_001").await? {
        println!(
            "   ✓ Employment loaded from cache: {} (${:.2})\n",
            emp.employer_name, emp.salary
        );
    }

    // 4. Absence is cached too
    println!("4. Unknown employment (emp_404), twice:");
    load(&cache, &repo, "emp_404").await?;
    if load(&cache, &repo, "emp_404").await?.is_none() {
        println!("   ✓ Not found, and the second lookup never reached the database\n");
    }

    // 5. Direct lookup without a producer
    println!("5. Direct lookup (no database fallback):");
    match cache.get::<Employment>("employment:emp_002").await {
        Ok(_) => println!("   ✗ Unexpected hit\n"),
        Err(e) if e.is_miss() => println!("   ✓ Cache miss, as expected\n"),
        Err(e) => return Err(e),
    }

    // 6. Tag invalidation
    println!("6. Loan application changed, flushing tag 'loan_apps':");
    load(&cache, &repo, "emp_002").await?;
    cache.flush_tags(&["loan_apps"]).await;
    for id in ["emp_001", "emp_002", "emp_404"] {
        let key = format!("employment:{}", id);
        println!("   {} cached: {}", key, cache.exists(&key).await);
    }
    println!();

    // 7. Reload after invalidation
    println!("7. Request after invalidation (emp_001):");
    if let Some(emp) = load(&cache, &repo, "emp_001").await? {
        println!(
            "   ✓ Employment reloaded for loan app {}\n",
            emp.loanapp_id
        );
    }

    let stats = counter.stats();
    println!("=== Summary ===");
    println!("   Database queries: {}", repo.queries.load(Ordering::SeqCst));
    println!(
        "   Hits: {}  Misses: {}  Sets: {}  Hit ratio: {:.1}%",
        stats.hits,
        stats.misses,
        stats.sets,
        stats.hit_ratio() * 100.0
    );

    Ok(())
}
