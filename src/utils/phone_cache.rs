use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => phone is TAKEN
/// false => phone is AVAILABLE (usually we store only taken)
pub static PHONE_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

fn normalize(phone: &str) -> String {
    phone.trim().to_owned()
}

/// Mark a single phone number as taken
pub async fn mark_taken(phone: &str) {
    PHONE_CACHE.insert(normalize(phone), true).await;
}

/// Check if a phone number is taken
pub async fn is_taken(phone: &str) -> bool {
    PHONE_CACHE.get(&normalize(phone)).await.unwrap_or(false)
}

/// Batch mark phone numbers as taken
async fn batch_mark(phones: &[String]) {
    let futures: Vec<_> = phones
        .iter()
        .map(|p| PHONE_CACHE.insert(normalize(p), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only RECENTLY active phone numbers into the in-memory cache (batched)
pub async fn warmup_phone_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT phone
        FROM employees
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (phone,) = row?;
        batch.push(phone);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining phone numbers
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Phone cache warmup complete: {} recently active employees (last {} days)",
        total_count,
        days
    );

    Ok(())
}
