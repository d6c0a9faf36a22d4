use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real workforce counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static PHONE_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(phone: &str) -> String {
    phone.trim().to_owned()
}

/// Check if a phone number might exist (false positives possible)
pub fn might_exist(phone: &str) -> bool {
    let phone = normalize(phone);
    PHONE_FILTER
        .read()
        .expect("phone filter poisoned")
        .contains(&phone)
}

/// Insert a single phone number into the filter
pub fn insert(phone: &str) {
    let phone = normalize(phone);
    PHONE_FILTER
        .write()
        .expect("phone filter poisoned")
        .add(&phone);
}

/// Remove a phone number from the filter
pub fn remove(phone: &str) {
    let phone = normalize(phone);
    PHONE_FILTER
        .write()
        .expect("phone filter poisoned")
        .remove(&phone);
}

/// Warm up the phone filter using streaming + batching
pub async fn warmup_phone_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT phone FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (phone,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&phone));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Phone filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized phone numbers
fn insert_batch(phones: &[String]) {
    let mut filter = PHONE_FILTER.write().expect("phone filter poisoned");

    for phone in phones {
        filter.add(phone);
    }
}
