use crate::error::{CheckError, Result};
use crate::store::{metric_key, StoredValue, ValueStore};

/// Per-second rate of a monotonic counter since the previous poll.
///
/// The current sample is always stored. Without a usable previous sample
/// (first poll, or time not advancing) `NoBaselineYet` is returned. A counter
/// that went backwards is treated as wrapped or reset and yields
/// `counter_now / elapsed`.
pub fn get_rate(
    store: &mut dyn ValueStore,
    item_key: &str,
    metric: &str,
    counter_now: u64,
    timestamp_now: f64,
) -> Result<f64> {
    let key = metric_key(item_key, metric);
    let previous = store.get(&key);
    store.set(
        &key,
        StoredValue::Counter {
            timestamp: timestamp_now,
            value: counter_now,
        },
    );

    let Some(StoredValue::Counter {
        timestamp: last_timestamp,
        value: last_value,
    }) = previous
    else {
        return Err(CheckError::no_baseline(key));
    };

    let elapsed = timestamp_now - last_timestamp;
    if elapsed <= 0.0 {
        return Err(CheckError::no_baseline(key));
    }

    let delta = if counter_now < last_value {
        counter_now
    } else {
        counter_now - last_value
    };
    Ok(delta as f64 / elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryValueStore;

    #[test]
    fn test_first_sample_initializes() {
        let mut store = InMemoryValueStore::new();
        let err = get_rate(&mut store, "5", "in", 100, 0.0).unwrap_err();
        assert!(err.is_pending());
        assert_eq!(
            store.get("in.5"),
            Some(StoredValue::Counter {
                timestamp: 0.0,
                value: 100
            })
        );
    }

    #[test]
    fn test_rate_over_elapsed_time() {
        let mut store = InMemoryValueStore::new();
        let _ = get_rate(&mut store, "6", "in", 346_922_243, 0.0);
        let rate = get_rate(&mut store, "6", "in", 350_922_243, 5.0).unwrap();
        assert_eq!(rate, 800_000.0);
    }

    #[test]
    fn test_counter_wrap_uses_current_value() {
        let mut store = InMemoryValueStore::new();
        let _ = get_rate(&mut store, "1", "out", 1_000, 0.0);
        let rate = get_rate(&mut store, "1", "out", 50, 10.0).unwrap();
        assert_eq!(rate, 5.0);
    }

    #[test]
    fn test_time_not_advancing() {
        let mut store = InMemoryValueStore::new();
        let _ = get_rate(&mut store, "1", "in", 10, 5.0);
        assert!(get_rate(&mut store, "1", "in", 20, 5.0).unwrap_err().is_pending());
        assert!(get_rate(&mut store, "1", "in", 30, 4.0).unwrap_err().is_pending());
        // The sample from t=4 is now the baseline
        assert_eq!(get_rate(&mut store, "1", "in", 40, 6.0).unwrap(), 5.0);
    }

    #[test]
    fn test_stored_average_is_not_a_baseline() {
        let mut store = InMemoryValueStore::new();
        store.set(
            "in.1",
            StoredValue::Average {
                timestamp: 0.0,
                value: 1.0,
            },
        );
        assert!(get_rate(&mut store, "1", "in", 10, 5.0).is_err());
    }
}
