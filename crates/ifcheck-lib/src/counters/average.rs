use crate::store::{metric_key, StoredValue, ValueStore};

/// Exponentially weighted moving average with a half-life of `window_secs`.
///
/// The first call seeds the store and returns the sample. A sample that does
/// not advance time returns the previous average unchanged.
pub fn get_average(
    store: &mut dyn ValueStore,
    item_key: &str,
    metric: &str,
    sample: f64,
    timestamp: f64,
    window_secs: f64,
) -> f64 {
    let key = metric_key(item_key, metric);

    let (last_timestamp, last_value) = match store.get(&key) {
        Some(StoredValue::Average { timestamp, value }) => (timestamp, value),
        _ => {
            store.set(
                &key,
                StoredValue::Average {
                    timestamp,
                    value: sample,
                },
            );
            return sample;
        }
    };

    let elapsed = timestamp - last_timestamp;
    if elapsed <= 0.0 {
        return last_value;
    }

    let weight_old = if window_secs > 0.0 {
        0.5f64.powf(elapsed / window_secs)
    } else {
        0.0
    };
    let average = (1.0 - weight_old) * sample + weight_old * last_value;
    store.set(
        &key,
        StoredValue::Average {
            timestamp,
            value: average,
        },
    );
    average
}
