//! Human-readable rendering of rates, speeds and percentages

const SI_PREFIXES: &[&str] = &["", "k", "M", "G", "T", "P", "E"];

fn precision(scaled: f64) -> usize {
    if scaled.abs() < 10.0 {
        2
    } else if scaled.abs() < 100.0 {
        1
    } else {
        0
    }
}

/// Scale a value by powers of 1000 and format it with three significant
/// digits. Returns the formatted number and its SI prefix.
fn auto_scale(value: f64) -> (String, &'static str) {
    let mut scaled = value;
    let mut exponent = 0;
    while scaled.abs() >= 1000.0 && exponent < SI_PREFIXES.len() - 1 {
        scaled /= 1000.0;
        exponent += 1;
    }
    // 999.9 rounds up to 1000 and belongs to the next prefix
    let digits = precision(scaled);
    let factor = 10f64.powi(digits as i32);
    if (scaled.abs() * factor).round() / factor >= 1000.0 && exponent < SI_PREFIXES.len() - 1 {
        scaled /= 1000.0;
        exponent += 1;
    }
    (format!("{:.*}", precision(scaled), scaled), SI_PREFIXES[exponent])
}

fn strip_trailing_zeros(number: String) -> String {
    if !number.contains('.') {
        return number;
    }
    number
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Byte rate, e.g. `800 kB/s`, `3.20 MB/s`, `0.00 B/s`
pub fn iobandwidth(bytes_per_sec: f64) -> String {
    let (number, prefix) = auto_scale(bytes_per_sec);
    format!("{} {}B/s", number, prefix)
}

/// Link speed given in bits per second, e.g. `10 MBit/s`, `123 kBit/s`
pub fn nicspeed(bits_per_sec: f64) -> String {
    let (number, prefix) = auto_scale(bits_per_sec);
    format!("{} {}Bit/s", strip_trailing_zeros(number), prefix)
}

/// Byte rate shown in bits, e.g. `6.4 MBit/s`
pub fn networkbandwidth(bytes_per_sec: f64) -> String {
    nicspeed(bytes_per_sec * 8.0)
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}
