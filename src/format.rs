/// Whole-dollar currency with thousands separators, e.g. `$1,234,567`.
pub fn currency(amount: f64) -> String {
    let negative = amount < -0.5;
    let whole = amount.abs().round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Percentage to one decimal place, e.g. `27.3%`.
pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Percentage rounded to a whole number, used in compact list lines.
pub fn percent_whole(value: f64) -> String {
    format!("{value:.0}%")
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
