//! Prices are stored as integer minor units (cents) and rendered with two
//! decimals at the API boundary.

pub fn format_minor(amount_minor: i32) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Serde adapter so view models can keep `i32` minor units while the JSON
/// carries `"20.00"`.
pub mod as_decimal_string {
    use serde::Serializer;

    pub fn serialize<S>(amount_minor: &i32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_minor(*amount_minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_minor(2000), "20.00");
        assert_eq!(format_minor(1999), "19.99");
        assert_eq!(format_minor(5), "0.05");
        assert_eq!(format_minor(0), "0.00");
        assert_eq!(format_minor(-150), "-1.50");
    }
}
