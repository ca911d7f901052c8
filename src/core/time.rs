use chrono::SecondsFormat;

/// Fixed millisecond precision keeps stored timestamps lexically sortable.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::now_rfc3339;

    #[test]
    fn generates_fixed_width_timestamp() {
        let ts = now_rfc3339();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2025-01-01T10:00:00.000Z".len());
    }
}
