/// Mask a secret wherever it appears in a message meant for users
///
/// HTTP errors from reqwest carry the full request URL, which for
/// Alpha Vantage includes `apikey=<key>`.
pub fn redact_secret(message: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => message.replace(secret, "***"),
        _ => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_secret() {
        let msg = "error sending request for url (https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&apikey=SECRET123)";
        let clean = redact_secret(msg, Some("SECRET123"));
        assert!(!clean.contains("SECRET123"));
        assert!(clean.ends_with("apikey=***)"));

        assert_eq!(redact_secret("plain", None), "plain");
        assert_eq!(redact_secret("plain", Some("")), "plain");
    }
}
