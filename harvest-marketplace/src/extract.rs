//! DOM field readers.
//!
//! Readers report a missing element as [`FieldError::Absent`] and an
//! unparseable value as [`FieldError::Malformed`]; every other driver failure
//! stays a [`FieldError::Driver`] so callers never mistake a dead session for
//! an empty field.
use harvest_drivers::{BrowserSession, DriverError};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum FieldError {
    #[error("no element matches `{selector}`")]
    Absent { selector: String },

    #[error("`{selector}` holds an unusable value: {value:?}")]
    Malformed { selector: String, value: String },

    #[error(transparent)]
    Driver(DriverError),
}

impl From<DriverError> for FieldError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::ElementNotFound { selector } => FieldError::Absent { selector },
            other => FieldError::Driver(other),
        }
    }
}

/// Replace an absent or malformed field with `fallback`; driver failures pass through.
pub fn or_fallback<T>(field: &str, result: Result<T, FieldError>, fallback: T) -> Result<T, DriverError> {
    match result {
        Ok(value) => Ok(value),
        Err(FieldError::Absent { selector }) => {
            debug!(target: "harvest.extract", field, %selector, "field absent; using fallback");
            Ok(fallback)
        }
        Err(FieldError::Malformed { selector, value }) => {
            warn!(target: "harvest.extract", field, %selector, %value, "field malformed; using fallback");
            Ok(fallback)
        }
        Err(FieldError::Driver(err)) => Err(err),
    }
}

/// Visible text of the description element.
pub async fn read_description(session: &mut dyn BrowserSession, selector: &str) -> Result<String, FieldError> {
    Ok(session.text(selector).await?.trim().to_string())
}

/// Item count shown in the collection stats bar.
pub async fn read_item_count(session: &mut dyn BrowserSession, selector: &str) -> Result<u32, FieldError> {
    let raw = session.inner_html(selector).await?;
    parse_item_count(&raw).ok_or_else(|| FieldError::Malformed {
        selector: selector.to_string(),
        value: raw,
    })
}

/// Parse a stats-bar count such as `"1,234"`, `"<span>87</span>"` or `"10.5K"`.
///
/// ```
/// use harvest_marketplace::extract::parse_item_count;
///
/// assert_eq!(parse_item_count("1,234"), Some(1234));
/// assert_eq!(parse_item_count("<span>10.5K</span>"), Some(10_500));
/// assert_eq!(parse_item_count("items"), None);
/// ```
pub fn parse_item_count(raw: &str) -> Option<u32> {
    let text = strip_tags(raw);
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    if multiplier == 1.0 {
        return number.parse::<u64>().ok().map(saturate);
    }
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(saturate((value * multiplier).round() as u64))
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
