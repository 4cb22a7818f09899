//! Booking-page URLs for a route and date.

/// Search results page on the airline's site.
pub const BOOKING_SEARCH_URL: &str = "https://www.turkishairlines.com/tr-tr/ucak-bileti/arama/";

/// Builds the one-way, one-adult search URL for `date`.
///
/// ISO dates (`YYYY-MM-DD`) are sent as `DDMMYYYY`; anything else has its dots
/// removed, so `04.02.2026` becomes `04022026`.
#[must_use]
pub fn booking_url(origin: &str, destination: &str, date: &str) -> String {
    format!(
        "{BOOKING_SEARCH_URL}?adultCount=1&childCount=0&infantCount=0&departDate={}&arrivalDate=&tripType=O&originCode={origin}&destinationCode={destination}",
        depart_date_param(date)
    )
}

/// Formats an ISO date as `DD.MM.YYYY`; other inputs are returned unchanged.
#[must_use]
pub fn display_date(date: &str) -> String {
    match iso_parts(date) {
        Some((year, month, day)) => format!("{day}.{month}.{year}"),
        None => date.to_string(),
    }
}

fn depart_date_param(date: &str) -> String {
    match iso_parts(date) {
        Some((year, month, day)) => format!("{day}{month}{year}"),
        None => date.replace('.', ""),
    }
}

fn iso_parts(date: &str) -> Option<(&str, &str, &str)> {
    let mut parts = date.trim().split('-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((year, month, day))
}
