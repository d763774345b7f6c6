use crate::models::{Booking, BookingStatus};

/// Renders a booking as a single-event iCalendar document.
pub fn generate_ics(booking: &Booking, salon_name: &str, stylist_name: &str) -> String {
    let date = booking.date.replace('-', "");
    let dtstart = format!("{date}T{}00", booking.start_time.replace(':', ""));
    let dtend = format!("{date}T{}00", booking.end_time.replace(':', ""));
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@salonbook", booking.id);

    let summary = format!(
        "Appointment at {} with {}",
        escape_text(salon_name),
        escape_text(stylist_name)
    );
    let description = escape_text(booking.notes.as_deref().unwrap_or("No additional notes"));
    let status = match booking.status {
        BookingStatus::Cancelled | BookingStatus::NoShow => "CANCELLED",
        BookingStatus::Pending => "TENTATIVE",
        _ => "CONFIRMED",
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Rendezvous//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

/// RFC 5545 TEXT escaping. Line breaks become a literal `\n` so user input
/// can never start a property line of its own.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push_str("\\n");
                }
            }
            _ => out.push(c),
        }
    }
    out
}
