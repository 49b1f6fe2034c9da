//! Plain-text rendering of change events.

use crate::domain::ChangeEvent;

/// Render the notification sent to every chat for `event`.
#[must_use]
pub fn format_event(event: &ChangeEvent) -> String {
    match event {
        ChangeEvent::New(record) => {
            let mut text = format!(
                "New listing: {}\nPrice: {}",
                record.title(),
                record.price().normalize()
            );
            if !record.attributes.available {
                text.push_str("\nCurrently unavailable");
            }
            push_url(&mut text, record.url.as_deref());
            text
        }
        ChangeEvent::Updated { current, previous } => {
            let mut text = format!("Listing updated: {}", current.title());
            if previous.title != current.attributes.title {
                text.push_str(&format!("\nPreviously: {}", previous.title));
            }
            if previous.price == current.price() {
                text.push_str(&format!("\nPrice: {}", current.price().normalize()));
            } else {
                text.push_str(&format!(
                    "\nPrice: {} -> {}",
                    previous.price.normalize(),
                    current.price().normalize()
                ));
            }
            if previous.available != current.attributes.available {
                text.push_str(if current.attributes.available {
                    "\nBack in stock"
                } else {
                    "\nNo longer available"
                });
            }
            push_url(&mut text, current.url.as_deref());
            text
        }
    }
}

fn push_url(text: &mut String, url: Option<&str>) {
    if let Some(url) = url {
        text.push('\n');
        text.push_str(url);
    }
}
