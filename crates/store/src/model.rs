use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConcertId, Money, OrderId, TicketId};

/// A concert as stored in the `concerts` table.
///
/// Only `ticket_price` and `published_at` drive behavior; the remaining
/// fields are descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concert {
    pub id: ConcertId,
    pub title: String,
    pub subtitle: String,
    pub date: DateTime<Utc>,
    pub ticket_price: Money,
    pub venue: String,
    pub venue_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub additional_information: String,
    /// `None` means the concert is not publicly visible.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Concert {
    /// Returns true if the concert is visible to public listings.
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// A concert that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConcert {
    pub title: String,
    pub subtitle: String,
    pub date: DateTime<Utc>,
    pub ticket_price: Money,
    pub venue: String,
    pub venue_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub additional_information: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewConcert {
    /// Creates a new concert builder.
    pub fn builder() -> ConcertBuilder {
        ConcertBuilder::default()
    }
}

/// Builder for constructing [`NewConcert`] values.
#[derive(Debug, Default)]
pub struct ConcertBuilder {
    title: Option<String>,
    subtitle: Option<String>,
    date: Option<DateTime<Utc>>,
    ticket_price: Option<Money>,
    venue: Option<String>,
    venue_address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    additional_information: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl ConcertBuilder {
    /// Sets the headline.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the supporting act line.
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Sets the show date. If not set, the current time will be used.
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the price of a single ticket.
    pub fn ticket_price(mut self, price: Money) -> Self {
        self.ticket_price = Some(price);
        self
    }

    /// Sets the venue name and street address.
    pub fn venue(mut self, venue: impl Into<String>, address: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self.venue_address = Some(address.into());
        self
    }

    /// Sets city, state and zip.
    pub fn location(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self.zip = Some(zip.into());
        self
    }

    /// Sets free-form notes shown on the concert page.
    pub fn additional_information(mut self, info: impl Into<String>) -> Self {
        self.additional_information = Some(info.into());
        self
    }

    /// Marks the concert as published at the given time.
    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Marks the concert as published now.
    pub fn published(self) -> Self {
        self.published_at(Utc::now())
    }

    /// Builds the concert. Unset descriptive fields default to empty strings.
    pub fn build(self) -> NewConcert {
        NewConcert {
            title: self.title.unwrap_or_default(),
            subtitle: self.subtitle.unwrap_or_default(),
            date: self.date.unwrap_or_else(Utc::now),
            ticket_price: self.ticket_price.unwrap_or_default(),
            venue: self.venue.unwrap_or_default(),
            venue_address: self.venue_address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            zip: self.zip.unwrap_or_default(),
            additional_information: self.additional_information.unwrap_or_default(),
            published_at: self.published_at,
        }
    }
}

/// A single ticket slot of a concert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub concert_id: ConcertId,
    /// `None` while the ticket is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Returns true if no order has claimed this ticket.
    pub fn is_available(&self) -> bool {
        self.order_id.is_none()
    }
}

/// A purchase order together with the tickets it currently claims.
///
/// `tickets` is loaded by looking up tickets whose `order_id` points here;
/// the order does not own those rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub email: String,
    pub concert_id: ConcertId,
    pub ticket_quantity: u32,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

/// An order that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub email: String,
    pub concert_id: ConcertId,
    pub ticket_quantity: u32,
    pub amount: Money,
}

impl NewOrder {
    /// Creates a new order description.
    pub fn new(
        email: impl Into<String>,
        concert_id: ConcertId,
        ticket_quantity: u32,
        amount: Money,
    ) -> Self {
        Self {
            email: email.into(),
            concert_id,
            ticket_quantity,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_unpublished() {
        let concert = NewConcert::builder()
            .title("The Red Chord")
            .ticket_price(Money::from_cents(3250))
            .build();

        assert_eq!(concert.title, "The Red Chord");
        assert_eq!(concert.ticket_price, Money::from_cents(3250));
        assert!(concert.published_at.is_none());
        assert!(concert.venue.is_empty());
    }

    #[test]
    fn builder_sets_publish_time() {
        let concert = NewConcert::builder().published().build();
        assert!(concert.published_at.is_some());
    }

    #[test]
    fn available_ticket_omits_order_id() {
        let now = Utc::now();
        let ticket = Ticket {
            id: TicketId::new(1),
            concert_id: ConcertId::new(2),
            order_id: None,
            created_at: now,
            updated_at: now,
        };

        assert!(ticket.is_available());
        let json = serde_json::to_value(&ticket).unwrap();
        assert!(json.get("order_id").is_none());
        assert_eq!(json["concert_id"], 2);
    }

    #[test]
    fn order_serializes_nested_tickets() {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(5),
            email: "john@example.com".to_string(),
            concert_id: ConcertId::new(2),
            ticket_quantity: 1,
            amount: Money::from_cents(3250),
            created_at: now,
            updated_at: now,
            tickets: vec![Ticket {
                id: TicketId::new(1),
                concert_id: ConcertId::new(2),
                order_id: Some(OrderId::new(5)),
                created_at: now,
                updated_at: now,
            }],
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["amount"], 3250);
        assert_eq!(json["tickets"][0]["order_id"], 5);
    }
}
