//! Minibank Cards - virtual payment cards
//!
//! A card number is a pure function of the owning account's number and a
//! refresh generation counter, so the same inputs always reproduce the same
//! card. The service half owns the `cards` table: one active card per
//! account, refreshable once per 24 hours.

pub mod card;
pub mod derive;
pub mod error;
pub mod service;

pub use card::Card;
pub use derive::{derive_card_number, expiry_label, is_luhn_valid, ISSUER_PREFIX};
pub use error::CardError;
pub use service::{CardService, REFRESH_COOLDOWN_HOURS};
