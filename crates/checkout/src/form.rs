//! Shipping form: prefill from the customer profile, edit mode, and validation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cart::CustomerProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}\b").expect("postal code pattern is valid"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("separator pattern is valid"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Words that introduce a city or regency name in an address.
const CITY_MARKERS: [&str; 3] = ["Kota", "Kab.", "Kabupaten"];

/// A field of the shipping form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Address,
        Field::City,
        Field::PostalCode,
    ];

    /// Returns the field name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::City => "city",
            Field::PostalCode => "postal_code",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shipping and contact details sent with an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl ShippingProfile {
    /// Prefills the form from a stored customer profile.
    ///
    /// City and postal code come from the free-text address when it contains
    /// them, otherwise from the profile's own fields.
    pub fn from_customer(customer: &CustomerProfile) -> Self {
        let parsed = parse_address(&customer.address);
        let or_stored = |parsed: String, stored: &Option<String>| {
            if parsed.is_empty() {
                stored.clone().unwrap_or_default()
            } else {
                parsed
            }
        };

        Self {
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            city: or_stored(parsed.city, &customer.city),
            postal_code: or_stored(parsed.postal_code, &customer.postal_code),
        }
    }

    /// Returns the value of one field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Address => &self.address,
            Field::City => &self.city,
            Field::PostalCode => &self.postal_code,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Address => &mut self.address,
            Field::City => &mut self.city,
            Field::PostalCode => &mut self.postal_code,
        }
    }

    /// The single-line address recorded on the order header.
    pub fn shipping_address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.address.trim(),
            self.city.trim(),
            self.postal_code.trim()
        )
    }
}

/// City and postal code guessed from a free-text address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub city: String,
    pub postal_code: String,
}

/// Best-effort extraction of city and postal code from a free-text address.
///
/// The postal code is the first standalone five-digit group. The city is the
/// word after "Kota", "Kab." or "Kabupaten"; failing that, the word just
/// before the postal code. Either part is empty when nothing matches.
pub fn parse_address(address: &str) -> ParsedAddress {
    let postal_code = POSTAL_CODE
        .find(address)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let words: Vec<&str> = SEPARATORS
        .split(address)
        .filter(|w| !w.is_empty())
        .collect();
    let mut city = words
        .windows(2)
        .find(|pair| CITY_MARKERS.contains(&pair[0]))
        .map(|pair| pair[1].to_string())
        .unwrap_or_default();

    if city.is_empty()
        && !postal_code.is_empty()
        && let Some(idx) = address.rfind(&postal_code)
        && idx > 0
    {
        city = SEPARATORS
            .split(address[..idx].trim())
            .filter(|w| !w.is_empty())
            .last()
            .unwrap_or_default()
            .to_string();
    }

    ParsedAddress {
        city: city.replace(',', ""),
        postal_code,
    }
}

/// Per-field validation messages; empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Returns true if no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the message for a field, if it failed.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Iterates failing fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

/// Validates the shipping form. Pure; performs no I/O.
pub fn validate(form: &ShippingProfile) -> FieldErrors {
    let mut errors = BTreeMap::new();

    for field in Field::ALL {
        let value = form.get(field).trim();
        if value.is_empty() {
            let label = match field {
                Field::Name => "Name",
                Field::Email => "Email",
                Field::Phone => "Phone number",
                Field::Address => "Address",
                Field::City => "City",
                Field::PostalCode => "Postal code",
            };
            errors.insert(field, format!("{label} is required"));
        } else if field == Field::Email && !EMAIL.is_match(value) {
            errors.insert(field, "Email format is invalid".to_string());
        }
    }

    FieldErrors(errors)
}

/// Holds the shipping form and only lets fields change in edit mode.
#[derive(Debug, Clone, Default)]
pub struct ProfileEditor {
    profile: ShippingProfile,
    editing: bool,
}

impl ProfileEditor {
    /// Starts in read-only mode with the given prefill.
    pub fn new(profile: ShippingProfile) -> Self {
        Self {
            profile,
            editing: false,
        }
    }

    /// Returns the current form contents.
    pub fn profile(&self) -> &ShippingProfile {
        &self.profile
    }

    /// Returns true while in edit mode.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Enters edit mode.
    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// Leaves edit mode.
    pub fn finish_edit(&mut self) {
        self.editing = false;
    }

    /// Changes one field. Editing the address re-derives city and postal code.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), CheckoutError> {
        if !self.editing {
            return Err(CheckoutError::InvalidState {
                expected: "editing",
                actual: "read-only".to_string(),
            });
        }
        let value = value.into();
        if field == Field::Address {
            let parsed = parse_address(&value);
            self.profile.city = parsed.city;
            self.profile.postal_code = parsed.postal_code;
        }
        *self.profile.slot(field) = value;
        Ok(())
    }

    /// Returns the form contents, consuming the editor.
    pub fn into_profile(self) -> ShippingProfile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use common::CustomerId;

    use super::*;

    fn valid_form() -> ShippingProfile {
        ShippingProfile {
            name: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            phone: "081234567890".to_string(),
            address: "Jl. Merdeka No. 10".to_string(),
            city: "Bandung".to_string(),
            postal_code: "40115".to_string(),
        }
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        assert!(validate(&valid_form()).is_empty());
    }

    #[test]
    fn test_every_blank_field_is_reported() {
        let errors = validate(&ShippingProfile::default());
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::PostalCode), Some("Postal code is required"));
    }

    #[test]
    fn test_whitespace_only_counts_as_blank() {
        let mut form = valid_form();
        form.city = "   ".to_string();
        let errors = validate(&form);
        assert_eq!(errors.len(), 1);
        assert!(errors.get(Field::City).is_some());
    }

    #[test]
    fn test_malformed_email() {
        for email in ["budi", "budi@example", "budi @example.com", "@example.com"] {
            let mut form = valid_form();
            form.email = email.to_string();
            assert_eq!(
                validate(&form).get(Field::Email),
                Some("Email format is invalid"),
                "{email}"
            );
        }
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut form = valid_form();
        form.phone.clear();
        assert_eq!(validate(&form), validate(&form));
    }

    #[test]
    fn test_parse_address_with_city_marker() {
        let parsed = parse_address("Jl. Melati 3, Kota Bandung, Jawa Barat 40115");
        assert_eq!(parsed.city, "Bandung");
        assert_eq!(parsed.postal_code, "40115");
    }

    #[test]
    fn test_parse_address_falls_back_to_word_before_postal_code() {
        let parsed = parse_address("Jl. Kenanga 5, Sleman, 55281");
        assert_eq!(parsed.city, "Sleman");
        assert_eq!(parsed.postal_code, "55281");
    }

    #[test]
    fn test_parse_address_without_matches_is_empty() {
        assert_eq!(parse_address("Jl. Mawar"), ParsedAddress::default());
        assert_eq!(parse_address(""), ParsedAddress::default());
        // Six digits are not a postal code.
        assert_eq!(parse_address("Blok 123456").postal_code, "");
    }

    #[test]
    fn test_prefill_prefers_parsed_then_stored_values() {
        let customer = CustomerProfile {
            id: CustomerId::new(3),
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
            phone: "0812".to_string(),
            address: "Jl. Mawar 1".to_string(),
            city: Some("Bogor".to_string()),
            postal_code: Some("16111".to_string()),
        };
        let profile = ShippingProfile::from_customer(&customer);
        assert_eq!(profile.city, "Bogor");
        assert_eq!(profile.postal_code, "16111");

        let customer = CustomerProfile {
            address: "Jl. Mawar 1, Kab. Sleman 55281".to_string(),
            ..customer
        };
        let profile = ShippingProfile::from_customer(&customer);
        assert_eq!(profile.city, "Sleman");
        assert_eq!(profile.postal_code, "55281");
    }

    #[test]
    fn test_editor_rejects_changes_outside_edit_mode() {
        let mut editor = ProfileEditor::new(valid_form());
        let result = editor.set(Field::Name, "Someone Else");
        assert!(matches!(result, Err(CheckoutError::InvalidState { .. })));
        assert_eq!(editor.profile().name, "Budi Santoso");
    }

    #[test]
    fn test_editing_address_rederives_city_and_postal_code() {
        let mut editor = ProfileEditor::new(valid_form());
        editor.begin_edit();
        editor
            .set(Field::Address, "Jl. Sudirman 1, Kota Surabaya 60271")
            .unwrap();
        editor.finish_edit();

        let profile = editor.into_profile();
        assert_eq!(profile.city, "Surabaya");
        assert_eq!(profile.postal_code, "60271");
    }

    #[test]
    fn test_shipping_address_line() {
        assert_eq!(
            valid_form().shipping_address(),
            "Jl. Merdeka No. 10, Bandung, 40115"
        );
    }
}
