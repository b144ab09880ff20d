//! Contact and address entities
//!
//! A contact owns an ordered sequence of addresses; each address carries a
//! back-reference to the owning contact's pid (a relation, not ownership).
//!
//! Two equality notions are deliberately kept distinct and must not be
//! conflated (the store and snapshot key records by identity, while update
//! verification needs field-level comparison):
//!
//! - identity equality: [`Contact::same_identity`] — pids match
//! - deep equality: derived `PartialEq` — every field of the contact and
//!   every field of each address, in sequence order

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::geo::{Country, State};
use super::id::Pid;

/// Gender lookup, stored as its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    #[default]
    Unspecified,
    Female,
    Male,
    Nonbinary,
}

impl Gender {
    /// Index into the gender lookup set
    pub fn index(self) -> u8 {
        match self {
            Gender::Unspecified => 0,
            Gender::Female => 1,
            Gender::Male => 2,
            Gender::Nonbinary => 3,
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Gender::Unspecified => "unspecified",
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Nonbinary => "nonbinary",
        }
    }
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Unspecified),
            1 => Ok(Gender::Female),
            2 => Ok(Gender::Male),
            3 => Ok(Gender::Nonbinary),
            other => Err(format!("unknown gender index: {}", other)),
        }
    }
}

impl From<Gender> for u8 {
    fn from(value: Gender) -> Self {
        value.index()
    }
}

/// One postal address belonging to a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Unique identifier
    pub pid: Pid,

    /// Identity of the owning contact
    pub contact_pid: Pid,

    pub street: String,
    pub house_num: String,
    pub city: String,
    pub zip: String,
    pub country: Country,

    /// Meaningful only when `country` has subdivisions, `State::NA` otherwise
    pub state: State,
}

impl Address {
    /// Creates a new address owned by the given contact
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contact_pid: Pid,
        street: impl Into<String>,
        house_num: impl Into<String>,
        city: impl Into<String>,
        zip: impl Into<String>,
        country: Country,
        state: State,
    ) -> Self {
        let street = street.into();
        let zip = zip.into();
        let pid = Pid::address(&format!("{}{}", street, zip), Utc::now());
        Self {
            pid,
            contact_pid,
            street,
            house_num: house_num.into(),
            city: city.into(),
            zip,
            country,
            state,
        }
    }
}

/// One directory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier, immutable once created
    pub pid: Pid,

    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: Gender,

    /// Ordered owned addresses; at least one in normal operation, but read
    /// paths must tolerate an empty sequence
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl Contact {
    /// Creates a new contact with a freshly generated identity
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
        gender: Gender,
    ) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let pid = Pid::contact(&format!("{} {}", first_name, last_name), Utc::now());
        Self {
            pid,
            first_name,
            last_name,
            phone: phone.into(),
            gender,
            addresses: Vec::new(),
        }
    }

    /// Appends an address owned by this contact
    pub fn with_address(
        mut self,
        street: impl Into<String>,
        house_num: impl Into<String>,
        city: impl Into<String>,
        zip: impl Into<String>,
        country: Country,
        state: State,
    ) -> Self {
        self.addresses.push(Address::new(
            self.pid.clone(),
            street,
            house_num,
            city,
            zip,
            country,
            state,
        ));
        self
    }

    /// Identity equality: same record, field values notwithstanding
    pub fn same_identity(&self, other: &Contact) -> bool {
        self.pid == other.pid
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Checks structural validity of a contact supplied to a mutating
    /// operation; returns a reason string on the first violation found
    pub fn validate(&self) -> Result<(), String> {
        if self.pid.is_sentinel() {
            return Err("contact carries the sentinel identity".to_string());
        }
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err("contact has neither first nor last name".to_string());
        }
        for address in &self.addresses {
            if address.contact_pid != self.pid {
                return Err(format!(
                    "address {} references contact {}, not {}",
                    address.pid, address.contact_pid, self.pid
                ));
            }
            if !address.country.has_subdivisions() && !address.state.is_na() {
                return Err(format!(
                    "address {} has state {} but country {} has no subdivisions",
                    address.pid,
                    address.state.code(),
                    address.country.code()
                ));
            }
        }
        Ok(())
    }
}
