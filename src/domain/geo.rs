//! Country and subdivision lookup codes
//!
//! These are read-only reference data: the store seeds them into lookup
//! tables at schema creation, and address fields map to them by code.
//! Subdivisions are only meaningful for the United States; every other
//! country uses the `State::NA` sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("Unknown country code: '{0}'")]
    UnknownCountry(String),

    #[error("Unknown state code: '{0}'")]
    UnknownState(String),
}

macro_rules! code_enum {
    ($name:ident, $err:path, [ $(($variant:ident, $code:literal, $label:literal)),+ $(,)? ]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// The stable code stored in the database
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Human-readable name
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// All variants, in declaration order (used to seed lookup tables)
            pub fn all() -> &'static [$name] {
                &[$(Self::$variant,)+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = GeoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(if s.eq_ignore_ascii_case($code) {
                    return Ok(Self::$variant);
                })+
                Err($err(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = GeoError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.code().to_string()
            }
        }
    };
}

code_enum!(Country, GeoError::UnknownCountry, [
    (UnitedStates, "US", "United States"),
    (Canada, "CA", "Canada"),
    (Mexico, "MX", "Mexico"),
    (UnitedKingdom, "GB", "United Kingdom"),
    (Germany, "DE", "Germany"),
    (France, "FR", "France"),
    (Spain, "ES", "Spain"),
    (Italy, "IT", "Italy"),
    (Japan, "JP", "Japan"),
    (Australia, "AU", "Australia"),
    (Brazil, "BR", "Brazil"),
    (India, "IN", "India"),
]);

code_enum!(State, GeoError::UnknownState, [
    (NA, "NA", "Not Applicable"),
    (AL, "AL", "Alabama"),
    (AK, "AK", "Alaska"),
    (AZ, "AZ", "Arizona"),
    (AR, "AR", "Arkansas"),
    (CA, "CA", "California"),
    (CO, "CO", "Colorado"),
    (CT, "CT", "Connecticut"),
    (DE, "DE", "Delaware"),
    (DC, "DC", "District of Columbia"),
    (FL, "FL", "Florida"),
    (GA, "GA", "Georgia"),
    (HI, "HI", "Hawaii"),
    (ID, "ID", "Idaho"),
    (IL, "IL", "Illinois"),
    (IN, "IN", "Indiana"),
    (IA, "IA", "Iowa"),
    (KS, "KS", "Kansas"),
    (KY, "KY", "Kentucky"),
    (LA, "LA", "Louisiana"),
    (ME, "ME", "Maine"),
    (MD, "MD", "Maryland"),
    (MA, "MA", "Massachusetts"),
    (MI, "MI", "Michigan"),
    (MN, "MN", "Minnesota"),
    (MS, "MS", "Mississippi"),
    (MO, "MO", "Missouri"),
    (MT, "MT", "Montana"),
    (NE, "NE", "Nebraska"),
    (NV, "NV", "Nevada"),
    (NH, "NH", "New Hampshire"),
    (NJ, "NJ", "New Jersey"),
    (NM, "NM", "New Mexico"),
    (NY, "NY", "New York"),
    (NC, "NC", "North Carolina"),
    (ND, "ND", "North Dakota"),
    (OH, "OH", "Ohio"),
    (OK, "OK", "Oklahoma"),
    (OR, "OR", "Oregon"),
    (PA, "PA", "Pennsylvania"),
    (RI, "RI", "Rhode Island"),
    (SC, "SC", "South Carolina"),
    (SD, "SD", "South Dakota"),
    (TN, "TN", "Tennessee"),
    (TX, "TX", "Texas"),
    (UT, "UT", "Utah"),
    (VT, "VT", "Vermont"),
    (VA, "VA", "Virginia"),
    (WA, "WA", "Washington"),
    (WV, "WV", "West Virginia"),
    (WI, "WI", "Wisconsin"),
    (WY, "WY", "Wyoming"),
]);

impl Country {
    /// Returns true if addresses in this country carry a subdivision code
    pub fn has_subdivisions(self) -> bool {
        matches!(self, Country::UnitedStates)
    }
}

impl State {
    /// Returns true for the "no subdivision" sentinel
    pub fn is_na(self) -> bool {
        matches!(self, State::NA)
    }
}
