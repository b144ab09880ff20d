//! Tabular text rendering of contact sets
//!
//! Renders a header row, a separator rule, and one row per contact,
//! `|`-delimited. Column widths are the maximum of the header and every
//! value in the set, recomputed on every call. An optional synthetic
//! selection column (1-based, unrelated to identity) can be prepended for
//! interactive pick-one flows.
//!
//! Only the first address of a contact appears in the table; the full
//! sequence is available through the JSON output paths.

use crate::domain::Contact;

const HEADERS: [&str; 11] = [
    "ID", "First Name", "Last Name", "Phone", "Gender", "Street", "House", "City", "Zip",
    "State", "Country",
];

const SELECTION_HEADER: &str = "Selection";

const SEPARATOR: char = '|';

/// Renders the contact set as a fixed-width table
pub fn render_table(contacts: &[Contact], with_selection: bool) -> String {
    let mut headers: Vec<&str> = Vec::with_capacity(HEADERS.len() + 1);
    if with_selection {
        headers.push(SELECTION_HEADER);
    }
    headers.extend(HEADERS);

    let rows: Vec<Vec<String>> = contacts
        .iter()
        .enumerate()
        .map(|(i, contact)| {
            let mut row = Vec::with_capacity(headers.len());
            if with_selection {
                row.push((i + 1).to_string());
            }
            row.extend(contact_cells(contact));
            row
        })
        .collect();

    let widths = column_widths(&headers, &rows);

    let mut out = String::new();
    render_row(&mut out, &widths, headers.iter().map(|h| h.to_string()));

    // Rule under the headers, as wide as the header line
    let rule_len = out.trim_end().chars().count();
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for row in &rows {
        render_row(&mut out, &widths, row.iter().cloned());
    }

    out
}

/// Renders a single contact (header, rule, one row)
pub fn render_one(contact: &Contact) -> String {
    render_table(std::slice::from_ref(contact), false)
}

fn contact_cells(contact: &Contact) -> Vec<String> {
    let address = contact.addresses.first();
    let cell = |value: Option<String>| value.unwrap_or_default();

    vec![
        contact.pid.to_string(),
        contact.first_name.clone(),
        contact.last_name.clone(),
        contact.phone.clone(),
        contact.gender.label().to_string(),
        cell(address.map(|a| a.street.clone())),
        cell(address.map(|a| a.house_num.clone())),
        cell(address.map(|a| a.city.clone())),
        cell(address.map(|a| a.zip.clone())),
        cell(address.map(|a| a.state.code().to_string())),
        cell(address.map(|a| a.country.code().to_string())),
    ]
}

/// Per column, the maximum display width across the header and every value
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if len > widths[i] {
                widths[i] = len;
            }
        }
    }

    widths
}

fn render_row(out: &mut String, widths: &[usize], cells: impl Iterator<Item = String>) {
    out.push(SEPARATOR);
    for (width, cell) in widths.iter().zip(cells) {
        out.push_str(&cell);
        for _ in cell.chars().count()..*width {
            out.push(' ');
        }
        out.push(SEPARATOR);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Country, Gender, State};

    fn contact(first: &str, last: &str) -> Contact {
        Contact::new(first, last, "555-0123", Gender::Male).with_address(
            "Main Street",
            "123",
            "New City",
            "12345",
            Country::UnitedStates,
            State::NY,
        )
    }

    #[test]
    fn renders_header_rule_and_rows() {
        let contacts = vec![contact("John", "Smith"), contact("Jane", "Doe")];
        let table = render_table(&contacts, false);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4); // header + rule + 2 rows
        assert!(lines[0].contains("|First Name|"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].contains("|John"));
        assert!(lines[3].contains("|Jane"));
    }

    #[test]
    fn column_widths_follow_the_widest_value() {
        let contacts = vec![contact("Maximiliana", "Smith")];
        let table = render_table(&contacts, false);

        // "Maximiliana" (11) is wider than the "First Name" header (10)
        assert!(table.lines().next().unwrap().contains("First Name |"));
    }

    #[test]
    fn header_wins_when_values_are_narrow() {
        let contacts = vec![contact("Jo", "Smith")];
        let table = render_table(&contacts, false);

        let row = table.lines().nth(2).unwrap();
        assert!(row.contains("|Jo        |")); // padded to "First Name"
    }

    #[test]
    fn selection_column_is_one_based() {
        let contacts = vec![contact("John", "Smith"), contact("Jane", "Doe")];
        let table = render_table(&contacts, true);

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("|Selection|"));
        assert!(lines[2].starts_with("|1"));
        assert!(lines[3].starts_with("|2"));
    }

    #[test]
    fn empty_set_renders_header_and_rule_only() {
        let table = render_table(&[], false);
        assert_eq!(table.lines().count(), 2);
    }

    #[test]
    fn contact_without_address_renders_blank_cells() {
        let contacts = vec![Contact::new("John", "Smith", "555-0123", Gender::Male)];
        let table = render_table(&contacts, false);

        let row = table.lines().nth(2).unwrap();
        assert!(row.contains("|John"));
        // Street cell is padded blanks
        assert!(row.contains("|      |"));
    }

    #[test]
    fn render_one_matches_single_row_table() {
        let c = contact("John", "Smith");
        assert_eq!(render_one(&c), render_table(std::slice::from_ref(&c), false));
    }
}
