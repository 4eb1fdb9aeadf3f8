//! Contact export to CSV
//!
//! The file is meant to be opened in a Russian-locale spreadsheet: `;` as delimiter and a
//! UTF-8 byte order mark so the Cyrillic header is detected correctly.

use chrono::NaiveDateTime;

use crate::core::types::Tariff;
use crate::storage::ContactRecord;

const UTF8_BOM: &str = "\u{feff}";
const DELIMITER: char = ';';

const HEADER: [&str; 7] = ["ID", "Username", "Имя", "Фамилия", "Телефон", "Тариф", "Дата регистрации"];

/// Label for users without any tariff selection
pub const NO_TARIFF_LABEL: &str = "Не выбран";

/// Human readable tariff label used in the export
pub fn tariff_label(tariff: Option<Tariff>) -> &'static str {
    tariff.map(|t| t.display_name()).unwrap_or(NO_TARIFF_LABEL)
}

/// `contacts_YYYYmmdd_HHMMSS.csv`
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("contacts_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Builds the CSV document (BOM included), one row per contact in the given order
pub fn build_contacts_csv(contacts: &[ContactRecord]) -> Vec<u8> {
    let mut content = String::from(UTF8_BOM);
    push_row(&mut content, HEADER.iter().map(|s| s.to_string()));

    for contact in contacts {
        push_row(
            &mut content,
            [
                contact.user_id.to_string(),
                contact.username.as_deref().map(|u| format!("@{}", u)).unwrap_or_default(),
                contact.first_name.clone().unwrap_or_default(),
                contact.last_name.clone().unwrap_or_default(),
                contact.phone_number.clone(),
                tariff_label(contact.tariff).to_string(),
                contact.first_interaction.format("%d.%m.%Y %H:%M").to_string(),
            ],
        );
    }

    content.into_bytes()
}

fn push_row<I>(content: &mut String, fields: I)
where
    I: IntoIterator<Item = String>,
{
    let line = fields
        .into_iter()
        .map(|field| escape_field(&field))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    content.push_str(&line);
    content.push_str("\r\n");
}

/// Quotes a field only when it contains the delimiter, a quote or a line break
fn escape_field(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
