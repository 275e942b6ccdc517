use serde::{Deserialize, Serialize};

const TURKISH_MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthNames {
    #[default]
    Turkish,
    English,
}

impl MonthNames {
    pub fn names(self) -> &'static [&'static str; 12] {
        match self {
            MonthNames::Turkish => &TURKISH_MONTHS,
            MonthNames::English => &ENGLISH_MONTHS,
        }
    }
}

/// Labels for `count` consecutive months starting in January, wrapping every twelve.
pub fn month_labels(count: usize, names: MonthNames) -> Vec<String> {
    let names = names.names();
    (0..count).map(|i| names[i % 12].to_string()).collect()
}
