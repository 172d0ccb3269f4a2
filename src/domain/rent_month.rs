use chrono::{Datelike, NaiveDate};

/// Months after the current one a payment may be booked for.
pub const MAX_MONTHS_AHEAD: i32 = 12;
/// Months before the current one a late payment may still be booked for.
pub const MAX_MONTHS_BEHIND: i32 = 24;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RentMonth {
    year: i32,
    month: u32,
}

impl RentMonth {
    pub fn parse(s: &str) -> Result<RentMonth, String> {
        let error = || "The month must use the YYYY-MM format".to_string();
        let s = s.trim();
        let (year, month) = s.split_once('-').ok_or_else(error)?;
        if year.len() != 4
            || month.len() != 2
            || !year.chars().all(|c| c.is_ascii_digit())
            || !month.chars().all(|c| c.is_ascii_digit())
        {
            return Err(error());
        }
        let year: i32 = year.parse().map_err(|_| error())?;
        let month: u32 = month.parse().map_err(|_| error())?;
        if !(1..=12).contains(&month) || !(2000..=2100).contains(&year) {
            return Err(error());
        }
        Ok(Self { year, month })
    }

    pub fn current(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // `parse` and `next` only ever build valid months.
        NaiveDate::from_ymd(self.year, self.month, 1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred()
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Signed distance in months, positive when `other` is later.
    pub fn months_until(&self, other: RentMonth) -> i32 {
        (other.year - self.year) * 12 + other.month as i32 - self.month as i32
    }

    /// The accepted booking window around the current month.
    pub fn ensure_bookable(&self, today: NaiveDate) -> Result<(), String> {
        let distance = RentMonth::current(today).months_until(*self);
        if distance > MAX_MONTHS_AHEAD {
            Err(format!(
                "Payments cannot be registered more than {} months in advance",
                MAX_MONTHS_AHEAD
            ))
        } else if distance < -MAX_MONTHS_BEHIND {
            Err(format!(
                "Payments older than {} months cannot be registered",
                MAX_MONTHS_BEHIND
            ))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for RentMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl serde::Serialize for RentMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for RentMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RentMonth::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Rent due for a stay starting on `move_in`, proportional to the days left in `month`.
pub fn prorate(price: f64, month: RentMonth, move_in: NaiveDate) -> Result<f64, String> {
    if !month.contains(move_in) {
        return Err(format!(
            "The move-in date {} is not within {}",
            move_in, month
        ));
    }
    let days = month.days();
    let occupied = days - move_in.day() + 1;
    Ok(round_to_cents(price * occupied as f64 / days as f64))
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
