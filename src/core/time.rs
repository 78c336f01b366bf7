use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, Time,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Calendar dates travel as `YYYY-MM-DD`.
pub(crate) fn format_date(value: Date) -> String {
    value.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
}

/// Timetable slots travel as 24-hour `HH:MM`.
pub(crate) fn format_clock(value: Time) -> String {
    value.format(format_description!("[hour]:[minute]")).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_clock(value: &str) -> Result<Time, time::error::Parse> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, Month::June, 16).unwrap();
        let time = Time::from_hms(7, 30, 0).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-06-16T07:30:00Z");
    }

    #[test]
    fn dates_use_iso_calendar_format() {
        let date = Date::from_calendar_date(2025, Month::August, 4).unwrap();
        assert_eq!(format_date(date), "2025-08-04");
        assert_eq!(parse_date(" 2025-08-04 ").unwrap(), date);
        assert!(parse_date("08/04/2025").is_err());
    }

    #[test]
    fn clock_times_use_twenty_four_hours() {
        let time = Time::from_hms(13, 5, 0).unwrap();
        assert_eq!(format_clock(time), "13:05");
        assert_eq!(parse_clock(" 13:05 ").unwrap(), time);
        assert!(parse_clock("1:05 PM").is_err());
    }
}
