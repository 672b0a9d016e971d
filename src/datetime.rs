use crate::error::{Error, ErrorKind, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asn1TimeZone {
    /// No timezone provided
    Undefined,
    /// Coordinated universal time
    Z,
    /// Local zone, with offset to coordinated universal time
    Offset(i8, u16, u16),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asn1DateTime {
    pub year: u32,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: Option<u32>,
    pub tz: Asn1TimeZone,
}

/// Conversion to the `time` crate's types (`datetime` feature only),
/// for callers that want a timezone-aware timestamp rather than the raw
/// decoded fields.
#[cfg(feature = "datetime")]
impl TryFrom<&Asn1DateTime> for time::OffsetDateTime {
    type Error = Error;

    fn try_from(dt: &Asn1DateTime) -> Result<Self> {
        use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

        let month = Month::try_from(dt.month as u8).map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?;
        let date = Date::from_calendar_date(dt.year as i32, month, dt.day as u8)
            .map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?;
        let milli = dt.millisecond.unwrap_or(0);
        let time = Time::from_hms_milli(dt.hour as u8, dt.minute as u8, dt.second as u8, milli as u16)
            .map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?;
        let primitive = PrimitiveDateTime::new(date, time);
        let offset = match dt.tz {
            Asn1TimeZone::Undefined | Asn1TimeZone::Z => UtcOffset::UTC,
            Asn1TimeZone::Offset(sign, hh, mm) => {
                let hours = sign as i8 * hh as i8;
                let minutes = sign as i8 * mm as i8;
                UtcOffset::from_hms(hours, minutes, 0)
                    .map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?
            }
        };
        Ok(primitive.assume_offset(offset))
    }
}

#[allow(clippy::too_many_arguments)]
impl Asn1DateTime {
    pub const fn new(
        year: u32,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
        millisecond: Option<u32>,
        tz: Asn1TimeZone,
    ) -> Self {
        Asn1DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
            tz,
        }
    }
}

/// Decode a two-digit decimal value, grounded on the teacher's
/// `datetime.rs::decode_decimal`.
fn decode_decimal(hi: u8, lo: u8) -> Result<u16> {
    if hi.is_ascii_digit() && lo.is_ascii_digit() {
        Ok((hi - b'0') as u16 * 10 + (lo - b'0') as u16)
    } else {
        Err(Error::simple(ErrorKind::InvalidDateTime))
    }
}

fn take2(bytes: &[u8], pos: &mut usize) -> Result<u16> {
    let hi = *bytes.get(*pos).ok_or_else(|| Error::simple(ErrorKind::InvalidDateTime))?;
    let lo = *bytes.get(*pos + 1).ok_or_else(|| Error::simple(ErrorKind::InvalidDateTime))?;
    *pos += 2;
    decode_decimal(hi, lo)
}

fn parse_timezone(bytes: &[u8], pos: usize) -> Result<Asn1TimeZone> {
    match bytes.get(pos) {
        None => Ok(Asn1TimeZone::Undefined),
        Some(b'Z') => {
            if pos + 1 != bytes.len() {
                return Err(Error::simple(ErrorKind::InvalidDateTime));
            }
            Ok(Asn1TimeZone::Z)
        }
        Some(&sign @ (b'+' | b'-')) => {
            let mut p = pos + 1;
            let hh = take2(bytes, &mut p)?;
            let mm = take2(bytes, &mut p)?;
            if p != bytes.len() {
                return Err(Error::simple(ErrorKind::InvalidDateTime));
            }
            let s: i8 = if sign == b'+' { 1 } else { -1 };
            Ok(Asn1TimeZone::Offset(s, hh, mm))
        }
        _ => Err(Error::simple(ErrorKind::InvalidDateTime)),
    }
}

/// Parse an ASN.1 `UTCTime` body: `YYMMDDHHMM[SS](Z|+-HHMM)`.
/// Two-digit years 50-99 map to 1950-1999, 00-49 map to 2000-2049
/// (X.680 clause 46).
pub fn parse_utctime(bytes: &[u8]) -> Result<Asn1DateTime> {
    if bytes.len() < 11 {
        return Err(Error::simple(ErrorKind::InvalidDateTime));
    }
    let mut pos = 0;
    let yy = take2(bytes, &mut pos)?;
    let year = if yy >= 50 { 1900 + yy as u32 } else { 2000 + yy as u32 };
    let month = take2(bytes, &mut pos)?;
    let day = take2(bytes, &mut pos)?;
    let hour = take2(bytes, &mut pos)?;
    let minute = take2(bytes, &mut pos)?;
    let second = if bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        take2(bytes, &mut pos)?
    } else {
        0
    };
    let tz = parse_timezone(bytes, pos)?;
    Ok(Asn1DateTime::new(year, month, day, hour, minute, second, None, tz))
}

/// Parse an ASN.1 `GeneralizedTime` body: `YYYYMMDDHHMM[SS][.fff](Z|+-HHMM|)`.
pub fn parse_generalizedtime(bytes: &[u8]) -> Result<Asn1DateTime> {
    if bytes.len() < 10 {
        return Err(Error::simple(ErrorKind::InvalidDateTime));
    }
    let mut pos = 0;
    let y1 = take2(bytes, &mut pos)?;
    let y2 = take2(bytes, &mut pos)?;
    let year = y1 as u32 * 100 + y2 as u32;
    let month = take2(bytes, &mut pos)?;
    let day = take2(bytes, &mut pos)?;
    let hour = take2(bytes, &mut pos)?;
    let minute = take2(bytes, &mut pos)?;
    let second = if bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        take2(bytes, &mut pos)?
    } else {
        0
    };
    let millisecond = if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos == start {
            return Err(Error::simple(ErrorKind::InvalidDateTime));
        }
        let digits = core::str::from_utf8(&bytes[start..pos])
            .map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?;
        let frac: u32 = digits
            .parse()
            .map_err(|_| Error::simple(ErrorKind::InvalidDateTime))?;
        let scale = 10u32.pow(3u32.saturating_sub(digits.len() as u32));
        Some(frac.saturating_mul(scale))
    } else {
        None
    };
    let tz = parse_timezone(bytes, pos)?;
    Ok(Asn1DateTime::new(
        year,
        month,
        day,
        hour,
        minute,
        second,
        millisecond,
        tz,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utctime_with_seconds_and_z() {
        let dt = parse_utctime(b"920521000000Z").unwrap();
        assert_eq!(dt.year, 1992);
        assert_eq!(dt.month, 5);
        assert_eq!(dt.day, 21);
        assert_eq!(dt.tz, Asn1TimeZone::Z);
    }

    #[test]
    fn utctime_two_digit_rollover() {
        let dt = parse_utctime(b"490101000000Z").unwrap();
        assert_eq!(dt.year, 2049);
        let dt = parse_utctime(b"500101000000Z").unwrap();
        assert_eq!(dt.year, 1950);
    }

    #[test]
    fn generalizedtime_with_fraction() {
        let dt = parse_generalizedtime(b"19920521000000.123Z").unwrap();
        assert_eq!(dt.year, 1992);
        assert_eq!(dt.millisecond, Some(123));
        assert_eq!(dt.tz, Asn1TimeZone::Z);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utctime(b"not-a-date").is_err());
    }

    #[cfg(feature = "datetime")]
    #[test]
    fn converts_to_offset_date_time() {
        let dt = parse_utctime(b"920521000000Z").unwrap();
        let odt = time::OffsetDateTime::try_from(&dt).unwrap();
        assert_eq!(odt.year(), 1992);
        assert_eq!(u8::from(odt.month()), 5);
        assert_eq!(odt.day(), 21);
    }
}
