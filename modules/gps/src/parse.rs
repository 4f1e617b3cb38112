// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Minimal GPGGA parser. No NMEA crate is pulled in for this: the format is
//! one comma-split line, the same reasoning the core crate gives for
//! hand-rolling session timestamp formatting instead of a date library.

pub struct GpggaParsed {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub fix_quality: u8,
    pub num_satellites: u8,
    pub hdop: f64,
    pub geoid_separation_m: f64,
    pub utc_time: String,
}

/// Parse a `$GPGGA,...*hh` sentence. Returns `None` on anything malformed
/// rather than panicking: a corrupt line from the source should degrade to
/// a skipped fix, not crash the capture loop.
pub fn parse_gpgga(sentence: &str) -> Option<GpggaParsed> {
    let body = sentence.strip_prefix('$')?;
    let (body, _checksum) = body.split_once('*')?;
    let body = body.strip_prefix("GPGGA,")?;
    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 13 {
        return None;
    }

    let utc_time = fields[0].to_string();
    let latitude_deg = parse_coord(fields[1], fields[2])?;
    let longitude_deg = parse_coord(fields[3], fields[4])?;
    let fix_quality: u8 = fields[5].parse().ok()?;
    let num_satellites: u8 = fields[6].parse().ok()?;
    let hdop: f64 = fields[7].parse().ok()?;
    let altitude_m: f64 = fields[8].parse().ok()?;
    let geoid_separation_m: f64 = fields[10].parse().ok()?;

    Some(GpggaParsed { latitude_deg, longitude_deg, altitude_m, fix_quality, num_satellites, hdop, geoid_separation_m, utc_time })
}

fn parse_coord(raw: &str, hemisphere: &str) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_sentence() {
        let sentence = "$GPGGA,123519.00,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
        let parsed = parse_gpgga(sentence).unwrap();
        assert!((parsed.latitude_deg - 48.1173).abs() < 1e-3);
        assert!((parsed.longitude_deg - 11.5167).abs() < 1e-3);
        assert_eq!(parsed.fix_quality, 1);
        assert_eq!(parsed.num_satellites, 8);
    }

    #[test]
    fn rejects_truncated_sentence() {
        assert!(parse_gpgga("$GPGGA,123519.00").is_none());
    }

    #[test]
    fn southern_and_western_hemispheres_negate() {
        let sentence = "$GPGGA,000000.00,3351.000,S,01131.000,W,1,08,0.9,10.0,M,-20.0,M,,*00";
        let parsed = parse_gpgga(sentence).unwrap();
        assert!(parsed.latitude_deg < 0.0);
        assert!(parsed.longitude_deg < 0.0);
    }
}
