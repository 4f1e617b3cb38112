// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Serial/TTY NMEA input is an external collaborator; this crate only
//! defines the seam and a synthetic generator standing in for it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::parse::parse_gpgga;

/// One parsed GPGGA fix, plus the sentence it was derived from.
pub struct GpsFix {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub fix_valid: bool,
    pub fix_quality: u8,
    pub num_satellites: u8,
    pub hdop: f64,
    pub geoid_separation_m: f64,
    pub utc_time: String,
    pub nmea_sentence: String,
}

#[async_trait::async_trait]
pub trait NmeaSource: Send + Sync {
    async fn next_fix(&self) -> GpsFix;
}

/// Walks a straight-line track from a fixed origin, one GPGGA sentence per
/// call, standing in for a real GPS receiver.
pub struct SyntheticNmeaSource {
    origin_lat: f64,
    origin_lon: f64,
    tick: AtomicU64,
}

impl SyntheticNmeaSource {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        Self { origin_lat, origin_lon, tick: AtomicU64::new(0) }
    }
}

#[async_trait::async_trait]
impl NmeaSource for SyntheticNmeaSource {
    async fn next_fix(&self) -> GpsFix {
        let n = self.tick.fetch_add(1, Ordering::SeqCst);
        // ~1.1 m per tick north-east, enough to show movement without the
        // fix ever becoming physically implausible within a short session.
        let lat = self.origin_lat + (n as f64) * 0.00001;
        let lon = self.origin_lon + (n as f64) * 0.00001;
        let altitude_m = 10.0 + (n % 5) as f64;
        let num_satellites = 8 + (n % 4) as u8;
        let utc_time = format!("{:02}{:02}{:02}.00", (n / 3600) % 24, (n / 60) % 60, n % 60);

        let sentence = build_gpgga(&utc_time, lat, lon, 1, num_satellites, 0.9, altitude_m);
        GpsFix {
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_m,
            fix_valid: true,
            fix_quality: 1,
            num_satellites,
            hdop: 0.9,
            geoid_separation_m: -20.0,
            utc_time,
            nmea_sentence: sentence,
        }
    }
}

/// Reads `$GPGGA` lines from a serial device or FIFO at `path`, one per
/// call, re-opening on EOF (a disconnected receiver looks like a closed
/// file, not a process crash). Malformed or non-GGA lines are skipped
/// rather than surfaced, matching [`parse_gpgga`]'s degrade-to-skip
/// contract.
pub struct SerialLineNmeaSource {
    path: PathBuf,
}

impl SerialLineNmeaSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn open_reader(&self) -> Option<BufReader<tokio::fs::File>> {
        match tokio::fs::File::open(&self.path).await {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to open GPS serial source");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl NmeaSource for SerialLineNmeaSource {
    async fn next_fix(&self) -> GpsFix {
        loop {
            let Some(mut reader) = self.open_reader().await else {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            };
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF: re-open
                    Ok(_) => {
                        if let Some(parsed) = parse_gpgga(line.trim_end()) {
                            return GpsFix {
                                latitude_deg: parsed.latitude_deg,
                                longitude_deg: parsed.longitude_deg,
                                altitude_m: parsed.altitude_m,
                                fix_valid: parsed.fix_quality > 0,
                                fix_quality: parsed.fix_quality,
                                num_satellites: parsed.num_satellites,
                                hdop: parsed.hdop,
                                geoid_separation_m: parsed.geoid_separation_m,
                                utc_time: parsed.utc_time,
                                nmea_sentence: line.trim_end().to_string(),
                            };
                        }
                    }
                    Err(e) => {
                        tracing::warn!(path = %self.path.display(), error = %e, "GPS serial read error");
                        break;
                    }
                }
            }
        }
    }
}

fn to_nmea_coord(decimal_deg: f64) -> (f64, bool) {
    let hemisphere_positive = decimal_deg >= 0.0;
    let magnitude = decimal_deg.abs();
    let degrees = magnitude.trunc();
    let minutes = (magnitude - degrees) * 60.0;
    (degrees * 100.0 + minutes, hemisphere_positive)
}

fn build_gpgga(utc_time: &str, lat: f64, lon: f64, fix_quality: u8, satellites: u8, hdop: f64, altitude_m: f64) -> String {
    let (lat_val, lat_pos) = to_nmea_coord(lat);
    let (lon_val, lon_pos) = to_nmea_coord(lon);
    let lat_hemi = if lat_pos { 'N' } else { 'S' };
    let lon_hemi = if lon_pos { 'E' } else { 'W' };
    let body = format!(
        "GPGGA,{utc_time},{lat_val:09.4},{lat_hemi},{lon_val:010.4},{lon_hemi},{fix_quality},{satellites:02},{hdop:.1},{altitude_m:.1},M,-20.0,M,,"
    );
    let checksum = nmea_checksum(&body);
    format!("${body}*{checksum:02X}")
}

fn nmea_checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_source_emits_well_formed_gpgga_with_valid_checksum() {
        let source = SyntheticNmeaSource::new(45.0, -122.0);
        let fix = source.next_fix().await;
        assert!(fix.nmea_sentence.starts_with("$GPGGA,"));
        let (body, checksum) = fix.nmea_sentence[1..].split_once('*').unwrap();
        let expected = nmea_checksum(body);
        assert_eq!(u8::from_str_radix(checksum, 16).unwrap(), expected);
    }

    #[tokio::test]
    async fn successive_fixes_advance_position() {
        let source = SyntheticNmeaSource::new(45.0, -122.0);
        let first = source.next_fix().await;
        let second = source.next_fix().await;
        assert!(second.latitude_deg > first.latitude_deg);
    }
}
