// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! CSV row schemas shared by every recording module.
//!
//! Every module CSV shares a six-column prefix (`trial, module, device_id,
//! label, record_time_unix, record_time_mono`); the remaining columns are
//! specific to the media/device family. These are plain serde-`csv` row
//! structs rather than a generic `Vec<String>` builder so column order and
//! count are checked by the type system, not by hand-counted string joins.

use serde::{Deserialize, Serialize};

/// Columns 1-6 of every module CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardPrefix {
    pub trial: u32,
    pub module: String,
    pub device_id: String,
    pub label: String,
    pub record_time_unix: f64,
    pub record_time_mono: f64,
}

/// Per-frame timing-CSV row for a recording pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingRow {
    pub frame_number: u64,
    pub write_time_unix: f64,
    pub write_time_iso: String,
    pub expected_delta: f64,
    pub actual_delta: f64,
    pub delta_error: f64,
    pub queue_delay: f64,
    pub capture_latency: f64,
    pub write_duration: f64,
    pub queue_backlog_after: u32,
    pub camera_frame_index: Option<u64>,
    pub display_frame_index: u64,
    pub camera_timestamp_unix: Option<f64>,
    pub camera_timestamp_diff: Option<f64>,
    /// Only present for the eye-tracker world-camera pipeline, inserted
    /// immediately after `camera_timestamp_diff`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_timestamp_unix: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_timestamp_diff: Option<f64>,
    pub available_camera_fps: f64,
    pub dropped_frames_total: u64,
    pub duplicates_total: u64,
    pub is_duplicate: u8,
}

/// GPS CSV row: 26 columns total (6-column prefix + 20 NMEA-derived fields).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    /// In `[-90, 90]`.
    pub latitude_deg: f64,
    /// In `[-180, 180]`.
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub speed_knots: f64,
    pub course_deg: f64,
    /// `0` or `1`.
    pub fix_valid: u8,
    pub fix_quality: u8,
    pub num_satellites: u8,
    pub hdop: f64,
    pub vdop: f64,
    pub pdop: f64,
    pub geoid_separation_m: f64,
    pub utc_time: String,
    pub utc_date: String,
    pub mode_2d3d: u8,
    pub dgps_age_s: Option<f64>,
    pub dgps_station_id: Option<u16>,
    pub magnetic_variation_deg: Option<f64>,
    pub true_track_deg: Option<f64>,
    pub nmea_sentence: String,
}

/// Response-time CSV, simple variant: 10 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseTimeRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub stimulus_onset_unix: f64,
    /// `-1` denotes a timeout.
    pub reaction_time_ms: i64,
    pub button_pressed: u8,
    pub timeout: u8,
}

/// Response-time CSV, wireless variant: 11 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseTimeWirelessRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub stimulus_onset_unix: f64,
    pub reaction_time_ms: i64,
    pub button_pressed: u8,
    pub timeout: u8,
    /// In `[0, 100]`.
    pub battery_percent: u8,
}

/// Goggles CSV, simple variant: 8 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GogglesRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub lens_state: String,
    pub event_type: String,
}

/// Goggles CSV, wireless variant: 11 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GogglesWirelessRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    /// `A`, `B`, or `X`.
    pub lens: String,
    pub event_type: String,
    pub battery_percent: u8,
    pub signal_strength: i8,
    pub firmware_version: String,
}

/// Eye-tracker gaze CSV row: 36 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GazeRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub gaze_x: f64,
    pub gaze_y: f64,
    pub gaze_x_left: f64,
    pub gaze_y_left: f64,
    pub gaze_x_right: f64,
    pub gaze_y_right: f64,
    pub pupil_diameter_left: f64,
    pub pupil_diameter_right: f64,
    pub pupil_diameter_left_mm: f64,
    pub pupil_diameter_right_mm: f64,
    pub confidence: f64,
    pub gaze_3d_x: f64,
    pub gaze_3d_y: f64,
    pub gaze_3d_z: f64,
    pub eye_left_3d_x: f64,
    pub eye_left_3d_y: f64,
    pub eye_left_3d_z: f64,
    pub eye_right_3d_x: f64,
    pub eye_right_3d_y: f64,
    pub eye_right_3d_z: f64,
    pub world_timestamp_unix: f64,
    pub world_frame_index: u64,
    pub fixation_id: Option<u32>,
    pub is_fixation: u8,
    pub is_blink: u8,
    pub is_saccade: u8,
    pub gaze_timestamp_unix: f64,
    pub gaze_timestamp_diff: f64,
    pub norm_pos_x: f64,
    pub norm_pos_y: f64,
}

/// Eye-tracker IMU CSV row: 19 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImuRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
    pub quat_w: f64,
    pub quat_x: f64,
    pub quat_y: f64,
    pub quat_z: f64,
}

/// Eye-tracker events CSV row: 24 columns total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EyeTrackerEventRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub event_type: String,
    pub event_label: String,
    pub event_timestamp_unix: f64,
    pub event_timestamp_mono: f64,
    pub duration_ms: f64,
    pub trigger_source: String,
    pub marker_id: Option<u32>,
    pub stimulus_id: Option<u32>,
    pub response_code: Option<i32>,
    pub confidence: f64,
    pub screen_x: Option<f64>,
    pub screen_y: Option<f64>,
    pub aoi_id: Option<u32>,
    pub aoi_label: String,
    pub session_phase: String,
    pub block_number: u32,
    pub repetition_number: u32,
    pub notes: String,
}

/// Notes CSV row: 8 columns total, free-text CSV-escaped by the `csv` crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotesRow {
    #[serde(flatten)]
    pub prefix: StandardPrefix,
    pub note_text: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_len<T: Serialize>(row: &T) -> usize {
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        wtr.serialize(row).unwrap();
        let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        data.lines().next().unwrap().split(',').count()
    }

    fn sample_prefix() -> StandardPrefix {
        StandardPrefix {
            trial: 1,
            module: "GPS".into(),
            device_id: "dev-abc".into(),
            label: "t1".into(),
            record_time_unix: 100.0,
            record_time_mono: 0.5,
        }
    }

    #[test]
    fn gps_row_has_26_columns() {
        let row = GpsRow {
            prefix: sample_prefix(),
            latitude_deg: 45.0,
            longitude_deg: -122.0,
            altitude_m: 10.0,
            speed_knots: 0.0,
            course_deg: 0.0,
            fix_valid: 1,
            fix_quality: 1,
            num_satellites: 8,
            hdop: 0.9,
            vdop: 1.1,
            pdop: 1.4,
            geoid_separation_m: -20.0,
            utc_time: "120000.00".into(),
            utc_date: "010125".into(),
            mode_2d3d: 3,
            dgps_age_s: None,
            dgps_station_id: None,
            magnetic_variation_deg: None,
            true_track_deg: None,
            nmea_sentence: "$GPGGA".into(),
        };
        assert_eq!(header_len(&row), 26);
    }

    #[test]
    fn response_time_rows_have_10_and_11_columns() {
        let simple = ResponseTimeRow {
            prefix: sample_prefix(),
            stimulus_onset_unix: 1.0,
            reaction_time_ms: 250,
            button_pressed: 1,
            timeout: 0,
        };
        assert_eq!(header_len(&simple), 10);

        let wireless = ResponseTimeWirelessRow {
            prefix: sample_prefix(),
            stimulus_onset_unix: 1.0,
            reaction_time_ms: -1,
            button_pressed: 0,
            timeout: 1,
            battery_percent: 80,
        };
        assert_eq!(header_len(&wireless), 11);
    }

    #[test]
    fn goggles_rows_have_8_and_11_columns() {
        let simple = GogglesRow { prefix: sample_prefix(), lens_state: "open".into(), event_type: "blink".into() };
        assert_eq!(header_len(&simple), 8);

        let wireless = GogglesWirelessRow {
            prefix: sample_prefix(),
            lens: "A".into(),
            event_type: "switch".into(),
            battery_percent: 90,
            signal_strength: -40,
            firmware_version: "1.2.0".into(),
        };
        assert_eq!(header_len(&wireless), 11);
    }

    #[test]
    fn eye_tracker_rows_match_spec_column_counts() {
        let gaze = GazeRow {
            prefix: sample_prefix(),
            gaze_x: 0.0,
            gaze_y: 0.0,
            gaze_x_left: 0.0,
            gaze_y_left: 0.0,
            gaze_x_right: 0.0,
            gaze_y_right: 0.0,
            pupil_diameter_left: 0.0,
            pupil_diameter_right: 0.0,
            pupil_diameter_left_mm: 0.0,
            pupil_diameter_right_mm: 0.0,
            confidence: 1.0,
            gaze_3d_x: 0.0,
            gaze_3d_y: 0.0,
            gaze_3d_z: 0.0,
            eye_left_3d_x: 0.0,
            eye_left_3d_y: 0.0,
            eye_left_3d_z: 0.0,
            eye_right_3d_x: 0.0,
            eye_right_3d_y: 0.0,
            eye_right_3d_z: 0.0,
            world_timestamp_unix: 0.0,
            world_frame_index: 0,
            fixation_id: None,
            is_fixation: 0,
            is_blink: 0,
            is_saccade: 0,
            gaze_timestamp_unix: 0.0,
            gaze_timestamp_diff: 0.0,
            norm_pos_x: 0.5,
            norm_pos_y: 0.5,
        };
        assert_eq!(header_len(&gaze), 36);

        let imu = ImuRow {
            prefix: sample_prefix(),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 0.0,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            mag_x: 0.0,
            mag_y: 0.0,
            mag_z: 0.0,
            quat_w: 1.0,
            quat_x: 0.0,
            quat_y: 0.0,
            quat_z: 0.0,
        };
        assert_eq!(header_len(&imu), 19);

        let events = EyeTrackerEventRow {
            prefix: sample_prefix(),
            event_type: "fixation_start".into(),
            event_label: "".into(),
            event_timestamp_unix: 0.0,
            event_timestamp_mono: 0.0,
            duration_ms: 0.0,
            trigger_source: "gaze".into(),
            marker_id: None,
            stimulus_id: None,
            response_code: None,
            confidence: 1.0,
            screen_x: None,
            screen_y: None,
            aoi_id: None,
            aoi_label: "".into(),
            session_phase: "trial".into(),
            block_number: 1,
            repetition_number: 1,
            notes: "".into(),
        };
        assert_eq!(header_len(&events), 24);
    }

    #[test]
    fn notes_row_has_8_columns_and_escapes_free_text() {
        let row = NotesRow {
            prefix: sample_prefix(),
            note_text: "line with, a comma and \"quotes\"".into(),
            author: "operator".into(),
        };
        assert_eq!(header_len(&row), 8);
    }
}
