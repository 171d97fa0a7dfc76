//! Terminal stand-in for the map: turns typed lines into pin/request actions
//! and renders the update log as a numbered list.

use ride_core::{RidePhase, RideState};
use shared::{domain::Coordinate, error::CoordinateError};
use thiserror::Error;

pub const HELP: &str = "commands: pin <lat> <lng> | request | status | help | quit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceCommand {
    Pin(Coordinate),
    Request,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: pin <lat> <lng>")]
    PinUsage,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Blank lines and `#` comments parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<SurfaceCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "pin" | "click" => {
            let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(ParseError::PinUsage);
            };
            let lat = parse_degrees(lat)?;
            let lng = parse_degrees(lng)?;
            SurfaceCommand::Pin(Coordinate::new(lat, lng)?)
        }
        "request" | "r" => SurfaceCommand::Request,
        "status" | "s" => SurfaceCommand::Status,
        "help" | "?" => SurfaceCommand::Help,
        "quit" | "exit" | "q" => SurfaceCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_degrees(raw: &str) -> Result<f64, ParseError> {
    raw.trim_end_matches(',')
        .parse::<f64>()
        .map_err(|_| ParseError::NotANumber(raw.to_string()))
}

pub fn render_update(position: usize, line: &str) -> String {
    format!("{position:>3}. {line}")
}

pub fn render_log(state: &RideState) -> String {
    state
        .updates()
        .iter()
        .enumerate()
        .map(|(i, line)| render_update(i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(state: &RideState) -> String {
    let pin = state
        .pin()
        .map_or_else(|| "none".to_string(), |pin| pin.to_string());
    let phase = match state.phase() {
        RidePhase::Idle => "idle",
        RidePhase::Requesting => "requesting",
        RidePhase::Completed => "completed",
        RidePhase::Failed => "failed",
    };
    let request = if state.request_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    format!("pin: {pin} | ride: {phase} | request: {request}")
}

/// Shown instead of the ride controls when no ride API is configured.
pub fn auth_panel(token: Option<&str>) -> String {
    let token = token.unwrap_or("<no active session>");
    format!(
        "Successfully Authenticated!\n\
         This page is not functional yet because there is no API configured.\n\
         Here is your authentication token:\n\
         {token}"
    )
}
