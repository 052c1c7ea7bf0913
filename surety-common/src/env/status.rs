use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SuretyError;

/// Flight status as reported by oracles.
///
/// The numeric codes are the wire values oracles submit, and the form the
/// status takes when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StatusCode {
    Unknown,
    OnTime,
    /// Delay attributable to the airline. The only status that pays out by default.
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl StatusCode {
    pub const ALL: [StatusCode; 6] = [
        StatusCode::Unknown,
        StatusCode::OnTime,
        StatusCode::LateAirline,
        StatusCode::LateWeather,
        StatusCode::LateTechnical,
        StatusCode::LateOther,
    ];

    pub fn code(self) -> u8 {
        match self {
            StatusCode::Unknown => 0,
            StatusCode::OnTime => 10,
            StatusCode::LateAirline => 20,
            StatusCode::LateWeather => 30,
            StatusCode::LateTechnical => 40,
            StatusCode::LateOther => 50,
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<StatusCode> for u8 {
    fn from(s: StatusCode) -> Self {
        s.code()
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = SuretyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StatusCode::Unknown),
            10 => Ok(StatusCode::OnTime),
            20 => Ok(StatusCode::LateAirline),
            30 => Ok(StatusCode::LateWeather),
            40 => Ok(StatusCode::LateTechnical),
            50 => Ok(StatusCode::LateOther),
            other => Err(SuretyError::InvalidStatusCode(other)),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCode::Unknown => "STATUS_CODE_UNKNOWN",
            StatusCode::OnTime => "STATUS_CODE_ON_TIME",
            StatusCode::LateAirline => "STATUS_CODE_LATE_AIRLINE",
            StatusCode::LateWeather => "STATUS_CODE_LATE_WEATHER",
            StatusCode::LateTechnical => "STATUS_CODE_LATE_TECHNICAL",
            StatusCode::LateOther => "STATUS_CODE_LATE_OTHER",
        };
        write!(f, "{}", s)
    }
}
