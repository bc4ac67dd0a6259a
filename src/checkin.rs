//! Check-in Resolver: the compact QR patient pass.
//!
//! A pass is `{"m": mobile, "n": first_name}` serialized as JSON. It carries
//! no signature or expiry; anyone who knows a mobile number can build one,
//! so resolving a pass only ever reads.

use serde::{Deserialize, Serialize};

use crate::appointment;
use crate::clinic_state::{ClinicError, ClinicState};
use crate::models::Appointment;

/// Shown when a pass carries no name and nothing is on record.
const UNKNOWN_PATIENT: &str = "Scanned patient";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinPayload {
    #[serde(rename = "m")]
    pub mobile: String,
    #[serde(rename = "n", default)]
    pub first_name: String,
}

impl CheckinPayload {
    /// Pass for a patient; only the first word of the name is kept.
    pub fn for_patient(mobile: &str, full_name: &str) -> Self {
        Self {
            mobile: mobile.trim().to_string(),
            first_name: full_name.split_whitespace().next().unwrap_or_default().to_string(),
        }
    }

    /// Parse scanned text. Anything that is not a JSON object with a
    /// well-formed mobile is rejected as `InvalidCheckin`.
    pub fn decode(raw: &str) -> Result<Self, ClinicError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())
            .map_err(|e| ClinicError::InvalidCheckin(e.to_string()))?;
        if !value.is_object() {
            return Err(ClinicError::InvalidCheckin("pass must be a JSON object".into()));
        }
        let payload: CheckinPayload = serde_json::from_value(value)
            .map_err(|e| ClinicError::InvalidCheckin(e.to_string()))?;

        let mobile = payload.mobile.trim();
        if !appointment::is_valid_mobile(mobile) {
            return Err(ClinicError::InvalidCheckin(
                "mobile must be exactly 10 digits".into(),
            ));
        }

        Ok(Self {
            mobile: mobile.to_string(),
            first_name: payload.first_name.trim().to_string(),
        })
    }

    pub fn encode(&self) -> Result<String, ClinicError> {
        serde_json::to_string(self).map_err(|e| ClinicError::InvalidCheckin(e.to_string()))
    }
}

/// What a scanning station needs to pick the visit being checked in.
#[derive(Debug, Clone, Serialize)]
pub struct PatientContext {
    pub mobile: String,
    pub display_name: String,
    /// Newest first.
    pub appointments: Vec<Appointment>,
}

pub fn resolve(state: &ClinicState, payload: &CheckinPayload) -> Result<PatientContext, ClinicError> {
    let appointments = appointment::get_by_mobile(state, &payload.mobile)?;
    let Some(latest) = appointments.first() else {
        tracing::info!("Check-in for unknown patient");
        return Err(ClinicError::PatientNotFound(payload.mobile.clone()));
    };

    // The stored full name beats the truncated one on the pass
    let display_name = if !latest.patient_name.trim().is_empty() {
        latest.patient_name.clone()
    } else if !payload.first_name.is_empty() {
        payload.first_name.clone()
    } else {
        UNKNOWN_PATIENT.to_string()
    };

    tracing::info!(appointments = appointments.len(), "Patient checked in");
    Ok(PatientContext {
        mobile: payload.mobile.clone(),
        display_name,
        appointments,
    })
}

/// Decode then resolve scanned text.
pub fn resolve_raw(state: &ClinicState, raw: &str) -> Result<PatientContext, ClinicError> {
    resolve(state, &CheckinPayload::decode(raw)?)
}

/// Render a pass as an SVG QR code.
pub fn render_qr_svg(payload: &CheckinPayload) -> Result<String, ClinicError> {
    use qrcode::render::svg;
    use qrcode::{EcLevel, QrCode};

    let data = payload.encode()?;
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| ClinicError::InvalidCheckin(format!("QR generation failed: {e}")))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(180, 180)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#2c3e50"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build())
}

/// Rendered entry pass for a patient who has booked at least once.
#[derive(Debug, Clone, Serialize)]
pub struct PatientPass {
    pub payload: String,
    pub svg: String,
}

pub fn patient_pass(state: &ClinicState, mobile: &str) -> Result<PatientPass, ClinicError> {
    let mobile = mobile.trim();
    if !appointment::is_valid_mobile(mobile) {
        return Err(ClinicError::Validation(
            "Mobile number must be exactly 10 digits".into(),
        ));
    }

    let appointments = appointment::get_by_mobile(state, mobile)?;
    let latest = appointments
        .first()
        .ok_or_else(|| ClinicError::PatientNotFound(mobile.to_string()))?;

    let payload = CheckinPayload::for_patient(mobile, &latest.patient_name);
    Ok(PatientPass {
        payload: payload.encode()?,
        svg: render_qr_svg(&payload)?,
    })
}
