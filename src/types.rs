use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailer category a load requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentType {
    #[serde(rename = "Dry Van")]
    DryVan,
    Flatbed,
    Reefer,
}

impl FromStr for EquipmentType {
    type Err = ();

    /// Parse from a query parameter, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dry van" => Ok(Self::DryVan),
            "flatbed" => Ok(Self::Flatbed),
            "reefer" => Ok(Self::Reefer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryVan => write!(f, "Dry Van"),
            Self::Flatbed => write!(f, "Flatbed"),
            Self::Reefer => write!(f, "Reefer"),
        }
    }
}

/// A freight shipment opportunity from the load board.
///
/// Only origin, destination, and equipment_type participate in search
/// matching; everything else is pass-through metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub load_id: String,
    pub origin: String,
    pub destination: String,
    pub pickup_datetime: String,
    pub delivery_datetime: String,
    pub equipment_type: EquipmentType,
    pub loadboard_rate: f64,
    #[serde(default)]
    pub notes: String,
    pub weight: u32,
    pub commodity_type: String,
    pub num_of_pieces: u32,
    pub miles: u32,
    pub dimensions: String,
}

/// Eligibility verdict for a carrier.
///
/// Absence from the registry is a business outcome, not an error; upstream
/// failures surface as `VerifyError::UpstreamUnavailable` instead of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarrierStatus {
    Eligible,
    Ineligible,
    NotFound,
}

impl fmt::Display for CarrierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eligible => write!(f, "ELIGIBLE"),
            Self::Ineligible => write!(f, "INELIGIBLE"),
            Self::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// Normalized result of a carrier lookup
#[derive(Debug, Clone, Serialize)]
pub struct CarrierRecord {
    pub mc_number: String,
    pub status: CarrierStatus,
    pub company_name: Option<String>,
    pub safety_rating: Option<String>,
    pub operating_status: Option<String>,
    pub message: String,
}

impl CarrierRecord {
    pub fn is_eligible(&self) -> bool {
        self.status == CarrierStatus::Eligible
    }

    /// Record for an MC number the registry does not know
    pub fn not_found(mc_number: &str) -> Self {
        Self {
            mc_number: mc_number.to_string(),
            status: CarrierStatus::NotFound,
            company_name: None,
            safety_rating: None,
            operating_status: None,
            message: "Carrier not found in FMCSA database".to_string(),
        }
    }
}

/// Top-level FMCSA carrier lookup response
#[derive(Debug, Deserialize)]
pub struct FmcsaResponse {
    #[serde(default)]
    pub content: Option<FmcsaContent>,
}

#[derive(Debug, Deserialize)]
pub struct FmcsaContent {
    #[serde(default)]
    pub carrier: Option<FmcsaCarrier>,
}

/// Carrier payload as FMCSA returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmcsaCarrier {
    pub legal_name: Option<String>,
    pub dba_name: Option<String>,
    pub allowed_to_operate: Option<String>,
    pub status_code: Option<String>,
    pub safety_rating: Option<String>,
    pub oos_date: Option<String>,
}

impl FmcsaCarrier {
    /// Eligible when allowed to operate and not out of service
    pub fn is_eligible(&self) -> bool {
        self.allowed_to_operate.as_deref() == Some("Y") && self.oos_date.is_none()
    }

    pub fn operating_status(&self) -> &'static str {
        if self.oos_date.is_some() {
            "Out of Service"
        } else if self.allowed_to_operate.as_deref() == Some("Y") {
            "Active"
        } else {
            "Not Authorized"
        }
    }

    /// Legal name, falling back to the DBA name
    pub fn display_name(&self) -> Option<String> {
        self.legal_name
            .clone()
            .or_else(|| self.dba_name.clone())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_type_parse() {
        assert_eq!("Dry Van".parse::<EquipmentType>(), Ok(EquipmentType::DryVan));
        assert_eq!("dry van".parse::<EquipmentType>(), Ok(EquipmentType::DryVan));
        assert_eq!("FLATBED".parse::<EquipmentType>(), Ok(EquipmentType::Flatbed));
        assert_eq!(" reefer ".parse::<EquipmentType>(), Ok(EquipmentType::Reefer));
        assert!("Box Truck".parse::<EquipmentType>().is_err());
        assert!("".parse::<EquipmentType>().is_err());
    }

    #[test]
    fn test_equipment_type_wire_form() {
        let json = serde_json::to_string(&EquipmentType::DryVan).unwrap();
        assert_eq!(json, "\"Dry Van\"");
        let parsed: EquipmentType = serde_json::from_str("\"Reefer\"").unwrap();
        assert_eq!(parsed, EquipmentType::Reefer);
    }

    #[test]
    fn test_fmcsa_eligibility() {
        let carrier = FmcsaCarrier {
            legal_name: Some("ABC Trucking LLC".to_string()),
            dba_name: None,
            allowed_to_operate: Some("Y".to_string()),
            status_code: Some("A".to_string()),
            safety_rating: Some("Satisfactory".to_string()),
            oos_date: None,
        };
        assert!(carrier.is_eligible());
        assert_eq!(carrier.operating_status(), "Active");

        let out_of_service = FmcsaCarrier {
            oos_date: Some("2024-01-15".to_string()),
            ..carrier
        };
        assert!(!out_of_service.is_eligible());
        assert_eq!(out_of_service.operating_status(), "Out of Service");
    }

    #[test]
    fn test_fmcsa_not_authorized() {
        let carrier = FmcsaCarrier {
            legal_name: None,
            dba_name: Some("XYZ Transport".to_string()),
            allowed_to_operate: Some("N".to_string()),
            status_code: None,
            safety_rating: None,
            oos_date: None,
        };
        assert!(!carrier.is_eligible());
        assert_eq!(carrier.operating_status(), "Not Authorized");
        assert_eq!(carrier.display_name().as_deref(), Some("XYZ Transport"));
    }

    #[test]
    fn test_fmcsa_wire_parse() {
        let body = r#"{
            "content": {
                "carrier": {
                    "legalName": "ABC Trucking LLC",
                    "dbaName": null,
                    "allowedToOperate": "Y",
                    "statusCode": "A",
                    "safetyRating": "Satisfactory",
                    "oosDate": null
                }
            }
        }"#;
        let parsed: FmcsaResponse = serde_json::from_str(body).unwrap();
        let carrier = parsed.content.unwrap().carrier.unwrap();
        assert!(carrier.is_eligible());
        assert_eq!(carrier.display_name().as_deref(), Some("ABC Trucking LLC"));
    }

    #[test]
    fn test_fmcsa_empty_content() {
        let parsed: FmcsaResponse = serde_json::from_str("{\"content\": null}").unwrap();
        assert!(parsed.content.is_none());
        let parsed: FmcsaResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.content.is_none());
    }
}
