//! Request and response bodies for pixel placement.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::IpcError;

/// Single pixel placement.
///
/// The devnet client sends every field as a decimal string, the admin
/// client sends numbers; both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacePixelRequest {
    #[serde(deserialize_with = "number_or_string")]
    pub position: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub color: u32,
    /// Seconds since the epoch, as reported by the client
    #[serde(deserialize_with = "number_or_string")]
    pub timestamp: u64,
}

/// One entry of an extra-pixels batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPixel {
    pub position: u64,
    pub color_id: u32,
}

/// Batch of pixels placed in one settlement call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPixelsRequest {
    pub extra_pixels: Vec<ExtraPixel>,
    pub timestamp: u64,
}

/// Summary of a settled batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPixelsPlaced {
    pub pixels_placed: usize,
    pub positions: Vec<u64>,
    pub colors: Vec<u32>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPixelsResponse {
    pub message: String,
    pub data: ExtraPixelsPlaced,
}

impl From<ExtraPixelsPlaced> for ExtraPixelsResponse {
    fn from(data: ExtraPixelsPlaced) -> Self {
        Self {
            message: "Extra pixels placed successfully".to_string(),
            data,
        }
    }
}

/// Most recent placer of a pixel as recorded by the placement log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelInfo {
    /// Hex account address without the `0x` prefix
    pub address: String,
    /// Registered display name, empty when the account has none
    #[serde(rename = "username", default)]
    pub name: String,
}

/// Decode a JSON request body
pub fn parse_request<T: DeserializeOwned>(body: &str) -> Result<T, IpcError> {
    if body.trim().is_empty() {
        return Err(IpcError::InvalidFormat("empty request body".to_string()));
    }
    Ok(serde_json::from_str(body)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + std::str::FromStr,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => {
            T::try_from(n).map_err(|_| de::Error::custom(format!("{} is out of range", n)))
        }
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("{:?} is not an unsigned integer", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_pixel_numbers() {
        let req: PlacePixelRequest =
            parse_request(r#"{"position": 17, "color": 3, "timestamp": 1000}"#).unwrap();
        assert_eq!(
            req,
            PlacePixelRequest {
                position: 17,
                color: 3,
                timestamp: 1000
            }
        );
    }

    #[test]
    fn test_place_pixel_strings() {
        let req: PlacePixelRequest =
            parse_request(r#"{"position": "17", "color": "3", "timestamp": "1000"}"#).unwrap();
        assert_eq!(req.position, 17);
        assert_eq!(req.color, 3);
        assert_eq!(req.timestamp, 1000);
    }

    #[test]
    fn test_place_pixel_requires_timestamp() {
        let err = parse_request::<PlacePixelRequest>(r#"{"position": "1", "color": "2"}"#)
            .unwrap_err();
        assert!(matches!(err, IpcError::Serialize(_)));
    }

    #[test]
    fn test_place_pixel_rejects_negative() {
        let quoted = r#"{"position": "-1", "color": 2, "timestamp": 1}"#;
        assert!(parse_request::<PlacePixelRequest>(quoted).is_err());
        let bare = r#"{"position": -1, "color": 2, "timestamp": 1}"#;
        assert!(parse_request::<PlacePixelRequest>(bare).is_err());
    }

    #[test]
    fn test_color_overflow_rejected() {
        let body = r#"{"position": 1, "color": 4294967296, "timestamp": 1}"#;
        assert!(parse_request::<PlacePixelRequest>(body).is_err());
    }

    #[test]
    fn test_empty_body() {
        let err = parse_request::<PlacePixelRequest>("  ").unwrap_err();
        assert!(matches!(err, IpcError::InvalidFormat(_)));
    }

    #[test]
    fn test_extra_pixels_camel_case() {
        let body = r#"{
            "extraPixels": [
                { "position": 5, "colorId": 2 },
                { "position": 9, "colorId": 0 }
            ],
            "timestamp": 1000
        }"#;
        let req: ExtraPixelsRequest = parse_request(body).unwrap();
        assert_eq!(req.extra_pixels.len(), 2);
        assert_eq!(req.extra_pixels[0], ExtraPixel { position: 5, color_id: 2 });
        assert_eq!(req.timestamp, 1000);
    }

    #[test]
    fn test_extra_pixels_response_shape() {
        let response = ExtraPixelsResponse::from(ExtraPixelsPlaced {
            pixels_placed: 2,
            positions: vec![5, 9],
            colors: vec![2, 0],
            timestamp: 1000,
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["message"], "Extra pixels placed successfully");
        assert_eq!(value["data"]["pixelsPlaced"], 2);
        assert_eq!(value["data"]["positions"], serde_json::json!([5, 9]));
        assert_eq!(value["data"]["colors"], serde_json::json!([2, 0]));
    }

    #[test]
    fn test_pixel_info_username_field() {
        let info: PixelInfo = parse_request(r#"{"address": "abc", "username": "ada"}"#).unwrap();
        assert_eq!(info.name, "ada");
    }
}
