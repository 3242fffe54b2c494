use serde::{de, Deserialize, Deserializer, Serialize};

/// One complete reading of the sensor board, as served by `/data`.
///
/// Decoding is all-or-nothing: a payload missing any field, or carrying a
/// light channel of neither shape, is rejected instead of producing a partial
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub light: Vec<LightReading>,
    pub gyro: Vector3,
    pub accelerometer: Vector3,
    pub magnetometer: Vector3,
    pub power: Power,
    pub environment: Environment,
    pub air: Air,
    pub tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Power {
    pub vbat: f64,
    pub charging: ChargingStatus,
}

/// The firmware reports "not charging" as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingStatus {
    #[serde(rename = "charging")]
    Charging,
    #[serde(rename = "not-charging", alias = "")]
    NotCharging,
}

impl ChargingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChargingStatus::Charging => "charging",
            ChargingStatus::NotCharging => "not charging",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Air {
    pub raw: f64,
    pub index: f64,
}

/// A single light channel.
///
/// The board omits the discriminant on the wire; the variant is resolved once,
/// while decoding, from whether the element carries `raw`. Re-encoding always
/// writes an explicit `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LightReading {
    Processed { gain: f64, integration: f64, lux: f64 },
    Raw { raw: f64 },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum LightKind {
    Processed,
    Raw,
}

#[derive(Deserialize)]
struct WireLightReading {
    kind: Option<LightKind>,
    raw: Option<f64>,
    gain: Option<f64>,
    integration: Option<f64>,
    lux: Option<f64>,
}

impl<'de> Deserialize<'de> for LightReading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireLightReading::deserialize(deserializer)?;

        let kind = match wire.kind {
            Some(kind) => kind,
            None if wire.raw.is_some() => LightKind::Raw,
            None => LightKind::Processed,
        };

        match kind {
            LightKind::Raw => match wire.raw {
                Some(raw) => Ok(LightReading::Raw { raw }),
                None => Err(de::Error::missing_field("raw")),
            },
            LightKind::Processed => match (wire.gain, wire.integration, wire.lux) {
                (Some(gain), Some(integration), Some(lux)) => Ok(LightReading::Processed {
                    gain,
                    integration,
                    lux,
                }),
                (None, _, _) => Err(de::Error::missing_field("gain")),
                (_, None, _) => Err(de::Error::missing_field("integration")),
                (_, _, None) => Err(de::Error::missing_field("lux")),
            },
        }
    }
}
