use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::telemetry::{LightReading, Snapshot};

/// Everything a renderer needs to draw one state of the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Latest good snapshot; kept after an error so the display freezes
    /// rather than blanks.
    pub snapshot: Option<Snapshot>,
    pub has_error: bool,
    pub error: Option<String>,
    pub relative_tick: Option<i64>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessedRow {
    pub channel: usize,
    pub gain: f64,
    pub integration: f64,
    pub lux: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRow {
    pub channel: usize,
    pub raw: f64,
}

/// Light channels split by variant. Each channel lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightTable {
    pub processed: Vec<ProcessedRow>,
    pub raw: Vec<RawRow>,
}

pub fn light_table(light: &[LightReading]) -> LightTable {
    let mut table = LightTable::default();
    for (channel, reading) in light.iter().enumerate() {
        match *reading {
            LightReading::Processed {
                gain,
                integration,
                lux,
            } => table.processed.push(ProcessedRow {
                channel,
                gain,
                integration,
                lux,
            }),
            LightReading::Raw { raw } => table.raw.push(RawRow { channel, raw }),
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_channel_has_one_interpretation() {
        let light = vec![
            LightReading::Processed {
                gain: 1.0,
                integration: 100.0,
                lux: 20.0,
            },
            LightReading::Raw { raw: 900.0 },
            LightReading::Processed {
                gain: 16.0,
                integration: 400.0,
                lux: 0.5,
            },
            LightReading::Raw { raw: 12.0 },
        ];

        let table = light_table(&light);

        let mut channels: Vec<usize> = table
            .processed
            .iter()
            .map(|row| row.channel)
            .chain(table.raw.iter().map(|row| row.channel))
            .collect();
        channels.sort_unstable();
        assert_eq!(channels, vec![0, 1, 2, 3]);

        assert_eq!(
            table.processed.iter().map(|r| r.channel).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(table.raw, vec![RawRow { channel: 1, raw: 900.0 }, RawRow { channel: 3, raw: 12.0 }]);
    }

    #[test]
    fn empty_light_gives_empty_table() {
        assert_eq!(light_table(&[]), LightTable::default());
    }
}
