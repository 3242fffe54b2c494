mod frame;

pub use frame::{light_table, Frame, LightTable, ProcessedRow, RawRow};

use std::{
    fmt::{self, Write as _},
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use log::warn;

use crate::telemetry::{Snapshot, Vector3};

const TITLE: &str = "ASI Outreach";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Presentation side of the viewer; called on every observable change.
pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame);
}

/// Dashboard text grouped by sensor, redrawn in place on a terminal.
pub struct TextRenderer<W: Write + Send> {
    out: Mutex<W>,
    clear_screen: bool,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: Mutex::new(io::stdout()),
            clear_screen: true,
        }
    }
}

impl<W: Write + Send> TextRenderer<W> {
    /// Appends frames to `out` one after another, without clearing.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            clear_screen: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&self, frame: &Frame) {
        let mut text = String::new();
        if self.clear_screen {
            text.push_str(CLEAR_SCREEN);
        }
        text.push_str(&render_text(frame));

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("failed to draw frame: {err}");
        }
    }
}

/// One JSON object per frame, newline separated.
pub struct JsonRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn render(&self, frame: &Frame) {
        let line = match serde_json::to_string(frame) {
            Ok(line) => line,
            Err(err) => {
                warn!("failed to encode frame: {err}");
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("failed to write frame: {err}");
        }
    }
}

pub fn render_text(frame: &Frame) -> String {
    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = write_frame(&mut text, frame);
    text
}

fn write_frame(out: &mut String, frame: &Frame) -> fmt::Result {
    writeln!(out, "{TITLE}")?;
    writeln!(out)?;

    if frame.has_error {
        match &frame.error {
            Some(message) => writeln!(out, "Error! {message}")?,
            None => writeln!(out, "Error!")?,
        }
        writeln!(out)?;
    }

    let Some(snapshot) = &frame.snapshot else {
        if !frame.has_error {
            writeln!(out, "Waiting for data...")?;
        }
        return Ok(());
    };

    write_light(out, snapshot)?;
    write_vector(out, "Gyroscope", &snapshot.gyro)?;
    write_vector(out, "Accelerometer", &snapshot.accelerometer)?;
    write_vector(out, "Magnetometer", &snapshot.magnetometer)?;

    writeln!(out, "Power")?;
    writeln!(out, "  {:<16} {}", "Battery Voltage", snapshot.power.vbat)?;
    writeln!(out, "  {:<16} {}", "Battery Status", snapshot.power.charging.label())?;
    writeln!(out)?;

    writeln!(out, "Environment")?;
    writeln!(out, "  {:<16} {}", "Temperature", snapshot.environment.temperature)?;
    writeln!(out, "  {:<16} {}", "Humidity", snapshot.environment.humidity)?;
    writeln!(out, "  {:<16} {}", "Pressure", snapshot.environment.pressure)?;
    writeln!(out)?;

    writeln!(out, "Air")?;
    writeln!(out, "  {:<16} {}", "Index", snapshot.air.index)?;
    writeln!(out, "  {:<16} {}", "Raw", snapshot.air.raw)?;
    writeln!(out)?;

    writeln!(out, "Absolute Tick")?;
    writeln!(out, "  {}", snapshot.tick)?;
    writeln!(out)?;

    writeln!(out, "Relative Tick")?;
    match frame.relative_tick {
        Some(relative) => writeln!(out, "  {relative}")?,
        None => writeln!(out, "  -")?,
    }

    Ok(())
}

fn write_light(out: &mut String, snapshot: &Snapshot) -> fmt::Result {
    let table = light_table(&snapshot.light);

    writeln!(out, "Light")?;
    writeln!(out, "  {:>4} {:>8} {:>12} {:>12}", "Ch", "Gain", "Integration", "Lux")?;
    for row in &table.processed {
        writeln!(
            out,
            "  {:>4} {:>8} {:>12} {:>12}",
            row.channel, row.gain, row.integration, row.lux
        )?;
    }
    writeln!(out)?;

    if !table.raw.is_empty() {
        writeln!(out, "Light (raw)")?;
        for row in &table.raw {
            writeln!(out, "  {:>4} {:>8}", row.channel, row.raw)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_vector(out: &mut String, title: &str, vector: &Vector3) -> fmt::Result {
    writeln!(out, "{title}")?;
    writeln!(out, "  x {}", vector.x)?;
    writeln!(out, "  y {}", vector.y)?;
    writeln!(out, "  z {}", vector.z)?;
    writeln!(out)
}
