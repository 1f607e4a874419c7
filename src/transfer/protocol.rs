use log::{debug, info, warn};
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use strum_macros::Display;

use super::clock::Clock;
use super::error::{LinkError, TransferError};
use crate::abort::AbortSignal;
use crate::steps::{PackedPoint, PassStart};

/// Ready/ack token exchanged in both directions.
pub const READY: u8 = 0x01;
/// Result byte: plan written to the device's persistent memory.
pub const STORED: u8 = 0x01;
/// Result byte: persistent memory missing or write failed.
pub const STORAGE_FAILED: u8 = 0x02;

const AZ_DIR_WIDTH: usize = 4;
const START_AZ_WIDTH: usize = 7;
const NANOS_PER_SECOND: u32 = 1_000_000_000;
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Start,
    TimeSync,
    AlarmTime,
    Metadata,
    SignedStart,
    PointStream,
    Result,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferSettings {
    /// Upper bound for every wait on the device.
    pub handshake_timeout: Duration,
    /// Points sent between two flow-control handshakes.
    pub flow_control_interval: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
            flow_control_interval: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOutcome {
    Stored,
    StorageFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub outcome: StorageOutcome,
    pub device_time_unix: i64,
    pub points_sent: usize,
    pub bytes_sent: usize,
    /// Ready bytes consumed, phase entries and flow-control checkpoints alike.
    pub ready_waits: usize,
}

/// Everything sent before the point stream, encoded up front so that
/// values which cannot be represented fail before the link is touched.
struct Header {
    alarm: [u8; 4],
    metadata: [[u8; 4]; 3],
    az_dir: Vec<u8>,
    start_az: Vec<u8>,
}

impl Header {
    fn encode(start: &PassStart) -> Result<Self, TransferError> {
        Ok(Self {
            alarm: encode_u32(Phase::AlarmTime, "orbit_start_unix", start.orbit_start_unix)?,
            metadata: [
                encode_u32(Phase::Metadata, "point_count", start.point_count as i64)?,
                encode_u32(Phase::Metadata, "start_elev_steps", start.start_elev_steps)?,
                encode_u32(
                    Phase::Metadata,
                    "elev_dir_change_ms",
                    start.elev_dir_change_ms as i64,
                )?,
            ],
            az_dir: encode_ascii(Phase::SignedStart, "az_dir", start.az_dir as i64, AZ_DIR_WIDTH)?,
            start_az: encode_ascii(
                Phase::SignedStart,
                "start_az_steps",
                start.start_az_steps,
                START_AZ_WIDTH,
            )?,
        })
    }
}

/// One upload of a pass to the device. The port is owned for the whole exchange.
pub struct Transfer<P, C> {
    port: P,
    clock: C,
    settings: TransferSettings,
    abort: AbortSignal,
    phase: Phase,
    bytes_sent: usize,
    ready_waits: usize,
}

impl<P: Read + Write, C: Clock> Transfer<P, C> {
    pub fn new(port: P, clock: C, settings: TransferSettings, abort: AbortSignal) -> Self {
        Self {
            port,
            clock,
            settings,
            abort,
            phase: Phase::Start,
            bytes_sent: 0,
            ready_waits: 0,
        }
    }

    pub fn run(
        mut self,
        start: &PassStart,
        points: &[PackedPoint],
    ) -> Result<TransferReport, TransferError> {
        if start.point_count as usize != points.len() {
            return Err(TransferError::PointCountMismatch {
                declared: start.point_count,
                actual: points.len(),
            });
        }
        let header = Header::encode(start)?;

        info!("Announcing transfer of {} points", points.len());
        self.send(&[READY])?;

        self.enter(Phase::TimeSync)?;
        let device_time_unix = self.align_to_next_second();
        let now = encode_u32(Phase::TimeSync, "device_time", device_time_unix)?;
        self.send(&now)?;

        self.enter(Phase::AlarmTime)?;
        self.send(&header.alarm)?;

        self.enter(Phase::Metadata)?;
        for field in &header.metadata {
            self.send(field)?;
        }

        self.enter(Phase::SignedStart)?;
        self.send(&header.az_dir)?;
        self.send(&header.start_az)?;

        self.enter(Phase::PointStream)?;
        let interval = self.settings.flow_control_interval;
        for (i, point) in points.iter().enumerate() {
            if interval > 0 && i > 0 && i % interval == 0 {
                debug!("Flow-control checkpoint at point {}", i);
                self.wait_ready()?;
            }
            self.send(&point.to_be_bytes())?;
        }
        self.port
            .flush()
            .map_err(|e| self.link_error(LinkError::Io(e)))?;

        self.phase = Phase::Result;
        let deadline = self.deadline();
        let outcome = match self.next_byte(deadline)? {
            STORED => {
                info!("Device stored {} points", points.len());
                StorageOutcome::Stored
            }
            STORAGE_FAILED => {
                warn!("Device received the plan but could not store it");
                StorageOutcome::StorageFailed
            }
            byte => return Err(TransferError::Desync { byte }),
        };

        Ok(TransferReport {
            outcome,
            device_time_unix,
            points_sent: points.len(),
            bytes_sent: self.bytes_sent,
            ready_waits: self.ready_waits,
        })
    }

    fn enter(&mut self, phase: Phase) -> Result<(), TransferError> {
        self.phase = phase;
        self.wait_ready()?;
        info!("Entering {} phase", phase);
        Ok(())
    }

    /// Sleeps until the next whole second and returns it as UNIX time.
    fn align_to_next_second(&self) -> i64 {
        let now = self.clock.now();
        let subsec = now.timestamp_subsec_nanos().min(NANOS_PER_SECOND - 1);
        if subsec == 0 {
            return now.timestamp();
        }
        self.clock
            .sleep(Duration::from_nanos((NANOS_PER_SECOND - subsec) as u64));
        now.timestamp() + 1
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.port
            .write_all(bytes)
            .map_err(|e| self.link_error(LinkError::Io(e)))?;
        self.bytes_sent += bytes.len();
        Ok(())
    }

    /// Discarded bytes share the budget of the wait they arrived in.
    fn wait_ready(&mut self) -> Result<(), TransferError> {
        let deadline = self.deadline();
        loop {
            let byte = self.next_byte(deadline)?;
            if byte == READY {
                self.ready_waits += 1;
                return Ok(());
            }
            debug!(
                "Discarding byte 0x{:02x} while waiting for ready in {} phase",
                byte, self.phase
            );
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.settings.handshake_timeout
    }

    fn next_byte(&mut self, deadline: Instant) -> Result<u8, TransferError> {
        let mut buf = [0u8; 1];
        loop {
            if self.abort.is_aborted() {
                let reason = self.abort.reason().unwrap_or_default();
                return Err(self.link_error(LinkError::Cancelled(reason)));
            }

            if Instant::now() >= deadline {
                return Err(
                    self.link_error(LinkError::Timeout(self.settings.handshake_timeout))
                );
            }

            match self.port.read(&mut buf) {
                Ok(0) => return Err(self.link_error(LinkError::Closed)),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::sleep(IDLE_BACKOFF),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
                Err(e) => return Err(self.link_error(LinkError::Io(e))),
            }
        }
    }

    fn link_error(&self, source: LinkError) -> TransferError {
        TransferError::Link {
            phase: self.phase,
            bytes_sent: self.bytes_sent,
            source,
        }
    }
}

fn encode_u32(phase: Phase, field: &'static str, value: i64) -> Result<[u8; 4], TransferError> {
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| TransferError::Encoding {
            phase,
            field,
            value,
        })
}

/// Zero-padded decimal, sign first: `-1` in 4 bytes is `-001`.
fn encode_ascii(
    phase: Phase,
    field: &'static str,
    value: i64,
    width: usize,
) -> Result<Vec<u8>, TransferError> {
    let text = format!("{:0width$}", value, width = width);
    if text.len() != width {
        return Err(TransferError::Encoding {
            phase,
            field,
            value,
        });
    }
    Ok(text.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_fields_are_zero_padded() {
        assert_eq!(encode_ascii(Phase::SignedStart, "az_dir", 1, 4).unwrap(), b"0001");
        assert_eq!(encode_ascii(Phase::SignedStart, "az_dir", -1, 4).unwrap(), b"-001");
        assert_eq!(
            encode_ascii(Phase::SignedStart, "start_az_steps", -1234, 7).unwrap(),
            b"-001234"
        );
        assert_eq!(
            encode_ascii(Phase::SignedStart, "start_az_steps", 3199, 7).unwrap(),
            b"0003199"
        );
    }

    #[test]
    fn ascii_field_too_wide() {
        let err = encode_ascii(Phase::SignedStart, "start_az_steps", -1_000_000, 7).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Encoding {
                field: "start_az_steps",
                ..
            }
        ));
    }

    #[test]
    fn negative_binary_field_is_rejected() {
        assert_eq!(
            encode_u32(Phase::Metadata, "x", 0x0102_0304).unwrap(),
            [1, 2, 3, 4]
        );
        assert!(encode_u32(Phase::Metadata, "start_elev_steps", -3).is_err());
    }
}
