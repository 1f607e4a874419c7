use serialport::SerialPort;

use super::error::TransferError;
use crate::config::SerialConfig;

pub fn open(config: &SerialConfig) -> Result<Box<dyn SerialPort>, TransferError> {
    log::info!(
        "Opening serial port {} at {} baud",
        config.port,
        config.baud_rate
    );

    serialport::new(&config.port, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.timeout)
        .open()
        .map_err(|source| TransferError::Open {
            port: config.port.clone(),
            source,
        })
}
