//! Channel data transfer commands

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use wk2132_core::bus::I2cMaster;
use wk2132_core::register::{ChannelRegister, Scr};
use wk2132_core::{Channel, Error};

use super::open_bridge;
use crate::cli::{BridgeArgs, LineArgs};

/// Pause between polls of an idle receive FIFO
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Create a progress bar for `total` bytes
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Push `data` through the transmit FIFO, waiting for space as needed
fn send_all<B: I2cMaster>(
    uart: &mut Channel<'_, B>,
    data: &[u8],
    pb: &ProgressBar,
) -> Result<(), Error> {
    let mut pos = 0;
    while pos < data.len() {
        let n = embedded_io::Write::write(uart, &data[pos..])?;
        pos += n;
        pb.inc(n as u64);
    }
    uart.flush()
}

/// Read everything currently in the receive FIFO
fn drain<B: I2cMaster>(uart: &mut Channel<'_, B>, out: &mut Vec<u8>) -> Result<(), Error> {
    loop {
        let avail = uart.available()?;
        if avail == 0 {
            return Ok(());
        }
        let start = out.len();
        out.resize(start + avail, 0);
        let n = uart.fifo_read(&mut out[start..]);
        out.truncate(start + n);
        if n < avail {
            return Err(Error::Bus);
        }
    }
}

/// Read exactly `count` bytes, giving up after `timeout`
fn receive_exact<B: I2cMaster>(
    uart: &mut Channel<'_, B>,
    count: usize,
    timeout: Duration,
) -> Result<Vec<u8>, Error> {
    let mut out = vec![0u8; count];
    let mut pos = 0;
    let deadline = Instant::now() + timeout;

    while pos < count {
        let avail = uart.available()?;
        if avail == 0 {
            if Instant::now() >= deadline {
                log::warn!("Timed out after {} of {} bytes", pos, count);
                return Err(Error::Timeout);
            }
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        let want = avail.min(count - pos);
        let n = uart.fifo_read(&mut out[pos..pos + want]);
        if n < want {
            return Err(Error::Bus);
        }
        pos += n;
    }
    Ok(out)
}

/// Start a channel and transmit `data` (or the contents of `input`)
pub fn run_send(
    args: &BridgeArgs,
    line: &LineArgs,
    data: Option<&str>,
    input: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match (data, input) {
        (Some(text), _) => text.as_bytes().to_vec(),
        (None, Some(path)) => fs::read(path)?,
        (None, None) => return Err("Nothing to send (use --data or --input)".into()),
    };

    let bridge = open_bridge(args)?;
    let mut uart = bridge.channel(args.channel)?;
    uart.begin(line.baud, line.mode)?;

    let pb = create_progress_bar(payload.len() as u64, "Sending")?;
    send_all(&mut uart, &payload, &pb)?;
    pb.finish_and_clear();

    println!(
        "Sent {} bytes on {} at {} baud ({})",
        payload.len(),
        args.channel,
        line.baud,
        line.mode
    );
    Ok(())
}

/// Bring the channel up, or leave a running channel and its FIFO alone
fn prepare_receive<B: I2cMaster>(
    uart: &mut Channel<'_, B>,
    line: &LineArgs,
    restart: bool,
) -> Result<(), Error> {
    if restart {
        return uart.begin(line.baud, line.mode);
    }
    let scr = uart.read_paged(ChannelRegister::Scr)?;
    if !Scr::from_bits_retain(scr).contains(Scr::RXEN) {
        log::warn!("{}: receiver is not enabled, nothing will arrive", uart.id());
    }
    Ok(())
}

/// Read received bytes, restarting the channel first when `restart` is set
///
/// Without `count` this drains what the FIFO holds right now, so after a
/// restart it is only useful together with `count`.
pub fn run_recv(
    args: &BridgeArgs,
    line: &LineArgs,
    count: Option<usize>,
    timeout: Duration,
    restart: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bridge = open_bridge(args)?;
    let mut uart = bridge.channel(args.channel)?;
    prepare_receive(&mut uart, line, restart)?;

    let received = match count {
        Some(count) => receive_exact(&mut uart, count, timeout)?,
        None => {
            let mut buf = Vec::new();
            drain(&mut uart, &mut buf)?;
            buf
        }
    };

    let errors = uart.line_status()?;
    if !errors.is_empty() {
        log::warn!("Line errors on {}: {:?}", args.channel, errors);
    }

    match output {
        Some(path) => {
            fs::write(path, &received)?;
            println!("Wrote {} bytes to {:?}", received.len(), path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&received)?;
            stdout.flush()?;
            log::info!("Received {} bytes", received.len());
        }
    }
    Ok(())
}

/// Disable a channel
pub fn run_end(args: &BridgeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bridge = open_bridge(args)?;
    let mut uart = bridge.channel(args.channel)?;
    uart.end()?;
    println!("Channel {} disabled", args.channel);
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use wk2132_core::{ChannelId, UartMode, Wk2132};
    use wk2132_dummy::{DummyBridge, DummyConfig};

    fn bridge(config: DummyConfig) -> Wk2132<DummyBridge> {
        Wk2132::with_config(DummyBridge::new(config), 11_059_200, false, false).unwrap()
    }

    #[test]
    fn test_send_all_reaches_wire() {
        let mut bridge = bridge(DummyConfig::default());
        let payload: Vec<u8> = (0..600u32).map(|i| i as u8).collect();
        {
            let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
            uart.begin(115_200, UartMode::MODE_8N1).unwrap();
            send_all(&mut uart, &payload, &ProgressBar::hidden()).unwrap();
        }
        assert_eq!(bridge.bus_mut().take_wire(ChannelId::Uart0), payload);
    }

    #[test]
    fn test_drain_and_receive_exact() {
        let mut bridge = bridge(DummyConfig::default());
        bridge
            .channel(ChannelId::Uart1)
            .unwrap()
            .begin(9600, UartMode::MODE_8N1)
            .unwrap();
        bridge.bus_mut().inject_rx(ChannelId::Uart1, b"abcdef");

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        assert_eq!(
            receive_exact(&mut uart, 2, Duration::from_millis(10)).unwrap(),
            b"ab"
        );
        let mut rest = Vec::new();
        drain(&mut uart, &mut rest).unwrap();
        assert_eq!(rest, b"cdef");

        assert_eq!(
            receive_exact(&mut uart, 1, Duration::from_millis(5)),
            Err(Error::Timeout)
        );
    }

    #[test]
    fn test_prepare_without_restart_keeps_fifo() {
        let mut bridge = bridge(DummyConfig::default());
        let line = LineArgs {
            baud: 9600,
            mode: UartMode::MODE_8N1,
        };
        bridge
            .channel(ChannelId::Uart0)
            .unwrap()
            .begin(line.baud, line.mode)
            .unwrap();
        bridge.bus_mut().inject_rx(ChannelId::Uart0, b"kept");

        {
            let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
            prepare_receive(&mut uart, &line, false).unwrap();
            let mut buf = Vec::new();
            drain(&mut uart, &mut buf).unwrap();
            assert_eq!(buf, b"kept");
        }

        bridge.bus_mut().inject_rx(ChannelId::Uart0, b"lost");
        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        prepare_receive(&mut uart, &line, true).unwrap();
        assert_eq!(uart.available(), Ok(0));
    }
}
