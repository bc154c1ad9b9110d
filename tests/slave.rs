#![cfg(feature = "alloc")]

use mbrtu::crc::{self, LookupCrc};
use mbrtu::dispatch::function;
use mbrtu::{
    Clock, Crc16, Error, ManualClock, PollOutcome, RegisterDispatcher, Result, RtuConfig, RtuSlave,
    StaticMemory, Transport, VecTransport,
};

type Slave = RtuSlave<StaticMemory<64, 16>, ManualClock, RegisterDispatcher, LookupCrc>;

fn slave(address: u8) -> Result<Slave> {
    let config = RtuConfig {
        slave_address: address,
        rx_capacity: 64,
        tx_capacity: 64,
        register_count: 16,
        ..RtuConfig::default()
    };
    RtuSlave::init(&config, ManualClock::new(0), RegisterDispatcher::new(address))
}

/// Append the wire CRC to `body`.
fn adu(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.extend_from_slice(&LookupCrc::to_wire(body));
    frame
}

/// Deliver `frame` at 9600 baud spacing and poll after the frame gap.
fn exchange(slave: &mut Slave, frame: &[u8], wire: &mut VecTransport) -> Result<PollOutcome> {
    let start = slave.clock_mut().now() + 100_000;
    for (i, &b) in frame.iter().enumerate() {
        slave.on_byte(b, start + i as u64 * 1_146)?;
    }
    slave
        .clock_mut()
        .set(start + frame.len() as u64 * 1_146 + 5_000);
    slave.poll(wire)
}

#[test]
fn read_holding_registers() -> Result<()> {
    let mut slave = slave(0x11)?;
    slave.registers_mut().write_range(0, &[0x1234, 0x5678])?;
    let mut wire = VecTransport::new();

    let request = [0x11, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC6, 0x9B];
    assert_eq!(
        exchange(&mut slave, &request, &mut wire)?,
        PollOutcome::Replied { len: 9 }
    );

    let reply = wire.last().expect("reply sent");
    assert_eq!(&reply[..7], &[0x11, 0x03, 0x04, 0x12, 0x34, 0x56, 0x78]);
    assert!(crc::validate(reply));
    assert_eq!(slave.replies_sent(), 1);
    assert_eq!(slave.stats().valid_frames(), 1);

    // Nothing further to do.
    assert_eq!(slave.poll(&mut wire)?, PollOutcome::Idle);
    Ok(())
}

#[test]
fn write_single_then_read_back() -> Result<()> {
    let mut slave = slave(0x05)?;
    let mut wire = VecTransport::new();

    let write = adu(&[0x05, function::WRITE_SINGLE_REGISTER, 0x00, 0x03, 0xBE, 0xEF]);
    assert_eq!(
        exchange(&mut slave, &write, &mut wire)?,
        PollOutcome::Replied { len: 8 }
    );
    // The reply echoes the request.
    assert_eq!(wire.last(), Some(write.as_slice()));
    assert_eq!(slave.registers().read(3)?, 0xBEEF);

    let read = adu(&[0x05, function::READ_INPUT_REGISTERS, 0x00, 0x03, 0x00, 0x01]);
    exchange(&mut slave, &read, &mut wire)?;
    let reply = wire.last().expect("reply sent");
    assert_eq!(&reply[..5], &[0x05, 0x04, 0x02, 0xBE, 0xEF]);
    Ok(())
}

#[test]
fn write_multiple_registers() -> Result<()> {
    let mut slave = slave(0x05)?;
    let mut wire = VecTransport::new();

    let write = adu(&[
        0x05,
        function::WRITE_MULTIPLE_REGISTERS,
        0x00,
        0x0A,
        0x00,
        0x02,
        0x04,
        0x00,
        0x01,
        0x00,
        0x02,
    ]);
    assert_eq!(
        exchange(&mut slave, &write, &mut wire)?,
        PollOutcome::Replied { len: 8 }
    );
    let reply = wire.last().expect("reply sent");
    assert_eq!(&reply[..6], &[0x05, 0x10, 0x00, 0x0A, 0x00, 0x02]);
    assert_eq!(slave.registers().read(0x0A)?, 1);
    assert_eq!(slave.registers().read(0x0B)?, 2);
    Ok(())
}

#[test]
fn exceptions_are_answered() -> Result<()> {
    let mut slave = slave(0x05)?;
    let mut wire = VecTransport::new();

    // Unmapped address: the table holds 16 registers from 0.
    let read = adu(&[0x05, 0x03, 0x00, 0x0F, 0x00, 0x02]);
    assert_eq!(
        exchange(&mut slave, &read, &mut wire)?,
        PollOutcome::Replied { len: 5 }
    );
    assert_eq!(&wire.last().expect("reply")[..3], &[0x05, 0x83, 0x02]);

    // Unsupported function.
    let unknown = adu(&[0x05, 0x2B, 0x0E, 0x01, 0x00]);
    exchange(&mut slave, &unknown, &mut wire)?;
    assert_eq!(&wire.last().expect("reply")[..3], &[0x05, 0xAB, 0x01]);
    Ok(())
}

#[test]
fn silent_cases() -> Result<()> {
    let mut slave = slave(0x05)?;
    let mut wire = VecTransport::new();

    // Addressed to another slave.
    let other = adu(&[0x06, 0x03, 0x00, 0x00, 0x00, 0x01]);
    assert_eq!(exchange(&mut slave, &other, &mut wire)?, PollOutcome::NoReply);

    // Bad CRC.
    let mut corrupted = adu(&[0x05, 0x03, 0x00, 0x00, 0x00, 0x01]);
    corrupted[2] ^= 0xFF;
    assert_eq!(
        exchange(&mut slave, &corrupted, &mut wire)?,
        PollOutcome::NoReply
    );
    assert_eq!(slave.stats().checksum_errors, 1);

    // Broadcast write is executed but never answered.
    let broadcast = adu(&[0x00, 0x06, 0x00, 0x01, 0x00, 0x2A]);
    assert_eq!(
        exchange(&mut slave, &broadcast, &mut wire)?,
        PollOutcome::NoReply
    );
    assert_eq!(slave.registers().read(1)?, 0x2A);

    assert!(wire.frames().is_empty());
    assert_eq!(slave.replies_sent(), 0);
    Ok(())
}

struct FailingTransport;

impl Transport for FailingTransport {
    fn transmit(&mut self, _frame: &[u8]) -> Result<()> {
        Err(Error::Transport)
    }
}

#[test]
fn transport_failure_is_reported() -> Result<()> {
    let mut slave = slave(0x11)?;
    let request = [0x11, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC6, 0x9B];
    for (i, &b) in request.iter().enumerate() {
        slave.on_byte(b, i as u64 * 1_000)?;
    }
    slave.clock_mut().set(20_000);

    assert!(matches!(
        slave.poll(&mut FailingTransport),
        Err(Error::Transport)
    ));
    assert_eq!(slave.replies_sent(), 0);
    Ok(())
}

#[test]
fn heap_backed_slave() -> Result<()> {
    use mbrtu::HeapMemory;

    let config = RtuConfig {
        slave_address: 0x11,
        rx_capacity: 64,
        tx_capacity: 64,
        register_count: 8,
        heap_budget: Some(256),
        ..RtuConfig::default()
    };
    let mut slave: RtuSlave<HeapMemory, ManualClock, RegisterDispatcher, LookupCrc> =
        RtuSlave::init(&config, ManualClock::new(0), RegisterDispatcher::new(0x11))?;
    slave.registers_mut().write(1, 7)?;

    let request = [0x11, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC6, 0x9B];
    for (i, &b) in request.iter().enumerate() {
        slave.on_byte(b, i as u64 * 1_000)?;
    }
    slave.clock_mut().set(20_000);
    let mut wire = VecTransport::new();
    assert_eq!(slave.poll(&mut wire)?, PollOutcome::Replied { len: 9 });
    assert_eq!(&wire.last().expect("reply")[3..7], &[0x00, 0x00, 0x00, 0x07]);

    // Tearing down returns both buffers to the budget.
    let memory = slave.into_memory();
    assert_eq!(memory.used(), 16);
    Ok(())
}
