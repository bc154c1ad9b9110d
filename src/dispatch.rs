//! Request dispatch against the register table.
//!
//! The [`Dispatcher`] trait is the seam between the link core and the
//! application. [`RegisterDispatcher`] is a ready-made slave serving the
//! register function codes straight from a [`RegisterTable`]:
//!
//! | Code | Function |
//! |------|----------|
//! | 0x03 | Read holding registers |
//! | 0x04 | Read input registers (served from the same table) |
//! | 0x06 | Write single register |
//! | 0x10 | Write multiple registers |
//!
//! Anything else is answered with an illegal-function exception.

use crate::memory::{RegisterTable, WordStorage};
use crate::receiver::Frame;
use crate::Result;

/// Function codes understood by [`RegisterDispatcher`].
pub mod function {
    /// Read holding registers.
    pub const READ_HOLDING_REGISTERS: u8 = 0x03;
    /// Read input registers.
    pub const READ_INPUT_REGISTERS: u8 = 0x04;
    /// Write single register.
    pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
    /// Write multiple registers.
    pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
    /// Bit set in the function code of an exception response.
    pub const EXCEPTION_FLAG: u8 = 0x80;
}

/// Most registers a single read may return.
pub const MAX_READ_REGISTERS: u16 = 125;

/// Most registers a single write may carry.
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// Modbus exception codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExceptionCode {
    /// The function code is not supported.
    IllegalFunction = 0x01,
    /// An address in the request is not mapped.
    IllegalDataAddress = 0x02,
    /// A count, length or value in the request is malformed.
    IllegalDataValue = 0x03,
    /// The response could not be produced.
    ServerDeviceFailure = 0x04,
}

impl ExceptionCode {
    /// Create from raw byte value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::IllegalFunction),
            0x02 => Some(Self::IllegalDataAddress),
            0x03 => Some(Self::IllegalDataValue),
            0x04 => Some(Self::ServerDeviceFailure),
            _ => None,
        }
    }
}

/// Application side of a slave.
///
/// Called once per completed frame, valid or not. The response PDU
/// (function code and data, no address or CRC) is written into `response`;
/// the returned length is how much of it to send, `None` for no reply.
pub trait Dispatcher<W: WordStorage> {
    /// Handle one request frame.
    fn dispatch(
        &mut self,
        request: &Frame<'_>,
        registers: &mut RegisterTable<W>,
        response: &mut [u8],
    ) -> Result<Option<usize>>;
}

/// A slave serving register reads and writes from the table.
///
/// Frames that fail the CRC or are addressed to another slave are ignored,
/// as the protocol requires. Broadcast writes are executed without a reply;
/// broadcast reads are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDispatcher {
    address: u8,
}

type Outcome = core::result::Result<usize, ExceptionCode>;

impl RegisterDispatcher {
    /// A dispatcher answering to `address`.
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// The slave address served.
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    fn read<W: WordStorage>(
        fc: u8,
        data: &[u8],
        registers: &RegisterTable<W>,
        response: &mut [u8],
    ) -> Outcome {
        let [s0, s1, c0, c1] = *data else {
            return Err(ExceptionCode::IllegalDataValue);
        };
        let start = u16::from_be_bytes([s0, s1]);
        let count = u16::from_be_bytes([c0, c1]);
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ExceptionCode::IllegalDataValue);
        }
        let byte_count = usize::from(count) * 2;
        if response.len() < 2 + byte_count {
            return Err(ExceptionCode::ServerDeviceFailure);
        }
        check_span(registers, start, count)?;

        response[0] = fc;
        response[1] = byte_count as u8;
        for i in 0..count {
            let value = registers
                .read(start + i)
                .map_err(|_| ExceptionCode::IllegalDataAddress)?;
            let at = 2 + usize::from(i) * 2;
            response[at..at + 2].copy_from_slice(&value.to_be_bytes());
        }
        Ok(2 + byte_count)
    }

    fn write_single<W: WordStorage>(
        data: &[u8],
        registers: &mut RegisterTable<W>,
        response: &mut [u8],
    ) -> Outcome {
        let [a0, a1, v0, v1] = *data else {
            return Err(ExceptionCode::IllegalDataValue);
        };
        let address = u16::from_be_bytes([a0, a1]);
        let value = u16::from_be_bytes([v0, v1]);
        registers
            .write(address, value)
            .map_err(|_| ExceptionCode::IllegalDataAddress)?;

        // The response echoes the request.
        response[0] = function::WRITE_SINGLE_REGISTER;
        response[1..5].copy_from_slice(data);
        Ok(5)
    }

    fn write_multiple<W: WordStorage>(
        data: &[u8],
        registers: &mut RegisterTable<W>,
        response: &mut [u8],
    ) -> Outcome {
        if data.len() < 5 {
            return Err(ExceptionCode::IllegalDataValue);
        }
        let start = u16::from_be_bytes([data[0], data[1]]);
        let count = u16::from_be_bytes([data[2], data[3]]);
        let byte_count = usize::from(data[4]);
        let values = &data[5..];
        if count == 0
            || count > MAX_WRITE_REGISTERS
            || byte_count != usize::from(count) * 2
            || values.len() != byte_count
        {
            return Err(ExceptionCode::IllegalDataValue);
        }
        check_span(registers, start, count)?;

        for (i, pair) in values.chunks_exact(2).enumerate() {
            registers
                .write(start + i as u16, u16::from_be_bytes([pair[0], pair[1]]))
                .map_err(|_| ExceptionCode::IllegalDataAddress)?;
        }

        response[0] = function::WRITE_MULTIPLE_REGISTERS;
        response[1..5].copy_from_slice(&data[..4]);
        Ok(5)
    }
}

/// Both ends of a contiguous window mapped means every address in it is.
fn check_span<W: WordStorage>(
    registers: &RegisterTable<W>,
    start: u16,
    count: u16,
) -> core::result::Result<(), ExceptionCode> {
    let last = start
        .checked_add(count - 1)
        .ok_or(ExceptionCode::IllegalDataAddress)?;
    if registers.contains(start) && registers.contains(last) {
        Ok(())
    } else {
        Err(ExceptionCode::IllegalDataAddress)
    }
}

impl<W: WordStorage> Dispatcher<W> for RegisterDispatcher {
    fn dispatch(
        &mut self,
        request: &Frame<'_>,
        registers: &mut RegisterTable<W>,
        response: &mut [u8],
    ) -> Result<Option<usize>> {
        if !request.is_valid() {
            return Ok(None);
        }
        let broadcast = request.is_broadcast();
        if !broadcast && request.address() != Some(self.address) {
            return Ok(None);
        }
        if response.len() < 5 {
            return Ok(None);
        }

        let pdu = request.pdu();
        let fc = pdu[0];
        let data = &pdu[1..];
        let outcome = match fc {
            function::READ_HOLDING_REGISTERS | function::READ_INPUT_REGISTERS => {
                if broadcast {
                    return Ok(None);
                }
                Self::read(fc, data, registers, response)
            }
            function::WRITE_SINGLE_REGISTER => Self::write_single(data, registers, response),
            function::WRITE_MULTIPLE_REGISTERS => Self::write_multiple(data, registers, response),
            _ => Err(ExceptionCode::IllegalFunction),
        };

        if broadcast {
            return Ok(None);
        }
        match outcome {
            Ok(len) => Ok(Some(len)),
            Err(code) => {
                debug!("function {fc:#04x} answered with exception {code:?}");
                response[0] = fc | function::EXCEPTION_FLAG;
                response[1] = code as u8;
                Ok(Some(2))
            }
        }
    }
}
