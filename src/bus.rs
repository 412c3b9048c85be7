use crate::device::{Readable, Writable};
use crate::error::{Chip8Error, Result};
use log::debug;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Half-open range of bus addresses, `lower..upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub lower: usize,
    pub upper: usize,
}

impl AddressRange {
    pub fn new(lower: usize, upper: usize) -> Self {
        AddressRange { lower, upper }
    }

    pub fn contains(&self, address: usize) -> bool {
        address >= self.lower && address < self.upper
    }

    pub fn conflicts_with(&self, other: &AddressRange) -> bool {
        self.upper > other.lower && other.upper > self.lower
    }

    /// global address -> device-relative address
    pub fn rectify(&self, address: usize) -> usize {
        address - self.lower
    }

    pub fn len(&self) -> usize {
        self.upper.saturating_sub(self.lower)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04x}..0x{:04x}", self.lower, self.upper)
    }
}

struct Mapping<D: ?Sized> {
    device: Weak<RefCell<D>>,
    range: AddressRange,
}

/// Routes reads and writes on one linear address space to whichever device
/// was registered over that address.
///
/// Devices belong to the caller, who keeps them in `Rc<RefCell<_>>`; the bus
/// only holds weak handles, so dropping a device simply makes its range
/// report `DeviceDetached`. Readable and writable registrations are separate
/// registries, so a device can be mapped read-only, write-only or both.
pub struct Bus {
    size: usize,
    readable: Vec<Mapping<dyn Readable>>,
    writable: Vec<Mapping<dyn Writable>>,
}

fn check_free<D: ?Sized>(
    mappings: &[Mapping<D>],
    range: AddressRange,
    size: usize,
) -> Result<()> {
    if range.is_empty() {
        return Err(Chip8Error::RangeConflict {
            lower: range.lower,
            upper: range.upper,
        });
    }
    if range.upper > size {
        return Err(Chip8Error::OutOfRange {
            address: range.upper - 1,
            size,
        });
    }
    if mappings.iter().any(|m| m.range.conflicts_with(&range)) {
        return Err(Chip8Error::RangeConflict {
            lower: range.lower,
            upper: range.upper,
        });
    }
    Ok(())
}

impl Bus {
    /// a bus spanning `size` addresses with nothing mapped
    pub fn new(size: usize) -> Self {
        Bus {
            size,
            readable: Vec::new(),
            writable: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn register_readable<D: Readable + 'static>(
        &mut self,
        device: &Rc<RefCell<D>>,
        lower: usize,
        upper: usize,
    ) -> Result<()> {
        let range = AddressRange::new(lower, upper);
        check_free(&self.readable, range, self.size)?;
        let handle: Rc<RefCell<dyn Readable>> = device.clone();
        self.readable.push(Mapping {
            device: Rc::downgrade(&handle),
            range,
        });
        debug!("registered readable device at {}", range);
        Ok(())
    }

    pub fn register_writable<D: Writable + 'static>(
        &mut self,
        device: &Rc<RefCell<D>>,
        lower: usize,
        upper: usize,
    ) -> Result<()> {
        let range = AddressRange::new(lower, upper);
        check_free(&self.writable, range, self.size)?;
        let handle: Rc<RefCell<dyn Writable>> = device.clone();
        self.writable.push(Mapping {
            device: Rc::downgrade(&handle),
            range,
        });
        debug!("registered writable device at {}", range);
        Ok(())
    }

    /// register a device for both reading and writing over the same range;
    /// nothing is registered unless both registries have room
    pub fn register<D: Readable + Writable + 'static>(
        &mut self,
        device: &Rc<RefCell<D>>,
        lower: usize,
        upper: usize,
    ) -> Result<()> {
        check_free(&self.writable, AddressRange::new(lower, upper), self.size)?;
        self.register_readable(device, lower, upper)?;
        self.register_writable(device, lower, upper)
    }

    /// drop the readable registration starting at `lower`
    pub fn unmap_readable(&mut self, lower: usize) -> bool {
        let before = self.readable.len();
        self.readable.retain(|m| m.range.lower != lower);
        before != self.readable.len()
    }

    /// drop the writable registration starting at `lower`
    pub fn unmap_writable(&mut self, lower: usize) -> bool {
        let before = self.writable.len();
        self.writable.retain(|m| m.range.lower != lower);
        before != self.writable.len()
    }

    pub fn readable_ranges(&self) -> Vec<AddressRange> {
        self.readable.iter().map(|m| m.range).collect()
    }

    pub fn writable_ranges(&self) -> Vec<AddressRange> {
        self.writable.iter().map(|m| m.range).collect()
    }

    pub fn read(&self, address: usize) -> Result<u8> {
        let mapping = self
            .readable
            .iter()
            .find(|m| m.range.contains(address))
            .ok_or(Chip8Error::AddressUnmapped { address })?;
        let device = mapping
            .device
            .upgrade()
            .ok_or(Chip8Error::DeviceDetached { address })?;
        let value = device.borrow().read(mapping.range.rectify(address));
        value
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<()> {
        let mapping = self
            .writable
            .iter()
            .find(|m| m.range.contains(address))
            .ok_or(Chip8Error::AddressUnmapped { address })?;
        let device = mapping
            .device
            .upgrade()
            .ok_or(Chip8Error::DeviceDetached { address })?;
        let result = device.borrow_mut().write(mapping.range.rectify(address), value);
        result
    }

    /// big-endian two-byte read; the bytes may come from different devices
    pub fn read_word(&self, address: usize) -> Result<u16> {
        let hi = self.read(address)? as u16;
        let lo = self.read(address + 1)? as u16;
        Ok((hi << 8) | lo)
    }
}
